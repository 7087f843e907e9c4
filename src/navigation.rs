//! # Navigation Module
//!
//! Read-only traversal over a score tree.
//!
//! ## Purpose
//! Everything that asks "where is this component" lives here: rank in
//! parent, siblings, the closest logical neighbour ignoring simultaneity,
//! first and last leaves, depth-first and breadth-first walks, and the
//! thread machinery that decides whether components may share a spanner.
//!
//! ## Threads
//! Two components are in the same *thread* when their containment
//! signatures agree. The signature records the nearest enclosing Voice,
//! Staff, StaffGroup and Score plus the root of the tree:
//! - named contexts compare by type and name, so two voices called
//!   `"soprano"` in successive staves of one score are the same thread
//! - unnamed contexts compare by identity
//! - plain containers and tuplets do not contribute
//!
//! A run of components is *thread-contiguous* when every component is in
//! the thread of the first and each one immediately follows the previous
//! one in that thread, with no same-thread component starting in between.
//! Runs made only of orphans are always contiguous.
//!
//! ## Failure Semantics
//! Navigation never fails. At tree boundaries the helpers return `None`
//! or an empty list, and stale handles behave like empty orphans.
//!
//! ## Related Modules
//! - `timing` - offsets used by the thread-proper check
//! - `spanner` - the main client of thread contiguity

use crate::components::{ComponentId, ContainerKind, ContextType, ScoreTree};
use crate::error::ScoreError;
use std::collections::VecDeque;

/// Identity of an enclosing context as seen by the thread check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextIdentity {
    Named(String),
    Anonymous(ComponentId),
}

/// Structural position used to decide whether components share a thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainmentSignature {
    pub root: ComponentId,
    pub score: Option<ContextIdentity>,
    pub staff_group: Option<ContextIdentity>,
    pub staff: Option<ContextIdentity>,
    pub voice: Option<ContextIdentity>,
}

/// Callbacks for tree walks.
///
/// `unvisit` runs after all of a node's children were visited in a
/// depth-first walk, which is where a formatter closes brackets.
pub trait Visitor {
    fn visit(&mut self, tree: &ScoreTree, component: ComponentId);

    fn unvisit(&mut self, _tree: &ScoreTree, _component: ComponentId) {}
}

impl<F> Visitor for F
where
    F: FnMut(&ScoreTree, ComponentId),
{
    fn visit(&mut self, tree: &ScoreTree, component: ComponentId) {
        self(tree, component)
    }
}

impl ScoreTree {
    /// Index of `id` in its parent's children, or `None` for orphans.
    pub fn rank_in_parent(&self, id: ComponentId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Ancestors of `id` from nearest to root, starting with `id` itself
    /// when `include_self` is set.
    pub fn parentage(&self, id: ComponentId, include_self: bool) -> Vec<ComponentId> {
        let mut result = Vec::new();
        if include_self && self.is_live(id) {
            result.push(id);
        }
        let mut current = self.parent(id);
        while let Some(parent) = current {
            result.push(parent);
            current = self.parent(parent);
        }
        result
    }

    pub fn root(&self, id: ComponentId) -> ComponentId {
        self.parentage(id, false).last().copied().unwrap_or(id)
    }

    /// Number of proper ancestors.
    pub fn depth(&self, id: ComponentId) -> usize {
        self.parentage(id, false).len()
    }

    pub fn is_orphan(&self, id: ComponentId) -> bool {
        self.parent(id).is_none()
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut result = Vec::new();
        if !self.is_live(id) {
            return result;
        }
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        result
    }

    /// Leaves at or below `id`, in document order.
    pub fn leaves(&self, id: ComponentId) -> Vec<ComponentId> {
        self.descendants(id)
            .into_iter()
            .filter(|&c| self.is_leaf(c))
            .collect()
    }

    /// Next child of a sequential parent; `None` under parallel parents.
    pub fn next_sibling(&self, id: ComponentId) -> Option<ComponentId> {
        let parent = self.parent(id)?;
        if self.is_parallel(parent) {
            return None;
        }
        let rank = self.rank_in_parent(id)?;
        self.children(parent).get(rank + 1).copied()
    }

    /// Previous child of a sequential parent; `None` under parallel parents.
    pub fn previous_sibling(&self, id: ComponentId) -> Option<ComponentId> {
        let parent = self.parent(id)?;
        if self.is_parallel(parent) {
            return None;
        }
        let rank = self.rank_in_parent(id)?;
        rank.checked_sub(1)
            .and_then(|r| self.children(parent).get(r).copied())
    }

    /// Closest sequential successor, ascending through ancestors as needed.
    pub fn next(&self, id: ComponentId) -> Option<ComponentId> {
        self.parentage(id, true)
            .into_iter()
            .find_map(|c| self.next_sibling(c))
    }

    /// Closest sequential predecessor, ascending through ancestors as needed.
    pub fn previous(&self, id: ComponentId) -> Option<ComponentId> {
        self.parentage(id, true)
            .into_iter()
            .find_map(|c| self.previous_sibling(c))
    }

    /// Leftmost leaf of `id`, or one per branch when a parallel container
    /// is crossed on the way down.
    pub fn first_leaves(&self, id: ComponentId) -> Vec<ComponentId> {
        self.edge_leaves(id, true)
    }

    /// Rightmost leaf of `id`, or one per branch of any parallel container.
    pub fn last_leaves(&self, id: ComponentId) -> Vec<ComponentId> {
        self.edge_leaves(id, false)
    }

    fn edge_leaves(&self, id: ComponentId, first: bool) -> Vec<ComponentId> {
        if self.is_leaf(id) {
            return vec![id];
        }
        let children = self.children(id);
        if self.is_parallel(id) {
            children
                .iter()
                .flat_map(|&c| self.edge_leaves(c, first))
                .collect()
        } else {
            let edge = if first { children.first() } else { children.last() };
            edge.map(|&c| self.edge_leaves(c, first))
                .unwrap_or_default()
        }
    }

    /// `id` itself when it is a sequential container; the first containers
    /// of each branch when it is parallel; nothing for leaves.
    pub fn first_containers(&self, id: ComponentId) -> Vec<ComponentId> {
        if !self.is_container(id) {
            return Vec::new();
        }
        if self.is_parallel(id) {
            self.children(id)
                .iter()
                .flat_map(|&c| self.first_containers(c))
                .collect()
        } else {
            vec![id]
        }
    }

    /// First leaves of the next component, regardless of thread.
    pub fn next_leaves(&self, id: ComponentId) -> Vec<ComponentId> {
        self.next(id)
            .map(|n| self.first_leaves(n))
            .unwrap_or_default()
    }

    /// Last leaves of the previous component, regardless of thread.
    pub fn previous_leaves(&self, id: ComponentId) -> Vec<ComponentId> {
        self.previous(id)
            .map(|p| self.last_leaves(p))
            .unwrap_or_default()
    }

    /// Next leaf in the same thread as leaf `id`.
    pub fn next_leaf(&self, id: ComponentId) -> Option<ComponentId> {
        if !self.is_leaf(id) {
            return None;
        }
        self.next_leaves(id)
            .into_iter()
            .find(|&candidate| self.is_thread_equivalent(id, candidate))
    }

    /// Previous leaf in the same thread as leaf `id`.
    pub fn previous_leaf(&self, id: ComponentId) -> Option<ComponentId> {
        if !self.is_leaf(id) {
            return None;
        }
        self.previous_leaves(id)
            .into_iter()
            .find(|&candidate| self.is_thread_equivalent(id, candidate))
    }

    /// Next sequential container that continues the thread of container `id`.
    pub fn next_in_thread(&self, id: ComponentId) -> Option<ComponentId> {
        if !self.is_container(id) || self.is_parallel(id) {
            return None;
        }
        let next = self.next(id)?;
        self.first_containers(next)
            .into_iter()
            .find(|&candidate| self.continues_thread(id, candidate))
    }

    fn continues_thread(&self, container: ComponentId, candidate: ComponentId) -> bool {
        if self.is_parallel(candidate) {
            return false;
        }
        let same_shape = match (self.container_kind(container), self.container_kind(candidate)) {
            (Some(ContainerKind::Plain), Some(ContainerKind::Plain)) => true,
            (Some(ContainerKind::Tuplet { .. }), Some(ContainerKind::Tuplet { .. })) => true,
            (
                Some(ContainerKind::Context { context: a, name: na }),
                Some(ContainerKind::Context { context: b, name: nb }),
            ) => a == b && na == nb,
            _ => false,
        };
        let same_parentage = match (self.parent(container), self.parent(candidate)) {
            (Some(a), Some(b)) => self.is_thread_equivalent(a, b),
            _ => false,
        };
        same_shape && same_parentage
    }

    /// `id`, its descendants, then every later node of the tree in document order.
    pub fn iterate_forward_from(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut result = self.descendants(id);
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if let Some(rank) = self.rank_in_parent(current) {
                for &sibling in &self.children(parent)[rank + 1..] {
                    result.extend(self.descendants(sibling));
                }
            }
            current = parent;
        }
        result
    }

    /// Leaves of the whole tree in timeline order, starting at leaf `id`.
    ///
    /// Leaves are ordered by start offset; leaves starting together keep
    /// document order, so the upper staff comes first. Empty when `id` is
    /// not a leaf.
    pub fn iterate_timeline_forward_from(&self, id: ComponentId) -> Vec<ComponentId> {
        if !self.is_leaf(id) {
            return Vec::new();
        }
        let mut timeline = self.leaves(self.root(id));
        timeline.sort_by_key(|&leaf| self.start_offset(leaf));
        match timeline.iter().position(|&leaf| leaf == id) {
            Some(position) => timeline.split_off(position),
            None => Vec::new(),
        }
    }

    /// Components that start exactly when `id` starts by descending
    /// through first children (all children of parallel containers).
    pub(crate) fn contemporaneous_start_contents(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut result = vec![id];
        if self.is_parallel(id) {
            for &child in self.children(id) {
                result.extend(self.contemporaneous_start_contents(child));
            }
        } else if let Some(&first) = self.children(id).first() {
            result.extend(self.contemporaneous_start_contents(first));
        }
        result
    }

    /// True when `second` starts at the next sequential position after `first`.
    pub fn is_immediate_temporal_successor(&self, first: ComponentId, second: ComponentId) -> bool {
        let mut current = Some(first);
        while let Some(node) = current {
            if let Some(next) = self.next_sibling(node) {
                return self.contemporaneous_start_contents(next).contains(&second);
            }
            current = self.parent(node);
        }
        false
    }

    pub fn containment_signature(&self, id: ComponentId) -> ContainmentSignature {
        let mut signature = ContainmentSignature {
            root: self.root(id),
            score: None,
            staff_group: None,
            staff: None,
            voice: None,
        };
        for node in self.parentage(id, true) {
            let (context, name) = match self.container_kind(node) {
                Some(ContainerKind::Context { context, name }) => (*context, name),
                _ => continue,
            };
            let identity = match name {
                Some(name) => ContextIdentity::Named(name.clone()),
                None => ContextIdentity::Anonymous(node),
            };
            let slot = match context {
                ContextType::Voice => &mut signature.voice,
                ContextType::Staff => &mut signature.staff,
                ContextType::StaffGroup => &mut signature.staff_group,
                ContextType::Score => &mut signature.score,
            };
            if slot.is_none() {
                *slot = Some(identity);
            }
        }
        signature
    }

    pub fn is_thread_equivalent(&self, a: ComponentId, b: ComponentId) -> bool {
        self.containment_signature(a) == self.containment_signature(b)
    }

    /// True when `components` may be spanned together.
    pub fn are_thread_contiguous(&self, components: &[ComponentId]) -> bool {
        let Some((&first, rest)) = components.split_first() else {
            return true;
        };
        if components.iter().all(|&c| self.is_orphan(c)) {
            return true;
        }
        let thread = self.containment_signature(first);
        let mut previous = first;
        for &current in rest {
            if self.containment_signature(current) != thread {
                return false;
            }
            if !self.is_immediate_temporal_successor(previous, current)
                && !self.is_thread_proper(previous, current, &thread)
            {
                return false;
            }
            previous = current;
        }
        true
    }

    /// `second` follows `first` in time and nothing of their thread starts in between.
    fn is_thread_proper(
        &self,
        first: ComponentId,
        second: ComponentId,
        thread: &ContainmentSignature,
    ) -> bool {
        let first_stop = self.stop_offset(first);
        let second_start = self.start_offset(second);
        if first_stop > second_start {
            return false;
        }
        for node in self.iterate_forward_from(first).into_iter().skip(1) {
            if node == second {
                break;
            }
            if &self.containment_signature(node) == thread {
                let start = self.start_offset(node);
                if first_stop <= start && start < second_start {
                    return false;
                }
            }
        }
        true
    }

    /// Parent and `start..stop` child range of a run of siblings.
    ///
    /// Returns `Ok(None)` for an empty run or a run made only of orphans.
    pub fn parent_and_run(
        &self,
        components: &[ComponentId],
    ) -> Result<Option<(ComponentId, usize, usize)>, ScoreError> {
        self.require_live(components)?;
        if components.iter().all(|&c| self.is_orphan(c)) {
            return Ok(None);
        }
        let parent = self.parent(components[0]).ok_or_else(|| {
            ScoreError::ContiguityError("run mixes orphans and parented components".to_string())
        })?;
        let mut ranks = Vec::with_capacity(components.len());
        for &component in components {
            if self.parent(component) != Some(parent) {
                return Err(ScoreError::ContiguityError(format!(
                    "{} is not a child of {}",
                    component, parent
                )));
            }
            if let Some(rank) = self.rank_in_parent(component) {
                ranks.push(rank);
            }
        }
        if ranks.windows(2).any(|pair| pair[1] != pair[0] + 1) {
            return Err(ScoreError::ContiguityError(format!(
                "components are not a contiguous run of children of {}",
                parent
            )));
        }
        let start = ranks[0];
        Ok(Some((parent, start, start + ranks.len())))
    }

    /// True when every component hangs from the same root.
    pub fn all_in_same_score(&self, components: &[ComponentId]) -> bool {
        let mut roots = components.iter().map(|&c| self.root(c));
        match roots.next() {
            Some(first) => roots.all(|r| r == first),
            None => true,
        }
    }

    /// Visits every node below `root` once, calling `unvisit` on the way back up.
    pub fn depth_first_traverse<V: Visitor>(&self, root: ComponentId, visitor: &mut V) {
        if !self.is_live(root) {
            return;
        }
        visitor.visit(self, root);
        for &child in self.children(root) {
            self.depth_first_traverse(child, visitor);
        }
        visitor.unvisit(self, root);
    }

    /// Visits every node below `root` level by level.
    pub fn breadth_first_traverse<V: Visitor>(
        &self,
        root: ComponentId,
        visitor: &mut V,
        left_to_right: bool,
    ) {
        if !self.is_live(root) {
            return;
        }
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            visitor.visit(self, node);
            let children = self.children(node);
            if left_to_right {
                queue.extend(children.iter().copied());
            } else {
                queue.extend(children.iter().rev().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{duration, Pitch};

    fn notes(tree: &mut ScoreTree, count: usize) -> Vec<ComponentId> {
        (0..count)
            .map(|_| tree.note(Pitch::default(), duration(1, 8)).unwrap())
            .collect()
    }

    /// voice { { n0 n1 } { n2 n3 } }
    fn nested(tree: &mut ScoreTree) -> (ComponentId, Vec<ComponentId>, Vec<ComponentId>) {
        let voice = tree.voice(None);
        let left = tree.container();
        let right = tree.container();
        let leaves = notes(tree, 4);
        tree.extend(left, &leaves[..2]).unwrap();
        tree.extend(right, &leaves[2..]).unwrap();
        tree.extend(voice, &[left, right]).unwrap();
        (voice, vec![left, right], leaves)
    }

    #[test]
    fn test_rank_and_siblings() {
        let mut tree = ScoreTree::new();
        let (voice, containers, leaves) = nested(&mut tree);
        assert_eq!(tree.rank_in_parent(containers[1]), Some(1));
        assert_eq!(tree.rank_in_parent(voice), None);
        assert_eq!(tree.next_sibling(leaves[0]), Some(leaves[1]));
        assert_eq!(tree.next_sibling(leaves[1]), None);
        assert_eq!(tree.previous_sibling(leaves[2]), None);
        assert_eq!(tree.previous_sibling(leaves[3]), Some(leaves[2]));
    }

    #[test]
    fn test_next_ascends_through_parents() {
        let mut tree = ScoreTree::new();
        let (_, containers, leaves) = nested(&mut tree);
        assert_eq!(tree.next(leaves[1]), Some(containers[1]));
        assert_eq!(tree.previous(leaves[2]), Some(containers[0]));
        assert_eq!(tree.next(leaves[3]), None);
        assert_eq!(tree.next_leaves(leaves[1]), vec![leaves[2]]);
        assert_eq!(tree.next_leaf(leaves[1]), Some(leaves[2]));
        assert_eq!(tree.previous_leaf(leaves[2]), Some(leaves[1]));
        assert_eq!(tree.next_leaf(leaves[3]), None);
    }

    #[test]
    fn test_parentage_root_and_depth() {
        let mut tree = ScoreTree::new();
        let (voice, containers, leaves) = nested(&mut tree);
        assert_eq!(tree.parentage(leaves[2], false), vec![containers[1], voice]);
        assert_eq!(
            tree.parentage(leaves[2], true),
            vec![leaves[2], containers[1], voice]
        );
        assert_eq!(tree.root(leaves[2]), voice);
        assert_eq!(tree.depth(leaves[2]), 2);
        assert!(tree.is_orphan(voice));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut tree = ScoreTree::new();
        let (voice, containers, leaves) = nested(&mut tree);
        assert_eq!(
            tree.descendants(voice),
            vec![voice, containers[0], leaves[0], leaves[1], containers[1], leaves[2], leaves[3]]
        );
        assert_eq!(tree.leaves(voice), leaves);
    }

    #[test]
    fn test_parallel_siblings_are_not_sequential() {
        let mut tree = ScoreTree::new();
        let staff = tree.staff(None);
        tree.set_parallel(staff, true).unwrap();
        let upper = tree.voice(None);
        let lower = tree.voice(None);
        tree.extend(staff, &[upper, lower]).unwrap();
        assert_eq!(tree.next_sibling(upper), None);
        assert_eq!(tree.previous_sibling(lower), None);
        assert_eq!(tree.first_containers(staff), vec![upper, lower]);
    }

    #[test]
    fn test_first_and_last_leaves_of_empty_container() {
        let mut tree = ScoreTree::new();
        let container = tree.container();
        assert!(tree.first_leaves(container).is_empty());
        assert!(tree.last_leaves(container).is_empty());
    }

    #[test]
    fn test_named_contexts_share_a_thread() {
        let mut tree = ScoreTree::new();
        let outer = tree.container();
        let first = tree.voice(Some("soprano"));
        let second = tree.voice(Some("soprano"));
        let leaves = notes(&mut tree, 2);
        tree.append(first, leaves[0]).unwrap();
        tree.append(second, leaves[1]).unwrap();
        tree.extend(outer, &[first, second]).unwrap();

        assert!(tree.is_thread_equivalent(leaves[0], leaves[1]));
        assert!(tree.are_thread_contiguous(&leaves));
        assert_eq!(tree.next_in_thread(first), Some(second));
    }

    #[test]
    fn test_anonymous_contexts_are_distinct_threads() {
        let mut tree = ScoreTree::new();
        let outer = tree.container();
        let first = tree.voice(None);
        let second = tree.voice(None);
        let leaves = notes(&mut tree, 2);
        tree.append(first, leaves[0]).unwrap();
        tree.append(second, leaves[1]).unwrap();
        tree.extend(outer, &[first, second]).unwrap();

        assert!(!tree.is_thread_equivalent(leaves[0], leaves[1]));
        assert!(!tree.are_thread_contiguous(&leaves));
        assert_eq!(tree.next_leaf(leaves[0]), None);
    }

    #[test]
    fn test_thread_contiguity_across_plain_containers() {
        let mut tree = ScoreTree::new();
        let (_, containers, leaves) = nested(&mut tree);
        assert!(tree.are_thread_contiguous(&leaves));
        assert!(tree.are_thread_contiguous(&containers));
        assert!(tree.are_thread_contiguous(&[containers[0], leaves[2]]));
        // gap in the middle
        assert!(!tree.are_thread_contiguous(&[leaves[0], leaves[2]]));
        // out of order
        assert!(!tree.are_thread_contiguous(&[leaves[1], leaves[0]]));
        assert!(!tree.are_thread_contiguous(&[leaves[0], leaves[0]]));
    }

    #[test]
    fn test_orphans_are_always_contiguous() {
        let mut tree = ScoreTree::new();
        let leaves = notes(&mut tree, 3);
        assert!(tree.are_thread_contiguous(&leaves));
        assert!(tree.are_thread_contiguous(&[]));
    }

    #[test]
    fn test_immediate_temporal_successor() {
        let mut tree = ScoreTree::new();
        let (_, containers, leaves) = nested(&mut tree);
        assert!(tree.is_immediate_temporal_successor(leaves[1], containers[1]));
        assert!(tree.is_immediate_temporal_successor(leaves[1], leaves[2]));
        assert!(!tree.is_immediate_temporal_successor(leaves[0], leaves[2]));
    }

    #[test]
    fn test_parent_and_run() {
        let mut tree = ScoreTree::new();
        let (voice, containers, leaves) = nested(&mut tree);
        assert_eq!(tree.parent_and_run(&containers).unwrap(), Some((voice, 0, 2)));
        assert_eq!(tree.parent_and_run(&leaves[1..2]).unwrap(), Some((containers[0], 1, 2)));
        assert!(matches!(
            tree.parent_and_run(&leaves[1..3]),
            Err(ScoreError::ContiguityError(_))
        ));
        let orphan = tree.note(Pitch::default(), duration(1, 4)).unwrap();
        assert_eq!(tree.parent_and_run(&[orphan]).unwrap(), None);
        assert!(tree.parent_and_run(&[orphan, leaves[0]]).is_err());
    }

    #[test]
    fn test_iterate_forward_from() {
        let mut tree = ScoreTree::new();
        let (_, containers, leaves) = nested(&mut tree);
        assert_eq!(
            tree.iterate_forward_from(leaves[1]),
            vec![leaves[1], containers[1], leaves[2], leaves[3]]
        );
    }

    #[test]
    fn test_iterate_timeline_forward_across_staves() {
        let mut tree = ScoreTree::new();
        let score = tree.score(None);
        let upper = tree.staff(None);
        let lower = tree.staff(None);
        let quarters = tree.leaves_from_str("c'4 d'4 e'4 f'4").unwrap();
        let eighths = tree.leaves_from_str("g'8 a'8 b'8 c''8").unwrap();
        tree.extend(upper, &quarters).unwrap();
        tree.extend(lower, &eighths).unwrap();
        tree.extend(score, &[upper, lower]).unwrap();

        assert_eq!(
            tree.iterate_timeline_forward_from(eighths[2]),
            vec![eighths[2], eighths[3], quarters[2], quarters[3]]
        );
        assert_eq!(
            tree.iterate_timeline_forward_from(quarters[0])[..3],
            [quarters[0], eighths[0], eighths[1]]
        );
        assert!(tree.iterate_timeline_forward_from(upper).is_empty());
    }

    struct Recorder {
        events: Vec<String>,
    }

    impl Visitor for Recorder {
        fn visit(&mut self, tree: &ScoreTree, component: ComponentId) {
            let tag = if tree.is_leaf(component) { "leaf" } else { "open" };
            self.events.push(tag.to_string());
        }

        fn unvisit(&mut self, tree: &ScoreTree, component: ComponentId) {
            if tree.is_container(component) {
                self.events.push("close".to_string());
            }
        }
    }

    #[test]
    fn test_depth_first_brackets_children() {
        let mut tree = ScoreTree::new();
        let (voice, _, _) = nested(&mut tree);
        let mut recorder = Recorder { events: Vec::new() };
        tree.depth_first_traverse(voice, &mut recorder);
        assert_eq!(
            recorder.events,
            vec!["open", "open", "leaf", "leaf", "close", "open", "leaf", "leaf", "close", "close"]
        );
    }

    #[test]
    fn test_breadth_first_with_closure() {
        let mut tree = ScoreTree::new();
        let (voice, containers, leaves) = nested(&mut tree);
        let mut seen = Vec::new();
        tree.breadth_first_traverse(voice, &mut |_: &ScoreTree, c: ComponentId| seen.push(c), true);
        assert_eq!(
            seen,
            vec![voice, containers[0], containers[1], leaves[0], leaves[1], leaves[2], leaves[3]]
        );

        let mut reversed = Vec::new();
        tree.breadth_first_traverse(voice, &mut |_: &ScoreTree, c: ComponentId| reversed.push(c), false);
        assert_eq!(reversed[1], containers[1]);
        assert_eq!(reversed[3], leaves[3]);
    }
}
