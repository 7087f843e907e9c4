//! # Mutation Module
//!
//! Structural edits built on the container protocol that need their own
//! spanner policy.
//!
//! ## Operations
//! - **Cloning**: deep copies of components, either with every touching
//!   spanner fractured onto the copy or with no spanners at all
//! - **Splicing**: placing new components beside a component in its
//!   parent, with or without growing the component's spanners over them
//! - **Splitting**: cutting a container in two at a child index, either
//!   fracturing the spanners that cross the cut or leaving them whole
//! - **Fusing**: merging two like containers that sit side by side
//! - **Removal**: taking subtrees out of the score and out of every spanner
//!
//! ## Spanner Policy
//! Splitting fractures by default, deleting truncates. Callers that need
//! the unfractured behaviour pass [`CrossingSpanners::Preserve`].
//!
//! ## Related Modules
//! - `container` - children-list protocol these operations build on
//! - `spanner` - membership bookkeeping

use crate::components::{ComponentId, ScoreTree, SpannerId};
use crate::error::ScoreError;
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Side of a component on which new components are spliced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Whether spliced components join the spanners of the component they are spliced beside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpannerGrowth {
    Grow,
    Keep,
}

/// What happens to spanners that cross a container split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossingSpanners {
    #[default]
    Fracture,
    Preserve,
}

impl ScoreTree {
    /// Deep-copies `components` into new orphan trees.
    ///
    /// Every spanner touching the originals gets a copy restricted to the
    /// copied members, so the clones share no spanner with the originals.
    pub fn clone_and_fracture_crossing_spanners(
        &mut self,
        components: &[ComponentId],
    ) -> Result<Vec<ComponentId>, ScoreError> {
        self.require_clonable(components)?;
        let mut mapping = HashMap::new();
        let mut clones = Vec::with_capacity(components.len());
        for &component in components {
            clones.push(self.clone_subtree(component, &mut mapping)?);
        }

        let originals: HashSet<ComponentId> = mapping.keys().copied().collect();
        let mut copied = 0;
        for spanner in self.spanners_touching(&originals) {
            let data = self.spanner(spanner)?;
            let members: Vec<ComponentId> = data
                .members
                .iter()
                .filter_map(|m| mapping.get(m).copied())
                .collect();
            let kind = data.kind;
            let overrides = data.overrides.clone();
            self.alloc_spanner(kind, members, overrides);
            copied += 1;
        }
        debug!(
            "cloned {} components with {} fractured spanners",
            components.len(),
            copied
        );
        Ok(clones)
    }

    /// `total` spannerless deep copies of `components`, concatenated.
    pub fn clone_without_spanners(
        &mut self,
        components: &[ComponentId],
        total: usize,
    ) -> Result<Vec<ComponentId>, ScoreError> {
        self.require_clonable(components)?;
        let mut clones = Vec::with_capacity(components.len() * total);
        for _ in 0..total {
            for &component in components {
                clones.push(self.clone_subtree(component, &mut HashMap::new())?);
            }
        }
        Ok(clones)
    }

    fn require_clonable(&self, components: &[ComponentId]) -> Result<(), ScoreError> {
        self.require_live(components)?;
        if !self.are_thread_contiguous(components) {
            return Err(ScoreError::ContiguityError(
                "only thread-contiguous components can be cloned together".to_string(),
            ));
        }
        Ok(())
    }

    fn clone_subtree(
        &mut self,
        source: ComponentId,
        mapping: &mut HashMap<ComponentId, ComponentId>,
    ) -> Result<ComponentId, ScoreError> {
        let copy = self.alloc_node_copy(source)?;
        mapping.insert(source, copy);
        let children = self.children(source).to_vec();
        let mut copied_children = Vec::with_capacity(children.len());
        for child in children {
            copied_children.push(self.clone_subtree(child, mapping)?);
        }
        self.link(copy, 0, &copied_children);
        Ok(copy)
    }

    /// Places `new` beside `component` in its parent.
    ///
    /// With [`SpannerGrowth::Grow`] every spanner attached to `component`
    /// grows over the new components. With [`SpannerGrowth::Keep`] only
    /// spanners that already hold both neighbours of the insertion point
    /// grow, as for any insert. Returns the combined run in order.
    pub fn splice(
        &mut self,
        component: ComponentId,
        new: &[ComponentId],
        direction: Direction,
        growth: SpannerGrowth,
    ) -> Result<Vec<ComponentId>, ScoreError> {
        self.component(component)?;
        self.require_live(new)?;
        if new.contains(&component) {
            return Err(ScoreError::StructuralError(format!(
                "cannot splice {} beside itself",
                component
            )));
        }
        if !self.are_thread_contiguous(new) {
            return Err(ScoreError::ContiguityError(
                "spliced components must be thread-contiguous".to_string(),
            ));
        }

        let offset = match direction {
            Direction::Left => 0,
            Direction::Right => 1,
        };
        let grown: Vec<(SpannerId, usize)> = match growth {
            SpannerGrowth::Grow => self
                .spanners_of(component)
                .into_iter()
                .filter_map(|s| Some((s, self.spanner(s).ok()?.index_of(component)? + offset)))
                .collect(),
            SpannerGrowth::Keep => Vec::new(),
        };

        match (self.parent(component), self.rank_in_parent(component)) {
            (Some(parent), Some(rank)) => {
                let index = rank + offset;
                let receipt = match growth {
                    SpannerGrowth::Grow => grown,
                    SpannerGrowth::Keep => self.spanners_dominating_run(parent, index, index)?,
                };
                self.replace_run(parent, index, index, new, &receipt)?;
            }
            _ => {
                if let Some(parented) = new.iter().find(|&&c| !self.is_orphan(c)) {
                    return Err(ScoreError::StructuralError(format!(
                        "cannot splice parented {} beside orphan {}",
                        parented, component
                    )));
                }
                let new_union = self.subtree_union(new);
                let plan = self.regrowth_plan(&grown, &HashSet::new(), new, &new_union);
                self.apply_member_plan(plan);
            }
        }
        debug!(
            "spliced {} components {:?} of {} ({:?})",
            new.len(),
            direction,
            component,
            growth
        );

        let mut run = Vec::with_capacity(new.len() + 1);
        match direction {
            Direction::Left => {
                run.extend_from_slice(new);
                run.push(component);
            }
            Direction::Right => {
                run.push(component);
                run.extend_from_slice(new);
            }
        }
        Ok(run)
    }

    /// Repeats `leaf` until there are `total` of it in a row, growing its spanners.
    pub fn repeat_leaf(&mut self, leaf: ComponentId, total: usize) -> Result<Vec<ComponentId>, ScoreError> {
        if !self.component(leaf)?.is_leaf() {
            return Err(ScoreError::StructuralError(format!("{} is not a leaf", leaf)));
        }
        if total == 0 {
            return Err(ScoreError::StructuralError(
                "a leaf must be repeated at least once".to_string(),
            ));
        }
        let copies = self.clone_without_spanners(&[leaf], total - 1)?;
        self.splice(leaf, &copies, Direction::Right, SpannerGrowth::Grow)
    }

    /// Splits `container` before child `index` into two containers of the
    /// same kind that take its place. The original handle is freed.
    ///
    /// Spanners attached to the container itself now span both halves.
    /// Spanners crossing the cut are fractured or left whole per `policy`.
    pub fn split_container_at(
        &mut self,
        container: ComponentId,
        index: usize,
        policy: CrossingSpanners,
    ) -> Result<(ComponentId, ComponentId), ScoreError> {
        let data = self.container_ref(container)?;
        if data.is_parallel {
            return Err(ScoreError::StructuralError(format!(
                "cannot split parallel container {}",
                container
            )));
        }
        let len = data.len();
        if index > len {
            return Err(ScoreError::IndexOutOfRange { index, len });
        }
        let children = data.children.clone();
        let (left_children, right_children) = children.split_at(index);

        let fractures = match policy {
            CrossingSpanners::Fracture => self.fractures_at_cut(left_children, right_children),
            CrossingSpanners::Preserve => Vec::new(),
        };
        let own_spanners = self.spanners_of(container);

        let left = self.alloc_like(container)?;
        let right = self.alloc_like(container)?;
        for spanner in own_spanners {
            let mut members = self.spanner_members_unchecked(spanner);
            if let Some(position) = members.iter().position(|&m| m == container) {
                members.splice(position..=position, [left, right]);
            }
            self.set_members(spanner, members);
        }
        for (spanner, cut) in &fractures {
            let data = self.spanner(*spanner)?;
            let kind = data.kind;
            let overrides = data.overrides.clone();
            let mut members = data.members.clone();
            let tail = members.split_off(*cut);
            self.set_members(*spanner, members);
            self.alloc_spanner(kind, tail, overrides);
        }

        let parent = self.parent(container);
        let rank = self.rank_in_parent(container);
        for &child in &children {
            self.unlink(child);
        }
        self.link(left, 0, left_children);
        self.link(right, 0, right_children);
        self.unlink(container);
        if let (Some(parent), Some(rank)) = (parent, rank) {
            self.link(parent, rank, &[left, right]);
        }
        self.components.remove(container);
        debug!(
            "split {} at {} into {} and {}, fractured {} spanners",
            container,
            index,
            left,
            right,
            fractures.len()
        );
        Ok((left, right))
    }

    /// Spanners with members on both sides of a cut, each with the index
    /// of its first member on the right.
    fn fractures_at_cut(&self, left: &[ComponentId], right: &[ComponentId]) -> Vec<(SpannerId, usize)> {
        let left_side = self.subtree_union(left);
        let right_side = self.subtree_union(right);
        self.spanners_touching(&left_side)
            .into_iter()
            .filter_map(|spanner| {
                let members = self.spanner(spanner).ok()?.members();
                let cut = members.iter().position(|m| right_side.contains(m))?;
                (cut > 0).then_some((spanner, cut))
            })
            .collect()
    }

    /// Splits `container` into consecutive parts of `counts` children.
    ///
    /// Counts are read once; zero counts are skipped and whatever remains
    /// forms the last part. The original handle is freed when any split happens.
    pub fn partition_by_counts(
        &mut self,
        container: ComponentId,
        counts: &[usize],
        policy: CrossingSpanners,
    ) -> Result<Vec<ComponentId>, ScoreError> {
        if self.container_ref(container)?.is_parallel {
            return Err(ScoreError::StructuralError(format!(
                "cannot partition parallel container {}",
                container
            )));
        }
        let mut parts = Vec::new();
        let mut rest = container;
        for &count in counts {
            if count == 0 {
                continue;
            }
            if count >= self.len(rest) {
                break;
            }
            let (part, remainder) = self.split_container_at(rest, count, policy)?;
            parts.push(part);
            rest = remainder;
        }
        parts.push(rest);
        Ok(parts)
    }

    /// Detaches `components` from their parents and withdraws their whole
    /// subtrees from every spanner, covered ones included.
    pub fn remove_subtree_from_score_and_spanners(&mut self, components: &[ComponentId]) -> Result<(), ScoreError> {
        self.require_live(components)?;
        let inside = self.subtree_union(components);
        let mut plan = BTreeMap::new();
        for spanner in self.spanners_touching(&inside) {
            let members = self.spanner_members_unchecked(spanner);
            plan.insert(
                spanner,
                members.into_iter().filter(|m| !inside.contains(m)).collect(),
            );
        }
        let stripped = plan.len();
        self.apply_member_plan(plan);
        for &component in components {
            self.unlink(component);
        }
        debug!(
            "removed {} subtrees from score and {} spanners",
            components.len(),
            stripped
        );
        Ok(())
    }

    /// Withdraws thread-contiguous `components` from spanners that cross out of them.
    pub fn withdraw_from_crossing_spanners(&mut self, components: &[ComponentId]) -> Result<(), ScoreError> {
        self.require_live(components)?;
        if !self.are_thread_contiguous(components) {
            return Err(ScoreError::ContiguityError(
                "only thread-contiguous components can be withdrawn together".to_string(),
            ));
        }
        let inside = self.subtree_union(components);
        let mut plan = BTreeMap::new();
        for spanner in self.crossing_within(&inside) {
            let members = self.spanner_members_unchecked(spanner);
            plan.insert(
                spanner,
                members.into_iter().filter(|m| !inside.contains(m)).collect(),
            );
        }
        self.apply_member_plan(plan);
        Ok(())
    }

    /// Moves the children of `right` to the end of `left` and frees `right`.
    ///
    /// The containers must be alike (same kind, name, multiplier and mode)
    /// and either both orphans or adjacent siblings in that order. Spanners
    /// attached to `right` are transferred to `left`.
    pub fn fuse_containers(&mut self, left: ComponentId, right: ComponentId) -> Result<ComponentId, ScoreError> {
        if left == right {
            return Err(ScoreError::StructuralError(format!(
                "cannot fuse {} with itself",
                left
            )));
        }
        let left_data = self.container_ref(left)?;
        let right_data = self.container_ref(right)?;
        if left_data.kind != right_data.kind || left_data.is_parallel != right_data.is_parallel {
            return Err(ScoreError::StructuralError(format!(
                "{} and {} are not like-named containers",
                left, right
            )));
        }
        let adjacent = match (self.parent(left), self.parent(right)) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a == b
                    && !self.is_parallel(a)
                    && self.rank_in_parent(left).map(|r| r + 1) == self.rank_in_parent(right)
            }
            _ => false,
        };
        if !adjacent {
            return Err(ScoreError::StructuralError(format!(
                "{} and {} are not adjacent",
                left, right
            )));
        }

        let mut plan = BTreeMap::new();
        for spanner in self.spanners_of(right) {
            let members = self.spanner_members_unchecked(spanner);
            let holds_left = members.contains(&left);
            let members = members
                .into_iter()
                .filter_map(|m| match m {
                    m if m == right && holds_left => None,
                    m if m == right => Some(left),
                    m => Some(m),
                })
                .collect();
            plan.insert(spanner, members);
        }

        let moved = right_data.children.clone();
        self.apply_member_plan(plan);
        for &child in &moved {
            self.unlink(child);
        }
        let end = self.len(left);
        self.link(left, end, &moved);
        self.unlink(right);
        self.components.remove(right);
        debug!("fused {} children of {} into {}", moved.len(), right, left);
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spanner::SpannerKind;

    fn voice_of(tree: &mut ScoreTree, source: &str) -> (ComponentId, Vec<ComponentId>) {
        let voice = tree.voice(None);
        let leaves = tree.leaves_from_str(source).unwrap();
        tree.extend(voice, &leaves).unwrap();
        (voice, leaves)
    }

    #[test]
    fn test_clone_and_fracture_copies_restricted_spanners() {
        let mut tree = ScoreTree::new();
        let (_, leaves) = voice_of(&mut tree, "c'8 d'8 e'8 f'8");
        let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();

        let clones = tree.clone_and_fracture_crossing_spanners(&leaves[1..3]).unwrap();
        assert_eq!(clones.len(), 2);
        assert!(clones.iter().all(|&c| tree.is_orphan(c)));
        // original untouched
        assert_eq!(tree.spanner_members(beam).unwrap(), &leaves[..]);
        let copy = tree.the_only_spanner_attached_to(clones[0], None).unwrap();
        assert_ne!(copy, beam);
        assert_eq!(tree.spanner(copy).unwrap().kind(), SpannerKind::Beam);
        assert_eq!(tree.spanner_members(copy).unwrap(), &clones[..]);
    }

    #[test]
    fn test_clone_without_spanners() {
        let mut tree = ScoreTree::new();
        let (_, leaves) = voice_of(&mut tree, "c'8 d'8");
        tree.attach(SpannerKind::Slur, &leaves).unwrap();
        let clones = tree.clone_without_spanners(&leaves, 3).unwrap();
        assert_eq!(clones.len(), 6);
        assert!(clones.iter().all(|&c| tree.spanners_of(c).is_empty()));
    }

    #[test]
    fn test_clone_rejects_discontiguous_components() {
        let mut tree = ScoreTree::new();
        let (_, leaves) = voice_of(&mut tree, "c'8 d'8 e'8");
        let before = tree.component_count();
        assert!(matches!(
            tree.clone_and_fracture_crossing_spanners(&[leaves[0], leaves[2]]),
            Err(ScoreError::ContiguityError(_))
        ));
        assert_eq!(tree.component_count(), before);
    }

    #[test]
    fn test_splice_right_and_grow() {
        let mut tree = ScoreTree::new();
        let (voice, leaves) = voice_of(&mut tree, "c'8 d'8 e'8");
        let beam = tree.attach(SpannerKind::Beam, &leaves[..2]).unwrap();
        let new = tree.leaves_from_str("g'8 a'8").unwrap();

        let run = tree
            .splice(leaves[1], &new, Direction::Right, SpannerGrowth::Grow)
            .unwrap();
        assert_eq!(run, vec![leaves[1], new[0], new[1]]);
        assert_eq!(
            tree.children(voice),
            &[leaves[0], leaves[1], new[0], new[1], leaves[2]]
        );
        assert_eq!(
            tree.spanner_members(beam).unwrap(),
            &[leaves[0], leaves[1], new[0], new[1]]
        );
    }

    #[test]
    fn test_splice_left_without_growth() {
        let mut tree = ScoreTree::new();
        let (voice, leaves) = voice_of(&mut tree, "c'8 d'8");
        let beam = tree.attach(SpannerKind::Beam, &leaves[1..]).unwrap();
        let new = tree.leaves_from_str("b8").unwrap();

        tree.splice(leaves[1], &new, Direction::Left, SpannerGrowth::Keep)
            .unwrap();
        assert_eq!(tree.children(voice), &[leaves[0], new[0], leaves[1]]);
        assert_eq!(tree.spanner_members(beam).unwrap(), &[leaves[1]]);
    }

    #[test]
    fn test_splice_beside_orphan_grows_spanners_only() {
        let mut tree = ScoreTree::new();
        let note = tree.leaves_from_str("c'4").unwrap()[0];
        let tie = tree.attach(SpannerKind::Tie, &[note]).unwrap();
        let new = tree.leaves_from_str("c'4").unwrap();
        tree.splice(note, &new, Direction::Right, SpannerGrowth::Grow)
            .unwrap();
        assert!(tree.is_orphan(new[0]));
        assert_eq!(tree.spanner_members(tie).unwrap(), &[note, new[0]]);
    }

    #[test]
    fn test_repeat_leaf() {
        let mut tree = ScoreTree::new();
        let (voice, leaves) = voice_of(&mut tree, "c'4 d'4");
        let tie = tree.attach(SpannerKind::Tie, &leaves[..1]).unwrap();
        let run = tree.repeat_leaf(leaves[0], 3).unwrap();
        assert_eq!(run.len(), 3);
        assert_eq!(tree.len(voice), 4);
        assert_eq!(tree.spanner_members(tie).unwrap(), &run[..]);
        assert!(tree.repeat_leaf(leaves[0], 0).is_err());
        assert!(tree.repeat_leaf(voice, 2).is_err());
    }

    #[test]
    fn test_split_fractures_crossing_spanners() {
        let mut tree = ScoreTree::new();
        let outer = tree.container();
        let (voice, leaves) = voice_of(&mut tree, "c'8 d'8 e'8 f'8");
        tree.append(outer, voice).unwrap();
        let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();
        let whole = tree.attach(SpannerKind::Slur, &[voice]).unwrap();

        let (left, right) = tree
            .split_container_at(voice, 2, CrossingSpanners::Fracture)
            .unwrap();
        assert!(!tree.is_live(voice));
        assert_eq!(tree.children(outer), &[left, right]);
        assert_eq!(tree.children(left), &leaves[..2]);
        assert_eq!(tree.children(right), &leaves[2..]);
        assert_eq!(tree.spanner_members(beam).unwrap(), &leaves[..2]);
        let tail = tree.the_only_spanner_attached_to(leaves[2], None).unwrap();
        assert_eq!(tree.spanner_members(tail).unwrap(), &leaves[2..]);
        assert_eq!(tree.spanner_members(whole).unwrap(), &[left, right]);
    }

    #[test]
    fn test_split_preserving_spanners() {
        let mut tree = ScoreTree::new();
        let (voice, leaves) = voice_of(&mut tree, "c'8 d'8 e'8 f'8");
        let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();
        let (left, right) = tree
            .split_container_at(voice, 1, CrossingSpanners::Preserve)
            .unwrap();
        assert_eq!(tree.len(left), 1);
        assert_eq!(tree.len(right), 3);
        assert_eq!(tree.spanner_members(beam).unwrap(), &leaves[..]);
    }

    #[test]
    fn test_split_rejects_parallel_and_bad_index() {
        let mut tree = ScoreTree::new();
        let score = tree.score(None);
        assert!(tree
            .split_container_at(score, 0, CrossingSpanners::Fracture)
            .is_err());
        let (voice, _) = voice_of(&mut tree, "c'8 d'8");
        assert!(matches!(
            tree.split_container_at(voice, 3, CrossingSpanners::Fracture),
            Err(ScoreError::IndexOutOfRange { index: 3, len: 2 })
        ));
        assert!(tree.is_live(voice));
    }

    #[test]
    fn test_partition_by_counts() {
        let mut tree = ScoreTree::new();
        let outer = tree.container();
        let (voice, leaves) = voice_of(&mut tree, "c'8 d'8 e'8 f'8 g'8 a'8");
        tree.append(outer, voice).unwrap();
        let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();

        let parts = tree
            .partition_by_counts(voice, &[2, 0, 3], CrossingSpanners::Fracture)
            .unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(tree.children(outer), &parts[..]);
        let sizes: Vec<usize> = parts.iter().map(|&p| tree.len(p)).collect();
        assert_eq!(sizes, vec![2, 3, 1]);
        assert_eq!(tree.spanner_members(beam).unwrap(), &leaves[..2]);
        assert_eq!(tree.spanners_contained_by(&parts).len(), 3);
    }

    #[test]
    fn test_partition_unfractured_keeps_one_spanner() {
        let mut tree = ScoreTree::new();
        let (voice, leaves) = voice_of(&mut tree, "c'8 d'8 e'8 f'8");
        let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();
        let parts = tree
            .partition_by_counts(voice, &[1, 1], CrossingSpanners::Preserve)
            .unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(tree.spanner_members(beam).unwrap(), &leaves[..]);
        assert_eq!(tree.spanner_count(), 1);
    }

    #[test]
    fn test_remove_subtree_strips_covered_spanners() {
        let mut tree = ScoreTree::new();
        let outer = tree.container();
        let (voice, leaves) = voice_of(&mut tree, "c'8 d'8");
        tree.append(outer, voice).unwrap();
        let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();

        tree.remove_subtree_from_score_and_spanners(&[voice]).unwrap();
        assert!(tree.is_orphan(voice));
        assert!(!tree.is_spanner_live(beam));
        assert_eq!(tree.len(outer), 0);
    }

    #[test]
    fn test_withdraw_from_crossing_spanners() {
        let mut tree = ScoreTree::new();
        let (_, leaves) = voice_of(&mut tree, "c'8 d'8 e'8");
        let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();
        let slur = tree.attach(SpannerKind::Slur, &leaves[1..2]).unwrap();

        tree.withdraw_from_crossing_spanners(&leaves[1..]).unwrap();
        assert_eq!(tree.spanner_members(beam).unwrap(), &leaves[..1]);
        assert_eq!(tree.spanner_members(slur).unwrap(), &leaves[1..2]);
    }

    #[test]
    fn test_fuse_adjacent_like_containers() {
        let mut tree = ScoreTree::new();
        let voice = tree.voice(None);
        let first = tree.container();
        let second = tree.container();
        let a = tree.leaves_from_str("c'8 d'8").unwrap();
        let b = tree.leaves_from_str("e'8").unwrap();
        tree.extend(first, &a).unwrap();
        tree.extend(second, &b).unwrap();
        tree.extend(voice, &[first, second]).unwrap();
        let slur = tree.attach(SpannerKind::Slur, &[first, second]).unwrap();

        let fused = tree.fuse_containers(first, second).unwrap();
        assert_eq!(fused, first);
        assert!(!tree.is_live(second));
        assert_eq!(tree.children(voice), &[first]);
        assert_eq!(tree.children(first), &[a[0], a[1], b[0]]);
        assert_eq!(tree.spanner_members(slur).unwrap(), &[first]);
    }

    #[test]
    fn test_fuse_rejects_unlike_or_distant_containers() {
        let mut tree = ScoreTree::new();
        let voice = tree.voice(None);
        let plain = tree.container();
        let tuplet = tree.tuplet(crate::types::duration(2, 3)).unwrap();
        assert!(tree.fuse_containers(plain, tuplet).is_err());
        assert!(tree.fuse_containers(plain, voice).is_err());

        let outer = tree.container();
        let first = tree.container();
        let middle = tree.container();
        let last = tree.container();
        tree.extend(outer, &[first, middle, last]).unwrap();
        assert!(tree.fuse_containers(first, last).is_err());
        assert!(tree.fuse_containers(middle, first).is_err());
    }
}
