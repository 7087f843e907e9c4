//! # Container Module
//!
//! The mutation protocol for a container's children.
//!
//! ## Purpose
//! Every edit of a children list also renegotiates spanner membership.
//! The protocol keeps the tree and its spanners consistent:
//! - **set / set_slice**: spanners dominating the replaced run are recorded
//!   with the position of the run inside them. The old subtrees leave the
//!   tree and every spanner. The new components are withdrawn from
//!   spanners crossing out of them, moved here, and reinserted into the
//!   recorded spanners at the recorded position.
//! - **insert / append / extend**: `set_slice` over an empty run. Inserting
//!   strictly between two children grows every spanner holding both;
//!   appending grows nothing.
//! - **delete / pop**: the removed subtrees are withdrawn from spanners
//!   crossing out of them. Spanners they cover travel with them.
//!
//! ## Transactions
//! Each operation validates its arguments and computes the complete new
//! membership of every affected spanner before it changes anything. Edits
//! that move spanned components are staged on a copy and committed only
//! when those spanners stay thread-contiguous, so an `Err` leaves the tree
//! untouched. Spanners emptied by the operation are collected when it
//! finishes.
//!
//! ## Example
//! ```rust
//! use scoretree::{ScoreTree, SpannerKind};
//!
//! let mut tree = ScoreTree::new();
//! let voice = tree.voice(None);
//! let leaves = tree.leaves_from_str("c'8 d'8 e'8").unwrap();
//! tree.extend(voice, &leaves).unwrap();
//! let slur = tree.attach(SpannerKind::Slur, &leaves[..2]).unwrap();
//!
//! let replacement = tree.leaves_from_str("g'8").unwrap()[0];
//! tree.set(voice, 1, replacement).unwrap();
//!
//! assert_eq!(tree.spanner_members(slur).unwrap(), &[leaves[0], replacement]);
//! assert_eq!(tree.parent(leaves[1]), None);
//! ```
//!
//! ## Related Modules
//! - `spanner` - membership bookkeeping and dominance queries
//! - `mutation` - higher-level splicing, splitting and cloning


use crate::components::{ComponentId, ComponentKind, Container, ContainerKind, ScoreTree, SpannerId};
use crate::error::ScoreError;
use crate::types::Multiplier;
use log::debug;
use num_traits::Zero;
use std::collections::{BTreeMap, HashMap, HashSet};

impl ScoreTree {
    pub fn get(&self, container: ComponentId, index: usize) -> Result<ComponentId, ScoreError> {
        let children = &self.container_ref(container)?.children;
        children.get(index).copied().ok_or(ScoreError::IndexOutOfRange {
            index,
            len: children.len(),
        })
    }

    pub fn get_slice(&self, container: ComponentId, start: usize, stop: usize) -> Result<Vec<ComponentId>, ScoreError> {
        let children = &self.container_ref(container)?.children;
        check_run(start, stop, children.len())?;
        Ok(children[start..stop].to_vec())
    }

    pub fn index_of(&self, container: ComponentId, component: ComponentId) -> Result<usize, ScoreError> {
        self.container_ref(container)?
            .children
            .iter()
            .position(|&c| c == component)
            .ok_or_else(|| {
                ScoreError::StructuralError(format!("{} is not a child of {}", component, container))
            })
    }

    /// Replaces the child at `index` with `component`.
    pub fn set(&mut self, container: ComponentId, index: usize, component: ComponentId) -> Result<(), ScoreError> {
        let len = self.container_ref(container)?.len();
        if index >= len {
            return Err(ScoreError::IndexOutOfRange { index, len });
        }
        self.set_slice(container, index, index + 1, &[component])
    }

    /// Replaces the children `start..stop` with `components`.
    pub fn set_slice(
        &mut self,
        container: ComponentId,
        start: usize,
        stop: usize,
        components: &[ComponentId],
    ) -> Result<(), ScoreError> {
        let receipt = self.spanners_dominating_run(container, start, stop)?;
        self.replace_run(container, start, stop, components, &receipt)
    }

    pub fn insert(&mut self, container: ComponentId, index: usize, component: ComponentId) -> Result<(), ScoreError> {
        let len = self.container_ref(container)?.len();
        if index > len {
            return Err(ScoreError::IndexOutOfRange { index, len });
        }
        self.set_slice(container, index, index, &[component])
    }

    pub fn append(&mut self, container: ComponentId, component: ComponentId) -> Result<(), ScoreError> {
        self.extend(container, &[component])
    }

    pub fn extend(&mut self, container: ComponentId, components: &[ComponentId]) -> Result<(), ScoreError> {
        let len = self.container_ref(container)?.len();
        self.set_slice(container, len, len, components)
    }

    pub fn delete(&mut self, container: ComponentId, index: usize) -> Result<(), ScoreError> {
        let len = self.container_ref(container)?.len();
        if index >= len {
            return Err(ScoreError::IndexOutOfRange { index, len });
        }
        self.delete_range(container, index, index + 1)
    }

    /// Detaches the children `start..stop`, truncating spanners that cross out of them.
    pub fn delete_range(&mut self, container: ComponentId, start: usize, stop: usize) -> Result<(), ScoreError> {
        let children = &self.container_ref(container)?.children;
        check_run(start, stop, children.len())?;
        let run = children[start..stop].to_vec();

        let inside = self.subtree_union(&run);
        let mut plan = BTreeMap::new();
        for spanner in self.crossing_within(&inside) {
            let members = self.spanner_members_unchecked(spanner);
            plan.insert(
                spanner,
                members.into_iter().filter(|m| !inside.contains(m)).collect(),
            );
        }

        let truncated = plan.len();
        self.apply_member_plan(plan);
        for &child in &run {
            self.unlink(child);
        }
        debug!(
            "deleted {} children of {}, truncated {} crossing spanners",
            run.len(),
            container,
            truncated
        );
        Ok(())
    }

    pub fn pop(&mut self, container: ComponentId, index: usize) -> Result<ComponentId, ScoreError> {
        let child = self.get(container, index)?;
        self.delete_range(container, index, index + 1)?;
        Ok(child)
    }

    pub fn pop_range(&mut self, container: ComponentId, start: usize, stop: usize) -> Result<Vec<ComponentId>, ScoreError> {
        let run = self.get_slice(container, start, stop)?;
        self.delete_range(container, start, stop)?;
        Ok(run)
    }

    /// Deletes `component` from `container`.
    pub fn remove(&mut self, container: ComponentId, component: ComponentId) -> Result<(), ScoreError> {
        let index = self.index_of(container, component)?;
        self.delete_range(container, index, index + 1)
    }

    /// Wraps `children` in a new container of `kind`.
    ///
    /// The children must be orphans or a contiguous run of one parent; in
    /// the second case the new container takes the run's place. Spanners
    /// are left as they are, so a context wrapper that would cut a spanner
    /// off from the rest of its thread is a `ContiguityError`.
    pub fn container_from(&mut self, kind: ContainerKind, children: &[ComponentId]) -> Result<ComponentId, ScoreError> {
        self.require_live(children)?;
        let mut seen = HashSet::new();
        if let Some(duplicate) = children.iter().find(|&&c| !seen.insert(c)) {
            return Err(ScoreError::StructuralError(format!(
                "{} given twice",
                duplicate
            )));
        }
        if let Some(multiplier) = kind.tuplet_multiplier() {
            if multiplier <= Multiplier::zero() {
                return Err(ScoreError::DurationError(format!(
                    "tuplet multiplier must be positive, got {}",
                    multiplier
                )));
            }
        }
        let is_parallel = kind
            .context()
            .map_or(false, |context| context.is_parallel_by_default());
        if is_parallel {
            self.require_contexts(children)?;
        }
        let placement = self.parent_and_run(children)?;
        if let Some((parent, _, _)) = placement {
            if self.is_parallel(parent) && !kind.is_context() {
                return Err(ScoreError::StructuralError(format!(
                    "parallel container {} can only take a context in place of its children",
                    parent
                )));
            }
        }

        let watched = self.spanners_touching(&self.subtree_union(children));
        let wrapper = self.commit_if_contiguous(&watched, |tree| {
            let wrapper = tree.alloc(ComponentKind::Container(Container::new(kind, is_parallel)));
            for &child in children {
                tree.unlink(child);
            }
            if let Some((parent, start, _)) = placement {
                tree.link(parent, start, &[wrapper]);
            }
            tree.link(wrapper, 0, children);
            wrapper
        })?;
        debug!("wrapped {} components in {}", children.len(), wrapper);
        Ok(wrapper)
    }

    /// `left + right`: fuses spanner-fractured copies of two like containers.
    pub fn concat(&mut self, left: ComponentId, right: ComponentId) -> Result<ComponentId, ScoreError> {
        self.require_like(left, right)?;
        let left_copy = self.clone_and_fracture_crossing_spanners(&[left])?;
        let right_copy = self.clone_and_fracture_crossing_spanners(&[right])?;
        self.fuse_containers(left_copy[0], right_copy[0])
    }

    /// `target += source`: appends a spanner-fractured copy of the contents of `source`.
    pub fn concat_into(&mut self, target: ComponentId, source: ComponentId) -> Result<(), ScoreError> {
        self.require_like(target, source)?;
        let copy = self.clone_and_fracture_crossing_spanners(&[source])?[0];
        let moved = self.children(copy).to_vec();
        self.extend(target, &moved)?;
        self.discard(copy)
    }

    /// `container *= total`: repeats the contents, each repetition with its own spanners.
    pub fn repeat_contents(&mut self, container: ComponentId, total: usize) -> Result<(), ScoreError> {
        let data = self.container_ref(container)?;
        if data.is_parallel {
            return Err(ScoreError::StructuralError(format!(
                "cannot repeat the simultaneous contents of {}",
                container
            )));
        }
        let originals = data.children.clone();
        if total == 0 {
            return self.delete_range(container, 0, originals.len());
        }
        for _ in 1..total {
            let copies = self.clone_and_fracture_crossing_spanners(&originals)?;
            self.extend(container, &copies)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Protocol internals
    // ---------------------------------------------------------------------

    /// Replaces `start..stop` with `new`, regrowing the spanners in `receipt`
    /// around the new run.
    pub(crate) fn replace_run(
        &mut self,
        container: ComponentId,
        start: usize,
        stop: usize,
        new: &[ComponentId],
        receipt: &[(SpannerId, usize)],
    ) -> Result<(), ScoreError> {
        let data = self.container_ref(container)?;
        check_run(start, stop, data.len())?;
        let children = data.children.clone();
        let is_parallel = data.is_parallel;

        self.require_live(new)?;
        let new_set: HashSet<ComponentId> = new.iter().copied().collect();
        if new_set.len() != new.len() {
            return Err(ScoreError::StructuralError(
                "the same component cannot be inserted twice".to_string(),
            ));
        }
        if let Some(ancestor) = self
            .parentage(container, true)
            .into_iter()
            .find(|a| new_set.contains(a))
        {
            return Err(ScoreError::StructuralError(format!(
                "{} cannot be placed inside itself",
                ancestor
            )));
        }
        if is_parallel {
            self.require_contexts(new)?;
        }

        let old_run = &children[start..stop];
        let removed: Vec<ComponentId> = old_run
            .iter()
            .copied()
            .filter(|c| !new_set.contains(c))
            .collect();
        let new_union = self.subtree_union(new);
        let stripped: HashSet<ComponentId> = self
            .subtree_union(&removed)
            .into_iter()
            .filter(|c| !new_union.contains(c))
            .collect();
        let plan = self.regrowth_plan(receipt, &stripped, new, &new_union);
        let anchor = children[stop..]
            .iter()
            .copied()
            .find(|c| !new_set.contains(c));

        let mut watched: Vec<SpannerId> = plan.keys().copied().collect();
        watched.extend(self.spanners_touching(&new_union));
        self.sort_by_serial(&mut watched);

        let regrown = receipt.len();
        self.commit_if_contiguous(&watched, |tree| {
            tree.apply_member_plan(plan);
            for &child in old_run {
                tree.unlink(child);
            }
            for &component in new {
                tree.unlink(component);
            }
            let index = anchor
                .and_then(|a| tree.children(container).iter().position(|&c| c == a))
                .unwrap_or_else(|| tree.len(container));
            tree.link(container, index, new);
        })?;
        debug!(
            "replaced {} children of {} at {}..{} with {}, regrew {} spanners",
            old_run.len(),
            container,
            start,
            stop,
            new.len(),
            regrown
        );
        Ok(())
    }

    /// New memberships after `stripped` leaves every spanner, `new` leaves
    /// the spanners crossing out of it, and `new` is reinserted into the
    /// receipt spanners at their recorded index.
    pub(crate) fn regrowth_plan(
        &self,
        receipt: &[(SpannerId, usize)],
        stripped: &HashSet<ComponentId>,
        new: &[ComponentId],
        new_union: &HashSet<ComponentId>,
    ) -> BTreeMap<SpannerId, Vec<ComponentId>> {
        let receipt: HashMap<SpannerId, usize> = receipt.iter().copied().collect();
        let crossing: HashSet<SpannerId> = self.crossing_within(new_union).into_iter().collect();

        let mut affected: Vec<SpannerId> = self.spanners_touching(stripped);
        affected.extend(crossing.iter().copied());
        affected.extend(receipt.keys().copied());
        self.sort_by_serial(&mut affected);

        let mut plan = BTreeMap::new();
        for spanner in affected {
            let members = self.spanner_members_unchecked(spanner);
            let withdraw_new = crossing.contains(&spanner) || receipt.contains_key(&spanner);
            let keep = |m: &ComponentId| {
                !stripped.contains(m) && !(withdraw_new && new_union.contains(m))
            };
            let mut retained: Vec<ComponentId> = members.iter().copied().filter(|m| keep(m)).collect();
            if let Some(&index) = receipt.get(&spanner) {
                let position = members[..index.min(members.len())]
                    .iter()
                    .filter(|m| keep(*m))
                    .count();
                retained.splice(position..position, new.iter().copied());
            }
            plan.insert(spanner, retained);
        }
        plan
    }

    fn require_contexts(&self, components: &[ComponentId]) -> Result<(), ScoreError> {
        match components.iter().find(|&&c| !self.is_context(c)) {
            Some(bad) => Err(ScoreError::StructuralError(format!(
                "parallel containers hold only contexts, not {}",
                bad
            ))),
            None => Ok(()),
        }
    }

    fn require_like(&self, left: ComponentId, right: ComponentId) -> Result<(), ScoreError> {
        let left_data = self.container_ref(left)?;
        let right_data = self.container_ref(right)?;
        if left_data.kind != right_data.kind || left_data.is_parallel != right_data.is_parallel {
            return Err(ScoreError::StructuralError(format!(
                "{} and {} are not like containers",
                left, right
            )));
        }
        Ok(())
    }
}

fn check_run(start: usize, stop: usize, len: usize) -> Result<(), ScoreError> {
    if stop > len {
        return Err(ScoreError::IndexOutOfRange { index: stop, len });
    }
    if start > stop {
        return Err(ScoreError::StructuralError(format!(
            "run start {} is past its stop {}",
            start, stop
        )));
    }
    Ok(())
}
