//! # Spanner Module
//!
//! Spanners are ordered, non-owning lists of components that cut across
//! the tree: a beam over four eighth notes, a slur from one bar into the
//! next, a crescendo over a whole voice.
//!
//! ## Purpose
//! The spanner owns the authoritative membership list. Every member keeps
//! the spanner's handle in its aggregator set, and both sides are only
//! ever changed together by the helpers in this module.
//!
//! ## Membership Rules
//! - Members must be thread-contiguous (see `navigation`)
//! - A spanner that loses its last member is collected at the end of the
//!   mutation that emptied it
//! - Client code attaches, detaches, fractures and fuses; growing a
//!   spanner at an arbitrary index is reserved for the container protocol
//!
//! ## Sub-modules
//! - `types` - [`Spanner`], [`SpannerKind`], [`GrobOverride`]
//! - `query` - dominance, crossing and covering classification
//!
//! ## Example
//! ```rust
//! use scoretree::{ScoreTree, SpannerKind};
//!
//! let mut tree = ScoreTree::new();
//! let voice = tree.voice(None);
//! let leaves = tree.leaves_from_str("c'8 d'8 e'8 f'8").unwrap();
//! tree.extend(voice, &leaves).unwrap();
//!
//! let beam = tree.attach(SpannerKind::Beam, &leaves).unwrap();
//! let (left, right) = tree.fracture(beam, 2).unwrap();
//!
//! assert_eq!(tree.spanner_members(left).unwrap(), &leaves[..2]);
//! assert_eq!(tree.spanner_members(right).unwrap(), &leaves[2..]);
//! ```
//!
//! ## Related Modules
//! - `container` - grows, shrinks and reinserts spanners as children change
//! - `mutation` - fractures spanners across clones and splits

mod query;
mod types;


pub use types::{GrobOverride, Spanner, SpannerKind, SpannerMarks};

use crate::components::{ComponentId, ScoreTree, SpannerId};
use crate::error::ScoreError;
use log::{debug, trace};
use std::collections::{BTreeMap, HashSet};

impl ScoreTree {
    pub fn spanner(&self, id: SpannerId) -> Result<&Spanner, ScoreError> {
        self.spanners
            .get(id)
            .ok_or_else(|| ScoreError::StaleHandle(format!("spanner {}", id)))
    }

    pub fn is_spanner_live(&self, id: SpannerId) -> bool {
        self.spanners.contains(id)
    }

    /// Creates a spanner over `components`, which must be thread-contiguous.
    pub fn attach(&mut self, kind: SpannerKind, components: &[ComponentId]) -> Result<SpannerId, ScoreError> {
        self.validate_members(components)?;
        let id = self.alloc_spanner(kind, components.to_vec(), Vec::new());
        debug!("attached {} {} to {} components", kind, id, components.len());
        Ok(id)
    }

    /// Removes one member. The remaining members must stay contiguous;
    /// a spanner left empty is destroyed.
    pub fn detach(&mut self, spanner: SpannerId, component: ComponentId) -> Result<(), ScoreError> {
        self.index_in_spanner(spanner, component)?;
        let remaining: Vec<ComponentId> = self
            .spanner(spanner)?
            .members
            .iter()
            .copied()
            .filter(|&m| m != component)
            .collect();
        if !self.are_thread_contiguous(&remaining) {
            return Err(ScoreError::ContiguityError(format!(
                "detaching {} would leave {} discontiguous",
                component, spanner
            )));
        }
        self.set_members(spanner, remaining);
        self.collect_dead_spanners([spanner]);
        debug!("detached {} from {}", component, spanner);
        Ok(())
    }

    /// Removes the spanner from every member and frees it.
    pub fn destroy(&mut self, spanner: SpannerId) -> Result<(), ScoreError> {
        self.spanner(spanner)?;
        self.set_members(spanner, Vec::new());
        self.spanners.remove(spanner);
        debug!("destroyed {}", spanner);
        Ok(())
    }

    /// Splits `spanner` before member `index`.
    ///
    /// The original handle keeps `members[..index]`; a new spanner of the
    /// same kind and overrides takes `members[index..]`.
    pub fn fracture(&mut self, spanner: SpannerId, index: usize) -> Result<(SpannerId, SpannerId), ScoreError> {
        let data = self.spanner(spanner)?;
        let len = data.len();
        if index > len {
            return Err(ScoreError::IndexOutOfRange { index, len });
        }
        if index == 0 || index == len {
            return Err(ScoreError::StructuralError(format!(
                "fracturing {} at {} would leave one side empty",
                spanner, index
            )));
        }
        let kind = data.kind;
        let overrides = data.overrides.clone();
        let right = data.members[index..].to_vec();
        let left = data.members[..index].to_vec();
        self.set_members(spanner, left);
        let fractured = self.alloc_spanner(kind, right, overrides);
        debug!("fractured {} at {} into {}", spanner, index, fractured);
        Ok((spanner, fractured))
    }

    /// Splits `spanner` so that `component` starts the right-hand half.
    pub fn fracture_at(&mut self, spanner: SpannerId, component: ComponentId) -> Result<(SpannerId, SpannerId), ScoreError> {
        let index = self.index_in_spanner(spanner, component)?;
        self.fracture(spanner, index)
    }

    /// Appends the members of `right` to `left` and destroys `right`.
    pub fn fuse_spanners(&mut self, left: SpannerId, right: SpannerId) -> Result<SpannerId, ScoreError> {
        if left == right {
            return Err(ScoreError::StructuralError(format!(
                "cannot fuse {} with itself",
                left
            )));
        }
        let left_data = self.spanner(left)?;
        let right_data = self.spanner(right)?;
        if left_data.kind != right_data.kind {
            return Err(ScoreError::StructuralError(format!(
                "cannot fuse {} {} with {} {}",
                left_data.kind, left, right_data.kind, right
            )));
        }
        let mut combined = left_data.members.clone();
        combined.extend(right_data.members.iter().copied());
        self.validate_members(&combined)?;
        self.set_members(right, Vec::new());
        self.spanners.remove(right);
        self.set_members(left, combined);
        debug!("fused {} into {}", right, left);
        Ok(left)
    }

    pub fn spanner_members(&self, spanner: SpannerId) -> Result<&[ComponentId], ScoreError> {
        Ok(self.spanner(spanner)?.members())
    }

    /// Leaves of every member, in order and without repeats.
    pub fn spanner_leaves(&self, spanner: SpannerId) -> Result<Vec<ComponentId>, ScoreError> {
        let mut seen = HashSet::new();
        let mut leaves = Vec::new();
        for &member in &self.spanner(spanner)?.members {
            for leaf in self.leaves(member) {
                if seen.insert(leaf) {
                    leaves.push(leaf);
                }
            }
        }
        Ok(leaves)
    }

    pub fn index_in_spanner(&self, spanner: SpannerId, component: ComponentId) -> Result<usize, ScoreError> {
        self.spanner(spanner)?.index_of(component).ok_or_else(|| {
            ScoreError::MissingRelationError(format!("{} is not a member of {}", component, spanner))
        })
    }

    pub fn spanner_contains(&self, spanner: SpannerId, component: ComponentId) -> bool {
        self.spanners
            .get(spanner)
            .map_or(false, |s| s.contains(component))
    }

    pub fn add_grob_override(&mut self, spanner: SpannerId, grob_override: GrobOverride) -> Result<(), ScoreError> {
        self.spanners
            .get_mut(spanner)
            .ok_or_else(|| ScoreError::StaleHandle(format!("spanner {}", spanner)))?
            .overrides
            .push(grob_override);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Membership bookkeeping shared with the mutation protocol
    // ---------------------------------------------------------------------

    /// Checks a prospective membership list.
    pub(crate) fn validate_members(&self, members: &[ComponentId]) -> Result<(), ScoreError> {
        if members.is_empty() {
            return Err(ScoreError::StructuralError(
                "a spanner needs at least one component".to_string(),
            ));
        }
        self.require_live(members)?;
        let mut seen = HashSet::new();
        if let Some(duplicate) = members.iter().find(|&&m| !seen.insert(m)) {
            return Err(ScoreError::StructuralError(format!(
                "{} appears twice in one spanner",
                duplicate
            )));
        }
        if !self.are_thread_contiguous(members) {
            return Err(ScoreError::ContiguityError(format!(
                "components {:?} are not thread-contiguous",
                members
            )));
        }
        Ok(())
    }

    pub(crate) fn alloc_spanner(
        &mut self,
        kind: SpannerKind,
        members: Vec<ComponentId>,
        overrides: Vec<GrobOverride>,
    ) -> SpannerId {
        let serial = self.next_serial();
        let id = self.spanners.insert(Spanner {
            kind,
            members: Vec::new(),
            overrides,
            serial,
        });
        self.set_members(id, members);
        id
    }

    pub(crate) fn spanner_members_unchecked(&self, spanner: SpannerId) -> Vec<ComponentId> {
        self.spanners
            .get(spanner)
            .map(|s| s.members.clone())
            .unwrap_or_default()
    }

    /// Replaces the membership of `spanner`, keeping every member's aggregator in step.
    pub(crate) fn set_members(&mut self, spanner: SpannerId, members: Vec<ComponentId>) {
        let Some(data) = self.spanners.get_mut(spanner) else {
            return;
        };
        let incoming: HashSet<ComponentId> = members.iter().copied().collect();
        let outgoing = std::mem::replace(&mut data.members, members);
        for member in outgoing {
            if !incoming.contains(&member) {
                if let Some(component) = self.components.get_mut(member) {
                    component.spanners.remove(&spanner);
                }
            }
        }
        for member in incoming {
            if let Some(component) = self.components.get_mut(member) {
                component.spanners.insert(spanner);
            }
        }
    }

    /// Installs precomputed memberships, then collects spanners left empty.
    pub(crate) fn apply_member_plan(&mut self, plan: BTreeMap<SpannerId, Vec<ComponentId>>) {
        let touched: Vec<SpannerId> = plan.keys().copied().collect();
        for (spanner, members) in plan {
            self.set_members(spanner, members);
        }
        self.collect_dead_spanners(touched);
    }

    /// Runs `edit` on a copy of the tree and keeps the copy only when every
    /// spanner in `watched` is still thread-contiguous in it.
    ///
    /// Contiguity depends on where the members end up, so it can only be
    /// judged after the links have moved.
    pub(crate) fn commit_if_contiguous<T>(
        &mut self,
        watched: &[SpannerId],
        edit: impl FnOnce(&mut ScoreTree) -> T,
    ) -> Result<T, ScoreError> {
        if watched.is_empty() {
            return Ok(edit(self));
        }
        let mut staged = self.clone();
        let value = edit(&mut staged);
        staged.require_contiguous_spanners(watched)?;
        *self = staged;
        Ok(value)
    }

    fn require_contiguous_spanners(&self, spanners: &[SpannerId]) -> Result<(), ScoreError> {
        for &spanner in spanners {
            let Some(data) = self.spanners.get(spanner) else {
                continue;
            };
            if !self.are_thread_contiguous(&data.members) {
                return Err(ScoreError::ContiguityError(format!(
                    "{} would span discontiguous {:?}",
                    spanner, data.members
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn collect_dead_spanners(&mut self, candidates: impl IntoIterator<Item = SpannerId>) {
        for spanner in candidates {
            if self.spanners.get(spanner).map_or(false, Spanner::is_empty) {
                self.spanners.remove(spanner);
                trace!("collected empty spanner {}", spanner);
            }
        }
    }

    pub(crate) fn sort_by_serial(&self, spanners: &mut Vec<SpannerId>) {
        spanners.sort_by_key(|&s| self.spanners.get(s).map_or(u64::MAX, Spanner::serial));
        spanners.dedup();
    }

    /// Spanners with at least one member in `nodes`, in creation order.
    pub(crate) fn spanners_touching(&self, nodes: &HashSet<ComponentId>) -> Vec<SpannerId> {
        let mut spanners: Vec<SpannerId> = nodes
            .iter()
            .filter_map(|&node| self.components.get(node))
            .flat_map(|component| component.spanners())
            .collect();
        self.sort_by_serial(&mut spanners);
        spanners
    }

    /// Every node of the subtrees rooted at `components`.
    pub(crate) fn subtree_union(&self, components: &[ComponentId]) -> HashSet<ComponentId> {
        components
            .iter()
            .flat_map(|&c| self.descendants(c))
            .collect()
    }
}
