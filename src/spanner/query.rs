//! Spanner classification relative to components and runs.
//!
//! A spanner *dominates* a component when it has it as a direct member.
//! Relative to the subtrees of a list of components, a spanner is
//! *contained* when at least one member lies inside, *covered* when every
//! member does, and *crossing* when it is contained but not covered.
//! Nothing here is cached: every mutation asks afresh.

use super::SpannerKind;
use crate::components::{ComponentId, ScoreTree, SpannerId};
use crate::error::ScoreError;
use std::collections::HashSet;

impl ScoreTree {
    /// Spanners attached directly to any of `components`.
    pub fn spanners_attached_to(&self, components: &[ComponentId]) -> Vec<SpannerId> {
        let nodes: HashSet<ComponentId> = components.iter().copied().collect();
        self.spanners_touching(&nodes)
    }

    /// Spanners attached to `component` or to any of its ancestors.
    pub fn spanners_attached_to_improper_parentage(&self, component: ComponentId) -> Vec<SpannerId> {
        self.spanners_attached_to(&self.parentage(component, true))
    }

    /// Spanners with at least one member inside the subtrees of `components`.
    pub fn spanners_contained_by(&self, components: &[ComponentId]) -> Vec<SpannerId> {
        self.spanners_touching(&self.subtree_union(components))
    }

    /// Spanners whose every member lies inside the subtrees of `components`.
    pub fn spanners_covered_by(&self, components: &[ComponentId]) -> Vec<SpannerId> {
        let inside = self.subtree_union(components);
        self.spanners_touching(&inside)
            .into_iter()
            .filter(|&s| self.members_within(s, &inside))
            .collect()
    }

    /// Spanners with members both inside and outside the subtrees of `components`.
    pub fn spanners_crossing(&self, components: &[ComponentId]) -> Vec<SpannerId> {
        let inside = self.subtree_union(components);
        self.crossing_within(&inside)
    }

    pub(crate) fn crossing_within(&self, inside: &HashSet<ComponentId>) -> Vec<SpannerId> {
        self.spanners_touching(inside)
            .into_iter()
            .filter(|&s| !self.members_within(s, inside))
            .collect()
    }

    fn members_within(&self, spanner: SpannerId, inside: &HashSet<ComponentId>) -> bool {
        self.spanners
            .get(spanner)
            .map_or(false, |s| s.members.iter().all(|m| inside.contains(m)))
    }

    /// Spanners having any of `components` as a direct member, each paired
    /// with the smallest member index among those components.
    pub fn spanners_dominating(&self, components: &[ComponentId]) -> Vec<(SpannerId, usize)> {
        let wanted: HashSet<ComponentId> = components.iter().copied().collect();
        self.spanners_attached_to(components)
            .into_iter()
            .filter_map(|s| {
                let spanner = self.spanners.get(s)?;
                let index = spanner.members.iter().position(|m| wanted.contains(m))?;
                Some((s, index))
            })
            .collect()
    }

    /// Spanners governing the children `start..stop` of `container`.
    ///
    /// For an empty run strictly inside the container (an insertion gap)
    /// these are the spanners holding both neighbours, paired with the
    /// index of the right-hand neighbour. An empty run at either end is
    /// dominated by nothing, so appending never grows a spanner.
    pub fn spanners_dominating_run(
        &self,
        container: ComponentId,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(SpannerId, usize)>, ScoreError> {
        let children = &self.container_ref(container)?.children;
        if stop > children.len() {
            return Err(ScoreError::IndexOutOfRange {
                index: stop,
                len: children.len(),
            });
        }
        if start > stop {
            return Err(ScoreError::StructuralError(format!(
                "run start {} is past its stop {}",
                start, stop
            )));
        }
        if start < stop {
            return Ok(self.spanners_dominating(&children[start..stop]));
        }
        if start == 0 || start == children.len() {
            return Ok(Vec::new());
        }
        let (before, after) = (children[start - 1], children[start]);
        Ok(self
            .spanners_attached_to(&[before])
            .into_iter()
            .filter_map(|s| {
                let spanner = self.spanners.get(s)?;
                spanner.index_of(before)?;
                let index = spanner.index_of(after)?;
                Some((s, index))
            })
            .collect())
    }

    /// The single spanner attached directly to `component`, optionally of one kind.
    pub fn the_only_spanner_attached_to(
        &self,
        component: ComponentId,
        kind: Option<SpannerKind>,
    ) -> Result<SpannerId, ScoreError> {
        self.component(component)?;
        let found = self.spanners_attached_to(&[component]);
        self.exactly_one(found, kind, component)
    }

    /// The single spanner attached to `component` or any of its ancestors.
    pub fn the_only_spanner_on_improper_parentage(
        &self,
        component: ComponentId,
        kind: Option<SpannerKind>,
    ) -> Result<SpannerId, ScoreError> {
        self.component(component)?;
        let found = self.spanners_attached_to_improper_parentage(component);
        self.exactly_one(found, kind, component)
    }

    fn exactly_one(
        &self,
        found: Vec<SpannerId>,
        kind: Option<SpannerKind>,
        component: ComponentId,
    ) -> Result<SpannerId, ScoreError> {
        let matching: Vec<SpannerId> = found
            .into_iter()
            .filter(|&s| match kind {
                Some(kind) => self.spanners.get(s).map_or(false, |sp| sp.kind == kind),
                None => true,
            })
            .collect();
        let what = kind.map_or_else(|| "spanner".to_string(), |k| k.to_string());
        match matching.as_slice() {
            [only] => Ok(*only),
            [] => Err(ScoreError::MissingRelationError(format!(
                "no {} attached to {}",
                what, component
            ))),
            many => Err(ScoreError::AmbiguousRelationError(format!(
                "{} {} spanners attached to {}",
                many.len(),
                what,
                component
            ))),
        }
    }
}
