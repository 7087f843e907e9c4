use super::{
    Arena, Component, ComponentId, ComponentKind, Container, ContainerKind, ContextType,
    FormatContributions, FormatSlot, Leaf, LeafKind, SpannerId,
};
use crate::error::ScoreError;
use crate::spanner::{Spanner, SpannerKind};
use crate::types::{lilypond_duration, Duration, Multiplier, Pitch};
use log::trace;
use num_traits::Zero;
use std::collections::{BTreeMap, HashSet};

/// Owner of every component and spanner of one or more score trees.
///
/// A `ScoreTree` can hold any number of root components at once: freshly
/// built leaves are orphans (roots of their own one-node tree) until they
/// are inserted into a container.
///
/// # Example
/// ```
/// use scoretree::{duration, Pitch, ScoreTree};
///
/// let mut tree = ScoreTree::new();
/// let voice = tree.voice(Some("melody"));
/// let note = tree.note(Pitch::default(), duration(1, 4)).unwrap();
/// tree.append(voice, note).unwrap();
///
/// assert_eq!(tree.parent(note), Some(voice));
/// assert_eq!(tree.children(voice), &[note]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScoreTree {
    pub(crate) components: Arena<ComponentId, Component>,
    pub(crate) spanners: Arena<SpannerId, Spanner>,
    next_serial: u64,
}

impl ScoreTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Handles
    // ---------------------------------------------------------------------

    pub fn component(&self, id: ComponentId) -> Result<&Component, ScoreError> {
        self.components
            .get(id)
            .ok_or_else(|| ScoreError::StaleHandle(format!("component {}", id)))
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component, ScoreError> {
        self.components
            .get_mut(id)
            .ok_or_else(|| ScoreError::StaleHandle(format!("component {}", id)))
    }

    pub fn is_live(&self, id: ComponentId) -> bool {
        self.components.contains(id)
    }

    /// Number of live components, parented or not.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of live spanners.
    pub fn spanner_count(&self) -> usize {
        self.spanners.len()
    }

    pub(crate) fn container_ref(&self, id: ComponentId) -> Result<&Container, ScoreError> {
        self.component(id)?
            .as_container()
            .ok_or_else(|| ScoreError::StructuralError(format!("{} is a leaf, not a container", id)))
    }

    pub(crate) fn require_live(&self, ids: &[ComponentId]) -> Result<(), ScoreError> {
        for &id in ids {
            self.component(id)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    pub(crate) fn alloc(&mut self, kind: ComponentKind) -> ComponentId {
        let id = self.components.insert(Component::new(kind));
        trace!("allocated component {}", id);
        id
    }

    /// Creates an orphan leaf. The written duration must be assignable.
    pub fn leaf(&mut self, kind: LeafKind, written_duration: Duration) -> Result<ComponentId, ScoreError> {
        lilypond_duration(written_duration)?;
        let kind = match kind {
            LeafKind::Chord(mut pitches) => {
                if pitches.is_empty() {
                    return Err(ScoreError::StructuralError(
                        "chord needs at least one pitch".to_string(),
                    ));
                }
                pitches.sort();
                pitches.dedup();
                LeafKind::Chord(pitches)
            }
            other => other,
        };
        Ok(self.alloc(ComponentKind::Leaf(Leaf {
            kind,
            written_duration,
            multiplier: None,
        })))
    }

    pub fn note(&mut self, pitch: Pitch, written_duration: Duration) -> Result<ComponentId, ScoreError> {
        self.leaf(LeafKind::Note(pitch), written_duration)
    }

    pub fn chord(&mut self, pitches: &[Pitch], written_duration: Duration) -> Result<ComponentId, ScoreError> {
        self.leaf(LeafKind::Chord(pitches.to_vec()), written_duration)
    }

    pub fn rest(&mut self, written_duration: Duration) -> Result<ComponentId, ScoreError> {
        self.leaf(LeafKind::Rest, written_duration)
    }

    pub fn skip(&mut self, written_duration: Duration) -> Result<ComponentId, ScoreError> {
        self.leaf(LeafKind::Skip, written_duration)
    }

    /// Creates an empty sequential container.
    pub fn container(&mut self) -> ComponentId {
        self.alloc(ComponentKind::Container(Container::new(ContainerKind::Plain, false)))
    }

    /// Creates an empty tuplet; `multiplier` must be positive.
    pub fn tuplet(&mut self, multiplier: Multiplier) -> Result<ComponentId, ScoreError> {
        if multiplier <= Multiplier::zero() {
            return Err(ScoreError::DurationError(format!(
                "tuplet multiplier must be positive, got {}",
                multiplier
            )));
        }
        Ok(self.alloc(ComponentKind::Container(Container::new(
            ContainerKind::Tuplet { multiplier },
            false,
        ))))
    }

    /// Creates an empty context container. Score and StaffGroup contexts start parallel.
    pub fn context(&mut self, context: ContextType, name: Option<&str>) -> ComponentId {
        let kind = ContainerKind::Context {
            context,
            name: name.map(str::to_string),
        };
        self.alloc(ComponentKind::Container(Container::new(
            kind,
            context.is_parallel_by_default(),
        )))
    }

    pub fn voice(&mut self, name: Option<&str>) -> ComponentId {
        self.context(ContextType::Voice, name)
    }

    pub fn staff(&mut self, name: Option<&str>) -> ComponentId {
        self.context(ContextType::Staff, name)
    }

    pub fn staff_group(&mut self, name: Option<&str>) -> ComponentId {
        self.context(ContextType::StaffGroup, name)
    }

    pub fn score(&mut self, name: Option<&str>) -> ComponentId {
        self.context(ContextType::Score, name)
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Parent of `id`, or `None` for orphans and stale handles.
    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.components.get(id).and_then(|c| c.parent)
    }

    /// Children of `id`; empty for leaves and stale handles.
    pub fn children(&self, id: ComponentId) -> &[ComponentId] {
        self.components
            .get(id)
            .map(Component::children)
            .unwrap_or(&[])
    }

    pub fn len(&self, id: ComponentId) -> usize {
        self.children(id).len()
    }

    pub fn is_leaf(&self, id: ComponentId) -> bool {
        self.components.get(id).map_or(false, Component::is_leaf)
    }

    pub fn is_container(&self, id: ComponentId) -> bool {
        self.components.get(id).map_or(false, Component::is_container)
    }

    pub fn is_parallel(&self, id: ComponentId) -> bool {
        self.components
            .get(id)
            .and_then(Component::as_container)
            .map_or(false, Container::is_parallel)
    }

    pub fn container_kind(&self, id: ComponentId) -> Option<&ContainerKind> {
        self.components
            .get(id)
            .and_then(Component::as_container)
            .map(Container::kind)
    }

    pub fn as_leaf(&self, id: ComponentId) -> Option<&Leaf> {
        self.components.get(id).and_then(Component::as_leaf)
    }

    pub fn as_container(&self, id: ComponentId) -> Option<&Container> {
        self.components.get(id).and_then(Component::as_container)
    }

    /// Switches a container between sequential and parallel.
    ///
    /// A parallel container may only hold context containers.
    pub fn set_parallel(&mut self, id: ComponentId, is_parallel: bool) -> Result<(), ScoreError> {
        let container = self.container_ref(id)?;
        if is_parallel {
            if let Some(&bad) = container
                .children
                .iter()
                .find(|&&child| !self.is_context(child))
            {
                return Err(ScoreError::StructuralError(format!(
                    "parallel container {} cannot hold non-context {}",
                    id, bad
                )));
            }
        }
        if let Some(container) = self.component_mut(id)?.as_container_mut() {
            container.is_parallel = is_parallel;
        }
        Ok(())
    }

    pub(crate) fn is_context(&self, id: ComponentId) -> bool {
        self.container_kind(id).map_or(false, ContainerKind::is_context)
    }

    fn leaf_mut(&mut self, id: ComponentId) -> Result<&mut Leaf, ScoreError> {
        match &mut self.component_mut(id)?.kind {
            ComponentKind::Leaf(leaf) => Ok(leaf),
            ComponentKind::Container(_) => Err(ScoreError::StructuralError(format!(
                "{} is a container, not a leaf",
                id
            ))),
        }
    }

    pub fn set_written_duration(&mut self, id: ComponentId, written_duration: Duration) -> Result<(), ScoreError> {
        lilypond_duration(written_duration)?;
        self.leaf_mut(id)?.written_duration = written_duration;
        Ok(())
    }

    pub fn set_multiplier(&mut self, id: ComponentId, multiplier: Option<Multiplier>) -> Result<(), ScoreError> {
        if let Some(m) = multiplier {
            if m <= Multiplier::zero() {
                return Err(ScoreError::DurationError(format!(
                    "leaf multiplier must be positive, got {}",
                    m
                )));
            }
        }
        self.leaf_mut(id)?.multiplier = multiplier;
        Ok(())
    }

    pub fn add_format_contribution(&mut self, id: ComponentId, slot: FormatSlot, text: &str) -> Result<(), ScoreError> {
        self.component_mut(id)?.format.push(slot, text.to_string());
        Ok(())
    }

    pub fn format_contributions(&self, id: ComponentId) -> Result<&FormatContributions, ScoreError> {
        Ok(&self.component(id)?.format)
    }

    // ---------------------------------------------------------------------
    // Spanner aggregator
    // ---------------------------------------------------------------------

    /// Spanners attached directly to `id`, in creation order.
    pub fn spanners_of(&self, id: ComponentId) -> Vec<SpannerId> {
        let mut spanners: Vec<SpannerId> = self
            .components
            .get(id)
            .map(|c| c.spanners().collect())
            .unwrap_or_default();
        self.sort_by_serial(&mut spanners);
        spanners
    }

    /// Destroys every spanner attached directly to `id`.
    pub fn clear_spanners(&mut self, id: ComponentId) -> Result<(), ScoreError> {
        let spanners: Vec<SpannerId> = self.component(id)?.spanners().collect();
        for spanner in spanners {
            self.destroy(spanner)?;
        }
        Ok(())
    }

    /// Destroys the spanners of `kind` attached directly to `id`, returning how many went.
    pub fn destroy_spanners_of_kind(&mut self, id: ComponentId, kind: SpannerKind) -> Result<usize, ScoreError> {
        let doomed: Vec<SpannerId> = self
            .component(id)?
            .spanners()
            .filter(|&s| self.spanners.get(s).map_or(false, |sp| sp.kind == kind))
            .collect();
        for &spanner in &doomed {
            self.destroy(spanner)?;
        }
        Ok(doomed.len())
    }

    pub(crate) fn next_serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    // ---------------------------------------------------------------------
    // Freeing
    // ---------------------------------------------------------------------

    /// Frees an orphan and its whole subtree, withdrawing it from every spanner.
    ///
    /// Handles into the subtree go stale.
    pub fn discard(&mut self, id: ComponentId) -> Result<(), ScoreError> {
        if self.component(id)?.parent.is_some() {
            return Err(ScoreError::StructuralError(format!(
                "cannot discard {} while it is parented; delete it first",
                id
            )));
        }
        let subtree = self.descendants(id);
        let doomed: HashSet<ComponentId> = subtree.iter().copied().collect();
        let mut plan = BTreeMap::new();
        for spanner in self.spanners_touching(&doomed) {
            let members = self.spanner_members_unchecked(spanner);
            plan.insert(
                spanner,
                members.into_iter().filter(|m| !doomed.contains(m)).collect(),
            );
        }
        self.apply_member_plan(plan);
        for node in subtree {
            self.components.remove(node);
            trace!("freed component {}", node);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Structural edits used by the apply phase of mutations
    // ---------------------------------------------------------------------

    /// Detaches `child` from its parent, if any.
    pub(crate) fn unlink(&mut self, child: ComponentId) {
        let parent = match self.components.get_mut(child) {
            Some(component) => component.parent.take(),
            None => None,
        };
        if let Some(parent) = parent {
            if let Some(container) = self
                .components
                .get_mut(parent)
                .and_then(Component::as_container_mut)
            {
                container.children.retain(|&c| c != child);
            }
        }
    }

    /// Inserts orphan `children` into `parent` starting at `index`.
    pub(crate) fn link(&mut self, parent: ComponentId, index: usize, children: &[ComponentId]) {
        if let Some(container) = self
            .components
            .get_mut(parent)
            .and_then(Component::as_container_mut)
        {
            let index = index.min(container.children.len());
            container
                .children
                .splice(index..index, children.iter().copied());
        }
        for &child in children {
            if let Some(component) = self.components.get_mut(child) {
                component.parent = Some(parent);
            }
        }
    }

    /// Allocates a container shell with the same kind, mode and format text as `model`.
    pub(crate) fn alloc_like(&mut self, model: ComponentId) -> Result<ComponentId, ScoreError> {
        let source = self.component(model)?;
        let container = source.as_container().ok_or_else(|| {
            ScoreError::StructuralError(format!("{} is a leaf, not a container", model))
        })?;
        let shell = Container::new(container.kind.clone(), container.is_parallel);
        let format = source.format.clone();
        let id = self.alloc(ComponentKind::Container(shell));
        if let Some(component) = self.components.get_mut(id) {
            component.format = format;
        }
        Ok(id)
    }

    /// Allocates a parentless, spannerless copy of one node (children not copied).
    pub(crate) fn alloc_node_copy(&mut self, model: ComponentId) -> Result<ComponentId, ScoreError> {
        let source = self.component(model)?;
        let kind = match &source.kind {
            ComponentKind::Leaf(leaf) => ComponentKind::Leaf(leaf.clone()),
            ComponentKind::Container(container) => ComponentKind::Container(Container::new(
                container.kind.clone(),
                container.is_parallel,
            )),
        };
        let format = source.format.clone();
        let id = self.alloc(kind);
        if let Some(component) = self.components.get_mut(id) {
            component.format = format;
        }
        Ok(id)
    }
}
