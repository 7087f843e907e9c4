//! # Score Components
//!
//! This module defines the nodes of a score tree and the [`ScoreTree`]
//! aggregate that owns them.
//!
//! ## Purpose
//! A score is a tree of components. Leaves (notes, chords, rests, skips)
//! carry durations; containers hold an ordered list of children and are
//! either sequential (children follow one another in time) or parallel
//! (children sound together).
//!
//! Components never own each other directly. The tree owns every component
//! in a generational arena and nodes refer to each other through
//! [`ComponentId`] handles:
//! - `Container::children` is the owning edge of the tree
//! - `Component::parent` is a back reference that always agrees with it
//! - `Component::spanners` mirrors the membership lists of the spanners
//!   that claim the component (the per-component spanner aggregator)
//!
//! ## Component Lifecycle
//! A component is created as an orphan, becomes parented when inserted into
//! a container, and becomes an orphan again when removed. Orphans stay in
//! the arena until [`ScoreTree::discard`] frees them.
//!
//! ## Related Modules
//! - `navigation` - read-only traversal over the tree
//! - `container` - the mutation protocol that edits children lists
//! - `spanner` - cross-cutting spanners and their membership

mod arena;
mod tree;

pub(crate) use arena::Arena;
pub use arena::{ComponentId, SpannerId};
pub use tree::ScoreTree;

use crate::types::{Duration, Multiplier, Pitch};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Named extension points where collaborators attach literal format text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatSlot {
    Before,
    Opening,
    Closing,
    After,
}

impl FormatSlot {
    /// Slots in the order a formatter emits them.
    pub const ORDER: [FormatSlot; 4] = [
        FormatSlot::Before,
        FormatSlot::Opening,
        FormatSlot::Closing,
        FormatSlot::After,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormatSlot::Before => "before",
            FormatSlot::Opening => "opening",
            FormatSlot::Closing => "closing",
            FormatSlot::After => "after",
        }
    }
}

/// Literal text contributed to each format slot of one component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatContributions {
    slots: BTreeMap<FormatSlot, Vec<String>>,
}

impl FormatContributions {
    /// Contributions for `slot`, in the order they were added.
    pub fn get(&self, slot: FormatSlot) -> &[String] {
        self.slots.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.slots.values().all(Vec::is_empty)
    }

    pub(crate) fn push(&mut self, slot: FormatSlot, text: String) {
        self.slots.entry(slot).or_default().push(text);
    }
}

/// Kinds of notation context a container can stand for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextType {
    Voice,
    Staff,
    StaffGroup,
    Score,
}

impl ContextType {
    pub fn lilypond_name(self) -> &'static str {
        match self {
            ContextType::Voice => "Voice",
            ContextType::Staff => "Staff",
            ContextType::StaffGroup => "StaffGroup",
            ContextType::Score => "Score",
        }
    }

    /// Score and StaffGroup hold simultaneous staves.
    pub fn is_parallel_by_default(self) -> bool {
        matches!(self, ContextType::StaffGroup | ContextType::Score)
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lilypond_name())
    }
}

/// What a container represents beyond its list of children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    Plain,
    /// Scales the durations of its contents by `multiplier`.
    Tuplet { multiplier: Multiplier },
    /// A notation context; named contexts are matched by name across the tree.
    Context {
        context: ContextType,
        name: Option<String>,
    },
}

impl ContainerKind {
    pub fn context(&self) -> Option<ContextType> {
        match self {
            ContainerKind::Context { context, .. } => Some(*context),
            _ => None,
        }
    }

    pub fn is_context(&self) -> bool {
        self.context().is_some()
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ContainerKind::Context { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    pub fn tuplet_multiplier(&self) -> Option<Multiplier> {
        match self {
            ContainerKind::Tuplet { multiplier } => Some(*multiplier),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafKind {
    Note(Pitch),
    /// Pitches are kept sorted from low to high.
    Chord(Vec<Pitch>),
    Rest,
    Skip,
}

/// A terminal component.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub kind: LeafKind,
    pub written_duration: Duration,
    pub multiplier: Option<Multiplier>,
}

/// A component holding an ordered list of children.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub(crate) children: Vec<ComponentId>,
    pub(crate) is_parallel: bool,
    pub(crate) kind: ContainerKind,
}

impl Container {
    pub(crate) fn new(kind: ContainerKind, is_parallel: bool) -> Self {
        Self {
            children: Vec::new(),
            is_parallel,
            kind,
        }
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn is_parallel(&self) -> bool {
        self.is_parallel
    }

    pub fn kind(&self) -> &ContainerKind {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    Leaf(Leaf),
    Container(Container),
}

/// A node of the score tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub(crate) parent: Option<ComponentId>,
    pub(crate) spanners: BTreeSet<SpannerId>,
    pub(crate) kind: ComponentKind,
    pub(crate) format: FormatContributions,
}

impl Component {
    pub(crate) fn new(kind: ComponentKind) -> Self {
        Self {
            parent: None,
            spanners: BTreeSet::new(),
            kind,
            format: FormatContributions::default(),
        }
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Spanners currently claiming this component, in handle order.
    pub fn spanners(&self) -> impl Iterator<Item = SpannerId> + '_ {
        self.spanners.iter().copied()
    }

    pub fn format(&self) -> &FormatContributions {
        &self.format
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            ComponentKind::Leaf(leaf) => Some(leaf),
            ComponentKind::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match &self.kind {
            ComponentKind::Container(container) => Some(container),
            ComponentKind::Leaf(_) => None,
        }
    }

    pub(crate) fn as_container_mut(&mut self) -> Option<&mut Container> {
        match &mut self.kind {
            ComponentKind::Container(container) => Some(container),
            ComponentKind::Leaf(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ComponentKind::Leaf(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, ComponentKind::Container(_))
    }

    /// Child handles; empty for leaves.
    pub fn children(&self) -> &[ComponentId] {
        self.as_container().map(Container::children).unwrap_or(&[])
    }
}
