pub mod components;
pub mod config;
pub mod container;
pub mod error;
pub mod lilypond;
pub mod mutation;
pub mod navigation;
pub mod parser;
pub mod spanner;
pub mod timing;
pub mod types;
pub mod wellformed;

pub use components::{
    Component, ComponentId, ComponentKind, Container, ContainerKind, ContextType,
    FormatContributions, FormatSlot, Leaf, LeafKind, ScoreTree, SpannerId,
};
pub use config::{FormatOptions, Indent};
pub use error::*;
pub use mutation::{CrossingSpanners, Direction, SpannerGrowth};
pub use navigation::{ContainmentSignature, ContextIdentity, Visitor};
pub use parser::parse_leaves;
pub use spanner::{GrobOverride, Spanner, SpannerKind, SpannerMarks};
pub use types::*;
pub use wellformed::{validate, WellformednessReport};

/// Renders `root` as LilyPond with default options.
/// This is the quickest way to look at a tree.
pub fn format(tree: &ScoreTree, root: ComponentId) -> Result<String, ScoreError> {
    lilypond::to_lilypond(tree, root, &FormatOptions::default())
}

/// Checks `root` for wellformedness, then renders it with `options`.
pub fn format_checked(tree: &ScoreTree, root: ComponentId, options: &FormatOptions) -> Result<String, ScoreError> {
    validate(tree, root)?;
    lilypond::to_lilypond(tree, root, options)
}
