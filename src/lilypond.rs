//! # LilyPond Output Module
//!
//! Renders a score tree as LilyPond source.
//!
//! ## Purpose
//! This is the reference consumer of per-component format slots and of
//! spanner marks. It prints what the tree holds and computes nothing
//! musical.
//!
//! ## Layout
//! - Sequential containers open with `{`, parallel ones with `<<`
//! - Tuplets print as `\times n/d {`
//! - Unnamed contexts print as `\new Voice {`, named ones as
//!   `\context Voice = "name" {`
//! - Each leaf sits on its own line, followed by the marks of every
//!   spanner covering it in spanner creation order
//! - Slot text is printed on its own lines: `before` and `after` outside
//!   the component, `opening` and `closing` just inside it
//! - Grob overrides of a spanner go before its first leaf, reverts after
//!   its last
//!
//! ## Example
//! ```rust
//! use scoretree::{lilypond, FormatOptions, ScoreTree, SpannerKind};
//!
//! let mut tree = ScoreTree::new();
//! let voice = tree.voice(None);
//! let leaves = tree.leaves_from_str("c'8 d'8").unwrap();
//! tree.extend(voice, &leaves).unwrap();
//! tree.attach(SpannerKind::Beam, &leaves).unwrap();
//!
//! let text = lilypond::to_lilypond(&tree, voice, &FormatOptions::default()).unwrap();
//! assert_eq!(text, "\\new Voice {\n\tc'8 [\n\td'8 ]\n}");
//! ```

use crate::components::{ComponentId, ComponentKind, ContainerKind, FormatSlot, Leaf, LeafKind, ScoreTree};
use crate::config::FormatOptions;
use crate::error::ScoreError;
use crate::navigation::Visitor;
use crate::spanner::SpannerMarks;
use crate::types::lilypond_duration;
use std::collections::HashMap;

/// Renders the subtree rooted at `root`.
pub fn to_lilypond(tree: &ScoreTree, root: ComponentId, options: &FormatOptions) -> Result<String, ScoreError> {
    tree.component(root)?;
    let mut formatter = LilyPondFormatter {
        indent_unit: options.indent.unit(),
        depth: 0,
        lines: Vec::new(),
        decorations: leaf_decorations(tree, root)?,
        error: None,
    };
    tree.depth_first_traverse(root, &mut formatter);
    match formatter.error {
        Some(error) => Err(error),
        None => Ok(formatter.lines.join("\n")),
    }
}

/// Renders a complete input file: version header, language, then the tree.
pub fn to_lilypond_file(tree: &ScoreTree, root: ComponentId, options: &FormatOptions) -> Result<String, ScoreError> {
    let body = to_lilypond(tree, root, options)?;
    let mut file = String::new();
    if let Some(version) = &options.version {
        file.push_str(&format!("\\version \"{}\"\n", version));
    }
    file.push_str("\\language \"english\"\n\n");
    file.push_str(&body);
    file.push('\n');
    Ok(file)
}

/// One-line summary such as `{c'8, <<{d'4}, {e'4}>>}`.
pub fn compact_representation(tree: &ScoreTree, id: ComponentId) -> Result<String, ScoreError> {
    match tree.component(id)?.kind() {
        ComponentKind::Leaf(leaf) => leaf_body(leaf),
        ComponentKind::Container(container) => {
            let parts = container
                .children()
                .iter()
                .map(|&child| compact_representation(tree, child))
                .collect::<Result<Vec<_>, _>>()?;
            let (open, close) = if container.is_parallel() { ("<<", ">>") } else { ("{", "}") };
            Ok(format!("{}{}{}", open, parts.join(", "), close))
        }
    }
}

/// Text a leaf's line carries on account of spanners.
#[derive(Debug, Default)]
struct Decoration {
    overrides: Vec<String>,
    marks: Vec<String>,
    reverts: Vec<String>,
}

fn leaf_decorations(tree: &ScoreTree, root: ComponentId) -> Result<HashMap<ComponentId, Decoration>, ScoreError> {
    let mut decorations: HashMap<ComponentId, Decoration> = HashMap::new();
    for spanner in tree.spanners_contained_by(&[root]) {
        let data = tree.spanner(spanner)?;
        let leaves = tree.spanner_leaves(spanner)?;
        let (Some(&first), Some(&last)) = (leaves.first(), leaves.last()) else {
            continue;
        };
        for grob_override in data.overrides() {
            decorations
                .entry(first)
                .or_default()
                .overrides
                .push(grob_override.override_string());
            decorations
                .entry(last)
                .or_default()
                .reverts
                .push(grob_override.revert_string());
        }
        match data.kind().marks() {
            SpannerMarks::StartStop { start, stop } => {
                decorations.entry(first).or_default().marks.push(start.to_string());
                decorations.entry(last).or_default().marks.push(stop.to_string());
            }
            SpannerMarks::EachButLast(mark) => {
                for &leaf in &leaves[..leaves.len() - 1] {
                    decorations.entry(leaf).or_default().marks.push(mark.to_string());
                }
            }
        }
    }
    Ok(decorations)
}

fn leaf_body(leaf: &Leaf) -> Result<String, ScoreError> {
    let written = lilypond_duration(leaf.written_duration)?;
    let mut body = match &leaf.kind {
        LeafKind::Note(pitch) => format!("{}{}", pitch, written),
        LeafKind::Chord(pitches) => {
            let pitches: Vec<String> = pitches.iter().map(ToString::to_string).collect();
            format!("<{}>{}", pitches.join(" "), written)
        }
        LeafKind::Rest => format!("r{}", written),
        LeafKind::Skip => format!("s{}", written),
    };
    if let Some(multiplier) = leaf.multiplier {
        body.push_str(&format!(" * {}", multiplier));
    }
    Ok(body)
}

fn open_bracket(kind: &ContainerKind, is_parallel: bool) -> String {
    let bracket = if is_parallel { "<<" } else { "{" };
    match kind {
        ContainerKind::Plain => bracket.to_string(),
        ContainerKind::Tuplet { multiplier } => format!(
            "\\times {}/{} {}",
            multiplier.numer(),
            multiplier.denom(),
            bracket
        ),
        ContainerKind::Context {
            context,
            name: Some(name),
        } => format!(
            "\\context {} = \"{}\" {}",
            context.lilypond_name(),
            name,
            bracket
        ),
        ContainerKind::Context { context, name: None } => {
            format!("\\new {} {}", context.lilypond_name(), bracket)
        }
    }
}

struct LilyPondFormatter {
    indent_unit: String,
    depth: usize,
    lines: Vec<String>,
    decorations: HashMap<ComponentId, Decoration>,
    error: Option<ScoreError>,
}

impl LilyPondFormatter {
    fn line(&mut self, text: &str) {
        self.lines
            .push(format!("{}{}", self.indent_unit.repeat(self.depth), text));
    }

    fn slot(&mut self, tree: &ScoreTree, id: ComponentId, slot: FormatSlot) {
        let texts: Vec<String> = match tree.format_contributions(id) {
            Ok(format) => format.get(slot).to_vec(),
            Err(_) => Vec::new(),
        };
        for text in texts {
            self.line(&text);
        }
    }

    fn format_leaf(&mut self, tree: &ScoreTree, id: ComponentId, leaf: &Leaf) {
        let body = match leaf_body(leaf) {
            Ok(body) => body,
            Err(error) => {
                if self.error.is_none() {
                    self.error = Some(error);
                }
                return;
            }
        };
        let decoration = self.decorations.remove(&id).unwrap_or_default();

        self.slot(tree, id, FormatSlot::Before);
        for text in &decoration.overrides {
            self.line(text);
        }
        self.slot(tree, id, FormatSlot::Opening);
        let mut text = body;
        for mark in &decoration.marks {
            text.push(' ');
            text.push_str(mark);
        }
        self.line(&text);
        self.slot(tree, id, FormatSlot::Closing);
        for text in &decoration.reverts {
            self.line(text);
        }
        self.slot(tree, id, FormatSlot::After);
    }
}

impl Visitor for LilyPondFormatter {
    fn visit(&mut self, tree: &ScoreTree, component: ComponentId) {
        let Ok(node) = tree.component(component) else {
            return;
        };
        match node.kind() {
            ComponentKind::Leaf(leaf) => self.format_leaf(tree, component, leaf),
            ComponentKind::Container(container) => {
                self.slot(tree, component, FormatSlot::Before);
                self.line(&open_bracket(container.kind(), container.is_parallel()));
                self.depth += 1;
                self.slot(tree, component, FormatSlot::Opening);
            }
        }
    }

    fn unvisit(&mut self, tree: &ScoreTree, component: ComponentId) {
        let Some(container) = tree.as_container(component) else {
            return;
        };
        self.slot(tree, component, FormatSlot::Closing);
        self.depth = self.depth.saturating_sub(1);
        self.line(if container.is_parallel() { ">>" } else { "}" });
        self.slot(tree, component, FormatSlot::After);
    }
}
