use crate::components::ComponentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a spanner notates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpannerKind {
    Beam,
    Slur,
    PhrasingSlur,
    Tie,
    Glissando,
    Trill,
    TextSpan,
    Crescendo,
    Decrescendo,
}

/// How a spanner shows up on the leaves it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpannerMarks {
    /// One mark on the first leaf and one on the last.
    StartStop {
        start: &'static str,
        stop: &'static str,
    },
    /// The same mark on every leaf except the last.
    EachButLast(&'static str),
}

impl SpannerKind {
    pub fn marks(self) -> SpannerMarks {
        match self {
            SpannerKind::Beam => SpannerMarks::StartStop {
                start: "[",
                stop: "]",
            },
            SpannerKind::Slur => SpannerMarks::StartStop {
                start: "(",
                stop: ")",
            },
            SpannerKind::PhrasingSlur => SpannerMarks::StartStop {
                start: r"\(",
                stop: r"\)",
            },
            SpannerKind::Tie => SpannerMarks::EachButLast("~"),
            SpannerKind::Glissando => SpannerMarks::EachButLast(r"\glissando"),
            SpannerKind::Trill => SpannerMarks::StartStop {
                start: r"\startTrillSpan",
                stop: r"\stopTrillSpan",
            },
            SpannerKind::TextSpan => SpannerMarks::StartStop {
                start: r"\startTextSpan",
                stop: r"\stopTextSpan",
            },
            SpannerKind::Crescendo => SpannerMarks::StartStop {
                start: r"\<",
                stop: r"\!",
            },
            SpannerKind::Decrescendo => SpannerMarks::StartStop {
                start: r"\>",
                stop: r"\!",
            },
        }
    }
}

impl fmt::Display for SpannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpannerKind::Beam => "Beam",
            SpannerKind::Slur => "Slur",
            SpannerKind::PhrasingSlur => "PhrasingSlur",
            SpannerKind::Tie => "Tie",
            SpannerKind::Glissando => "Glissando",
            SpannerKind::Trill => "Trill",
            SpannerKind::TextSpan => "TextSpan",
            SpannerKind::Crescendo => "Crescendo",
            SpannerKind::Decrescendo => "Decrescendo",
        };
        f.write_str(name)
    }
}

/// A LilyPond grob property set for the duration of a spanner.
///
/// Rendered as `\override Grob.property = value` before the spanner's
/// first leaf and `\revert Grob.property` after its last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrobOverride {
    pub grob: String,
    pub property: String,
    pub value: String,
}

impl GrobOverride {
    pub fn new(grob: &str, property: &str, value: &str) -> Self {
        Self {
            grob: grob.to_string(),
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn override_string(&self) -> String {
        format!(r"\override {}.{} = {}", self.grob, self.property, self.value)
    }

    pub fn revert_string(&self) -> String {
        format!(r"\revert {}.{}", self.grob, self.property)
    }
}

/// An ordered, non-owning list of components spanned by one notation object.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanner {
    pub(crate) kind: SpannerKind,
    pub(crate) members: Vec<ComponentId>,
    pub(crate) overrides: Vec<GrobOverride>,
    /// Creation order; formatters emit marks in this order.
    pub(crate) serial: u64,
}

impl Spanner {
    pub fn kind(&self) -> SpannerKind {
        self.kind
    }

    pub fn members(&self) -> &[ComponentId] {
        &self.members
    }

    pub fn overrides(&self) -> &[GrobOverride] {
        &self.overrides
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, component: ComponentId) -> bool {
        self.members.contains(&component)
    }

    pub fn index_of(&self, component: ComponentId) -> Option<usize> {
        self.members.iter().position(|&m| m == component)
    }
}
