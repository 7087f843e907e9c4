//! # Leaf Parser
//!
//! Parses whitespace-separated LilyPond leaf tokens into leaves.
//!
//! ## Syntax
//! - Notes: `c'8`, `fs''4.`, `bf,2`, `c'\breve`
//! - Chords: `<c' e' g'>4`
//! - Rests and skips: `r4`, `s8.`
//! - Optional multiplier: `c'4*1/2`
//!
//! Accidentals are English suffixes (`s`, `ss`, `f`, `ff`); octave marks
//! follow LilyPond's absolute mode where `c` is the octave below middle C.
//!
//! ## Example
//! ```rust
//! use scoretree::ScoreTree;
//!
//! let mut tree = ScoreTree::new();
//! let leaves = tree.leaves_from_str("c'8 <c' e'>4 r4 s8").unwrap();
//! assert_eq!(leaves.len(), 4);
//! ```

use crate::components::{ComponentId, Leaf, LeafKind, ScoreTree};
use crate::error::ScoreError;
use crate::types::{lilypond_duration, Accidental, Duration, Multiplier, NoteName, Pitch};
use num_rational::Ratio;
use std::iter::Peekable;
use std::str::Chars;

/// Parses every leaf token in `input`.
pub fn parse_leaves(input: &str) -> Result<Vec<Leaf>, ScoreError> {
    LeafParser::new(input).parse()
}

struct LeafParser<'a> {
    chars: Peekable<Chars<'a>>,
    column: usize,
}

impl<'a> LeafParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            column: 1,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.column += 1;
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn error(&self, message: impl Into<String>) -> ScoreError {
        ScoreError::ParseError {
            column: self.column,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn parse(mut self) -> Result<Vec<Leaf>, ScoreError> {
        let mut leaves = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                break;
            };
            let kind = match c {
                'r' => {
                    self.advance();
                    LeafKind::Rest
                }
                's' => {
                    self.advance();
                    LeafKind::Skip
                }
                '<' => {
                    self.advance();
                    LeafKind::Chord(self.parse_chord_pitches()?)
                }
                _ => LeafKind::Note(self.parse_pitch()?),
            };
            let written_duration = self.parse_duration()?;
            let multiplier = self.parse_multiplier()?;
            if let Some(c) = self.peek() {
                if !c.is_whitespace() {
                    return Err(self.error(format!("unexpected '{}' after leaf", c)));
                }
            }
            leaves.push(Leaf {
                kind,
                written_duration,
                multiplier,
            });
        }
        Ok(leaves)
    }

    fn parse_chord_pitches(&mut self) -> Result<Vec<Pitch>, ScoreError> {
        let mut pitches = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.advance();
                    break;
                }
                Some(_) => pitches.push(self.parse_pitch()?),
                None => return Err(self.error("unterminated chord")),
            }
        }
        if pitches.is_empty() {
            return Err(self.error("empty chord"));
        }
        Ok(pitches)
    }

    fn parse_pitch(&mut self) -> Result<Pitch, ScoreError> {
        let name = match self.peek().and_then(NoteName::from_char) {
            Some(name) => name,
            None => {
                let found = self.peek().map_or("end of input".to_string(), |c| format!("'{}'", c));
                return Err(self.error(format!("expected a note name, found {}", found)));
            }
        };
        self.advance();

        let mut suffix = String::new();
        while let Some(c @ ('s' | 'f')) = self.peek() {
            if suffix.len() == 2 || suffix.chars().any(|s| s != c) {
                break;
            }
            suffix.push(c);
            self.advance();
        }
        let accidental = Accidental::from_suffix(&suffix)
            .ok_or_else(|| self.error(format!("unknown accidental '{}'", suffix)))?;

        let mut octave: i8 = 3;
        loop {
            match self.peek() {
                Some('\'') => octave += 1,
                Some(',') => octave -= 1,
                _ => break,
            }
            self.advance();
        }
        Ok(Pitch::new(name, accidental, octave))
    }

    fn parse_duration(&mut self) -> Result<Duration, ScoreError> {
        let base = if self.peek() == Some('\\') {
            let word: String = std::iter::from_fn(|| {
                let c = self.peek()?;
                if c == '\\' || c.is_ascii_alphabetic() {
                    self.advance();
                    Some(c)
                } else {
                    None
                }
            })
            .collect();
            if word != r"\breve" {
                return Err(self.error(format!("unknown duration '{}'", word)));
            }
            Ratio::from_integer(2)
        } else {
            let denominator = self.parse_integer("duration")?;
            if denominator == 0 {
                return Err(self.error("duration denominator cannot be zero"));
            }
            Ratio::new(1, denominator)
        };

        let mut written = base;
        let mut dot_value = base;
        while self.peek() == Some('.') {
            self.advance();
            dot_value /= 2;
            written += dot_value;
        }
        lilypond_duration(written).map_err(|e| self.error(e.to_string()))?;
        Ok(written)
    }

    fn parse_multiplier(&mut self) -> Result<Option<Multiplier>, ScoreError> {
        if self.peek() != Some('*') {
            return Ok(None);
        }
        self.advance();
        let numerator = self.parse_integer("multiplier")?;
        let denominator = if self.peek() == Some('/') {
            self.advance();
            self.parse_integer("multiplier denominator")?
        } else {
            1
        };
        if numerator == 0 || denominator == 0 {
            return Err(self.error("multiplier must be positive"));
        }
        Ok(Some(Ratio::new(numerator, denominator)))
    }

    fn parse_integer(&mut self, what: &str) -> Result<i64, ScoreError> {
        let mut digits = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.advance();
        }
        if digits.is_empty() {
            return Err(self.error(format!("expected {}", what)));
        }
        digits
            .parse()
            .map_err(|_| self.error(format!("{} '{}' is too large", what, digits)))
    }
}

impl ScoreTree {
    /// Creates one orphan leaf per token of `input`.
    ///
    /// Nothing is created unless every token parses.
    pub fn leaves_from_str(&mut self, input: &str) -> Result<Vec<ComponentId>, ScoreError> {
        let parsed = parse_leaves(input)?;
        let mut leaves = Vec::with_capacity(parsed.len());
        for leaf in parsed {
            let id = self.leaf(leaf.kind, leaf.written_duration)?;
            if leaf.multiplier.is_some() {
                self.set_multiplier(id, leaf.multiplier)?;
            }
            leaves.push(id);
        }
        Ok(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::duration;

    #[test]
    fn test_parse_notes() {
        let leaves = parse_leaves("c'8 fs''4. bf,2 e\\breve").unwrap();
        assert_eq!(leaves.len(), 4);
        assert_eq!(leaves[0].kind, LeafKind::Note(Pitch::default()));
        assert_eq!(leaves[0].written_duration, duration(1, 8));
        assert_eq!(
            leaves[1].kind,
            LeafKind::Note(Pitch::new(NoteName::F, Accidental::Sharp, 5))
        );
        assert_eq!(leaves[1].written_duration, duration(3, 8));
        assert_eq!(
            leaves[2].kind,
            LeafKind::Note(Pitch::new(NoteName::B, Accidental::Flat, 2))
        );
        assert_eq!(leaves[3].written_duration, duration(2, 1));
    }

    #[test]
    fn test_parse_chords_rests_and_skips() {
        let leaves = parse_leaves("<c' e' g'>4 r8 s16..").unwrap();
        match &leaves[0].kind {
            LeafKind::Chord(pitches) => assert_eq!(pitches.len(), 3),
            other => panic!("expected chord, got {:?}", other),
        }
        assert_eq!(leaves[1].kind, LeafKind::Rest);
        assert_eq!(leaves[2].kind, LeafKind::Skip);
        assert_eq!(leaves[2].written_duration, duration(7, 64));
    }

    #[test]
    fn test_parse_multiplier() {
        let leaves = parse_leaves("c'4*1/2 r1*3").unwrap();
        assert_eq!(leaves[0].multiplier, Some(duration(1, 2)));
        assert_eq!(leaves[1].multiplier, Some(duration(3, 1)));
    }

    #[test]
    fn test_parse_double_accidentals() {
        let leaves = parse_leaves("css'4 eff4").unwrap();
        assert_eq!(
            leaves[0].kind,
            LeafKind::Note(Pitch::new(NoteName::C, Accidental::DoubleSharp, 4))
        );
        assert_eq!(
            leaves[1].kind,
            LeafKind::Note(Pitch::new(NoteName::E, Accidental::DoubleFlat, 3))
        );
    }

    #[test]
    fn test_parse_errors_report_columns() {
        match parse_leaves("c'4 x4") {
            Err(ScoreError::ParseError { column, .. }) => assert_eq!(column, 5),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(parse_leaves("c'3").is_err());
        assert!(parse_leaves("c'").is_err());
        assert!(parse_leaves("<c' e'4").is_err());
        assert!(parse_leaves("<>4").is_err());
        assert!(parse_leaves("c'4~").is_err());
    }

    #[test]
    fn test_leaves_from_str_is_all_or_nothing() {
        let mut tree = ScoreTree::new();
        assert!(tree.leaves_from_str("c'4 d'4 q4").is_err());
        assert_eq!(tree.component_count(), 0);

        let leaves = tree.leaves_from_str("c'4*1/2 d'4").unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(tree.as_leaf(leaves[0]).unwrap().multiplier, Some(duration(1, 2)));
    }
}
