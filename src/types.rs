//! # Value Types
//!
//! Pitches and durations are opaque values as far as the score tree is
//! concerned: the tree stores them on leaves, sums durations to find
//! offsets and prints them, and does nothing else with them.
//!
//! ## Durations
//! Durations and multipliers are exact rationals (`Ratio<i64>`) measured in
//! whole notes: a quarter note is `1/4`, a dotted eighth is `3/16`.
//!
//! A written duration is *assignable* when it can be notated by a single
//! note head: a power-of-two value with up to four dots, from `1/128` to a
//! breve (`2`).
//!
//! ## Pitches
//! Pitches use LilyPond octave numbering: octave 4 is the octave starting
//! at middle C, written `c'`. Octave 3 is written `c` and octave 2 `c,`.

use crate::error::ScoreError;
use num_rational::Ratio;
use num_traits::{One, Zero};
use std::fmt;

/// Exact duration in whole notes.
pub type Duration = Ratio<i64>;

/// Scale factor applied to a leaf or to the contents of a tuplet.
pub type Multiplier = Ratio<i64>;

/// Helper to create a duration from a ratio n/d
#[inline]
pub fn duration(n: i64, d: i64) -> Duration {
    Ratio::new(n, d)
}

const MAX_DOTS: u32 = 4;
const SHORTEST_DENOMINATOR: i64 = 128;

/// Returns the LilyPond duration token for `written` (`4`, `8.`, `\breve`).
pub fn lilypond_duration(written: Duration) -> Result<String, ScoreError> {
    if written <= Duration::zero() {
        return Err(ScoreError::DurationError(format!(
            "duration must be positive, got {}",
            written
        )));
    }
    for dots in 0..=MAX_DOTS {
        // n dots multiply the undotted value by (2^(n+1) - 1) / 2^n
        let dot_factor = Ratio::new((1i64 << (dots + 1)) - 1, 1i64 << dots);
        let undotted = written / dot_factor;
        let token = if undotted == Ratio::from_integer(2) {
            Some(r"\breve".to_string())
        } else if undotted.numer().is_one() {
            let denominator = *undotted.denom();
            if is_power_of_two(denominator) && denominator <= SHORTEST_DENOMINATOR {
                Some(denominator.to_string())
            } else {
                None
            }
        } else {
            None
        };
        if let Some(token) = token {
            return Ok(format!("{}{}", token, ".".repeat(dots as usize)));
        }
    }
    Err(ScoreError::DurationError(format!(
        "{} is not an assignable written duration",
        written
    )))
}

/// True when `written` can be notated by a single, possibly dotted, note head.
pub fn is_assignable(written: Duration) -> bool {
    lilypond_duration(written).is_ok()
}

fn is_power_of_two(n: i64) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

/// Note names C through B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum NoteName {
    #[default]
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    fn semitone(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    fn lilypond(self) -> char {
        match self {
            NoteName::C => 'c',
            NoteName::D => 'd',
            NoteName::E => 'e',
            NoteName::F => 'f',
            NoteName::G => 'g',
            NoteName::A => 'a',
            NoteName::B => 'b',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'c' => Some(NoteName::C),
            'd' => Some(NoteName::D),
            'e' => Some(NoteName::E),
            'f' => Some(NoteName::F),
            'g' => Some(NoteName::G),
            'a' => Some(NoteName::A),
            'b' => Some(NoteName::B),
            _ => None,
        }
    }
}

/// Chromatic inflection of a note name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    #[default]
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    fn alteration(self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    fn lilypond(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "ff",
            Accidental::Flat => "f",
            Accidental::Natural => "",
            Accidental::Sharp => "s",
            Accidental::DoubleSharp => "ss",
        }
    }

    pub fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "" => Some(Accidental::Natural),
            "s" => Some(Accidental::Sharp),
            "ss" => Some(Accidental::DoubleSharp),
            "f" => Some(Accidental::Flat),
            "ff" => Some(Accidental::DoubleFlat),
            _ => None,
        }
    }
}

/// A spelled pitch: note name, accidental and octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub name: NoteName,
    pub accidental: Accidental,
    pub octave: i8,
}

impl Pitch {
    pub fn new(name: NoteName, accidental: Accidental, octave: i8) -> Self {
        Self {
            name,
            accidental,
            octave,
        }
    }

    /// Semitones above middle C (`c'` = 0).
    pub fn number(&self) -> i32 {
        (self.octave as i32 - 4) * 12 + self.name.semitone() + self.accidental.alteration()
    }
}

impl Default for Pitch {
    fn default() -> Self {
        Self::new(NoteName::C, Accidental::Natural, 4)
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.number()
            .cmp(&other.number())
            .then(self.name.cmp(&other.name))
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name.lilypond(), self.accidental.lilypond())?;
        let ticks = self.octave as i32 - 3;
        if ticks > 0 {
            write!(f, "{}", "'".repeat(ticks as usize))?;
        } else if ticks < 0 {
            write!(f, "{}", ",".repeat((-ticks) as usize))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_durations() {
        assert_eq!(lilypond_duration(duration(1, 4)).unwrap(), "4");
        assert_eq!(lilypond_duration(duration(1, 1)).unwrap(), "1");
        assert_eq!(lilypond_duration(duration(1, 32)).unwrap(), "32");
        assert_eq!(lilypond_duration(duration(2, 1)).unwrap(), r"\breve");
    }

    #[test]
    fn test_dotted_durations() {
        assert_eq!(lilypond_duration(duration(3, 8)).unwrap(), "4.");
        assert_eq!(lilypond_duration(duration(7, 16)).unwrap(), "4..");
        assert_eq!(lilypond_duration(duration(3, 4)).unwrap(), "2.");
        assert_eq!(lilypond_duration(duration(3, 2)).unwrap(), "1.");
        assert_eq!(lilypond_duration(duration(3, 1)).unwrap(), r"\breve.");
    }

    #[test]
    fn test_unassignable_durations() {
        assert!(!is_assignable(duration(5, 8)));
        assert!(!is_assignable(duration(1, 3)));
        assert!(!is_assignable(duration(0, 1)));
        assert!(!is_assignable(duration(-1, 4)));
        assert!(matches!(
            lilypond_duration(duration(5, 16)),
            Err(ScoreError::DurationError(_))
        ));
    }

    #[test]
    fn test_pitch_display() {
        assert_eq!(Pitch::default().to_string(), "c'");
        assert_eq!(
            Pitch::new(NoteName::F, Accidental::Sharp, 5).to_string(),
            "fs''"
        );
        assert_eq!(Pitch::new(NoteName::B, Accidental::Flat, 3).to_string(), "bf");
        assert_eq!(
            Pitch::new(NoteName::E, Accidental::DoubleFlat, 2).to_string(),
            "eff,"
        );
    }

    #[test]
    fn test_pitch_numbers_and_order() {
        let c4 = Pitch::default();
        let cs4 = Pitch::new(NoteName::C, Accidental::Sharp, 4);
        let b3 = Pitch::new(NoteName::B, Accidental::Natural, 3);
        assert_eq!(c4.number(), 0);
        assert_eq!(cs4.number(), 1);
        assert_eq!(b3.number(), -1);
        let mut pitches = vec![cs4, b3, c4];
        pitches.sort();
        assert_eq!(pitches, vec![b3, c4, cs4]);
    }
}
