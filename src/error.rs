//! # Error Types
//!
//! This module defines all error types for the score tree.
//!
//! Every mutation validates its preconditions before touching the tree, so
//! an `Err` always means the tree and its spanners are exactly as they were
//! before the call.
//!
//! ## Error Types
//! - `StructuralError` - a mutation would break the tree invariants
//! - `ContiguityError` - spanner members would not be thread-contiguous
//! - `MissingRelationError` / `AmbiguousRelationError` - "the only spanner" queries
//! - `StaleHandle` - a component or spanner handle points at a freed slot
//! - `IndexOutOfRange` - child or spanner index past the end
//! - `DurationError` - written duration cannot be notated
//! - `ParseError` - leaf token parser errors with column information
//! - `ConfigError` - invalid YAML format options
//!
//! ## Usage
//! ```rust
//! use scoretree::{ScoreError, ScoreTree};
//!
//! let mut tree = ScoreTree::new();
//! let voice = tree.voice(None);
//! match tree.delete(voice, 3) {
//!     Err(ScoreError::IndexOutOfRange { index, len }) => {
//!         eprintln!("no child {} in a container of {}", index, len);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//!     Ok(()) => {}
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// A mutation would violate the tree invariants.
    ///
    /// # Example
    /// ```
    /// # use scoretree::ScoreError;
    /// let err = ScoreError::StructuralError("component cannot contain itself".to_string());
    /// assert_eq!(err.to_string(), "Structural error: component cannot contain itself");
    /// ```
    #[error("Structural error: {0}")]
    StructuralError(String),

    /// Spanner members are not thread-contiguous.
    #[error("Contiguity error: {0}")]
    ContiguityError(String),

    /// Expected exactly one spanner and found none.
    #[error("Missing relation: {0}")]
    MissingRelationError(String),

    /// Expected exactly one spanner and found several.
    #[error("Ambiguous relation: {0}")]
    AmbiguousRelationError(String),

    /// Handle refers to a component or spanner that no longer exists.
    #[error("Stale handle: {0}")]
    StaleHandle(String),

    /// Index past the end of a container or spanner.
    ///
    /// # Example
    /// ```
    /// # use scoretree::ScoreError;
    /// let err = ScoreError::IndexOutOfRange { index: 5, len: 3 };
    /// assert_eq!(err.to_string(), "Index 5 out of range for length 3");
    /// ```
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Written duration is not notatable (not a dotted power-of-two value).
    #[error("Invalid duration: {0}")]
    DurationError(String),

    /// Leaf token parse error with location information.
    #[error("Parse error at column {column}: {message}")]
    ParseError { column: usize, message: String },

    /// Invalid format options.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
