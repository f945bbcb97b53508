#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # x12-segment
//!
//! X12 segment model, tokenizer, and bidirectional segment cursor.
//!
//! This crate turns raw X12 interchange text into an ordered list of
//! immutable [`Segment`]s and provides the [`SegmentCursor`] used by the
//! envelope and transaction parsers to look ahead past a boundary and
//! rewind before committing.

/// Bidirectional, index-addressable traversal over a segment sequence.
pub mod cursor;
/// Immutable tokenized segment (tag plus ordered field values).
pub mod segment;
/// Delimiter model and detection from the interchange-open segment.
pub mod syntax;
/// Line and field splitting of raw interchange text.
pub mod tokenizer;

pub use cursor::SegmentCursor;
pub use segment::Segment;
pub use syntax::Delimiters;
pub use tokenizer::Tokenizer;

use thiserror::Error;

/// Errors that can occur while tokenizing or traversing segments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Tokenize error at line {line}: {message}")]
    Tokenize { line: usize, message: String },

    #[error("End of input reached at index {index}")]
    EndOfInput { index: usize },

    #[error("Start of input reached")]
    StartOfInput,

    #[error("Index {index} out of bounds for {len} segments")]
    OutOfBounds { index: usize, len: usize },
}

impl Error {
    /// Build a tokenize error with line context.
    pub fn tokenize(line: usize, message: impl Into<String>) -> Self {
        Self::Tokenize {
            line,
            message: message.into(),
        }
    }
}

/// Crate-local result type for segment operations.
pub type Result<T> = std::result::Result<T, Error>;
