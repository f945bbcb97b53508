#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # x12-envelope
//!
//! X12 envelope boundary parsing and transaction-set dispatch.
//!
//! This crate recognizes interchange (ISA/IEA), functional group (GS/GE)
//! and transaction-set (ST/SE) boundaries, decodes the envelope control
//! segments into typed structs, and routes each bounded transaction body
//! through an ordered chain of pluggable [`TransactionSetParser`]s.
//!
//! Structural errors (a boundary that cannot be located or a boundary tag
//! in an impossible position) abort the whole parse: the stream can no
//! longer be reliably segmented past that point. Errors *inside* a
//! well-bounded transaction body are the claiming parser's business and
//! are collected, not thrown.

/// Ordered chain-of-responsibility dispatch of transaction bodies.
pub mod dispatch;
/// Document, group, and transaction-set ownership model.
pub mod document;
/// Decoded envelope control segments (ISA/IEA, GS/GE, ST/SE).
pub mod envelopes;
/// Catch-all transaction-set parser preserving the raw body.
pub mod generic;
/// Envelope boundary state machine.
pub mod parser;

pub use dispatch::{TransactionDispatcher, TransactionSetParser, UnhandledTransactionSetSink};
pub use document::{Document, Group, TransactionSet};
pub use envelopes::{
    GroupHeader, GroupTrailer, InterchangeHeader, InterchangeTrailer, PartyId,
    TransactionSetHeader, TransactionSetTrailer, UsageIndicator,
};
pub use generic::{GenericTransactionSet, GenericTransactionSetParser};
pub use parser::EnvelopeParser;

use thiserror::Error;

/// Errors that can occur while parsing an interchange
#[derive(Error, Debug)]
pub enum Error {
    #[error("Expected {expected} but found {found} at line {line}")]
    UnexpectedSegment {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Reached end of input while looking for {expected}")]
    UnexpectedEndOfInput { expected: String },

    #[error("Transaction set opened at line {line} while a transaction set is still open")]
    NestedTransactionOpen { line: usize },

    #[error("Group closed at line {line} while a transaction set is still open")]
    GroupCloseInTransaction { line: usize },

    #[error("Envelope error: {0}")]
    Envelope(String),

    #[error("Cannot decode {tag}{field:02} value '{value}' at line {line}: {message}")]
    FieldDecode {
        tag: String,
        field: usize,
        value: String,
        line: usize,
        message: String,
    },

    #[error("Segment error: {0}")]
    Segment(#[from] x12_segment::Error),
}

impl Error {
    /// Build a structural error naming the expected and actual tag.
    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>, line: usize) -> Self {
        Self::UnexpectedSegment {
            expected: expected.into(),
            found: found.into(),
            line,
        }
    }

    /// Build a field-decode error with segment context.
    pub fn field_decode(
        tag: impl Into<String>,
        field: usize,
        value: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::FieldDecode {
            tag: tag.into(),
            field,
            value: value.into(),
            line,
            message: message.into(),
        }
    }
}

/// Crate-local result type for envelope operations.
pub type Result<T> = std::result::Result<T, Error>;
