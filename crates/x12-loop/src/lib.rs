#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # x12-loop
//!
//! Generic hierarchical-loop assembly.
//!
//! Richer X12 transaction types describe parent/child business entities as
//! a flat run of `HL` marker segments, each carrying its own id, an
//! optional parent id, and a level code. This crate rebuilds that hierarchy
//! in one pass without aborting on a bad reference: duplicate ids and
//! dangling parent references are collected as recoverable schema errors
//! alongside whatever forest could be reconstructed.

/// Single-pass assembly of a loop forest from a flat marker region.
pub mod builder;

pub use builder::{Loop, LoopBuilder, LoopForest};

use thiserror::Error;

/// Recoverable schema errors found while assembling a loop region.
///
/// These never abort a build; a higher-level consumer decides whether the
/// partially assembled forest is usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Duplicate loop id '{id}' at line {line}; first occurrence kept")]
    DuplicateId { id: String, line: usize },

    #[error("Loop '{id}' at line {line} references undeclared parent '{parent_id}'")]
    MissingParent {
        id: String,
        parent_id: String,
        line: usize,
    },

    #[error("Segment '{tag}' at line {line} precedes the first loop marker")]
    SegmentOutsideLoop { tag: String, line: usize },

    #[error("Malformed loop marker at line {line}: {message}")]
    MalformedMarker { line: usize, message: String },

    #[error("Loop '{id}' at line {line} nests deeper than the supported {limit} levels")]
    NestingTooDeep {
        id: String,
        line: usize,
        limit: usize,
    },
}
