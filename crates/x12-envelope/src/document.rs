//! Document ownership model
//!
//! A [`Document`] owns its envelope header/trailer and an ordered list of
//! [`Group`]s; each group owns its ordered transaction sets. Ownership is
//! strictly tree-shaped: there are no back-pointers, and a fresh document
//! is created per parse call.

use std::any::Any;

use crate::envelopes::{GroupHeader, GroupTrailer, InterchangeHeader, InterchangeTrailer};

/// A typed transaction set produced by a registered parser.
///
/// Callers downcast through [`as_any`](TransactionSet::as_any) to the
/// concrete type their parser produced. Implementations must be stateless
/// during parsing so a configured engine can be shared across threads.
pub trait TransactionSet: std::fmt::Debug + Send {
    /// Transaction set identifier code (e.g., "856").
    fn set_type(&self) -> &str;

    /// Transaction set control number (ST02).
    fn control_number(&self) -> &str;

    /// Downcast support for callers that know the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// One parsed interchange
#[derive(Debug)]
pub struct Document {
    /// Decoded interchange header (ISA)
    pub header: InterchangeHeader,
    /// Decoded interchange trailer (IEA)
    pub trailer: InterchangeTrailer,
    /// Functional groups in interchange order
    pub groups: Vec<Group>,
}

/// One functional group within an interchange
#[derive(Debug)]
pub struct Group {
    /// Decoded group header (GS)
    pub header: GroupHeader,
    /// Decoded group trailer (GE)
    pub trailer: GroupTrailer,
    /// Transaction sets claimed by registered parsers, in order. Sets
    /// consumed by the unhandled sink do not appear here.
    pub transaction_sets: Vec<Box<dyn TransactionSet>>,
}

impl Document {
    /// Total number of transaction sets across all groups.
    pub fn transaction_set_count(&self) -> usize {
        self.groups.iter().map(|g| g.transaction_sets.len()).sum()
    }
}

impl Group {
    /// Transaction sets of a given type, preserving order.
    pub fn sets_of_type(&self, set_type: &str) -> Vec<&dyn TransactionSet> {
        self.transaction_sets
            .iter()
            .filter(|s| s.set_type() == set_type)
            .map(AsRef::as_ref)
            .collect()
    }
}
