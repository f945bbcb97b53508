//! Generic catch-all transaction-set parser
//!
//! Claims any well-bounded body and keeps its segments verbatim (minus the
//! ST/SE markers). Register it last so typed parsers get first refusal.

use std::any::Any;

use tracing::warn;
use x12_segment::Segment;

use crate::document::TransactionSet;
use crate::envelopes::{parse_se, parse_st};
use crate::{Error, Result, TransactionSetParser};

/// A transaction set kept as its raw body segments
#[derive(Debug, Clone)]
pub struct GenericTransactionSet {
    /// Transaction set identifier code (ST01)
    pub set_type: String,
    /// Transaction set control number (ST02)
    pub control_number: String,
    /// Body segments, ST and SE excluded, in order
    pub segments: Vec<Segment>,
}

impl TransactionSet for GenericTransactionSet {
    fn set_type(&self) -> &str {
        &self.set_type
    }

    fn control_number(&self) -> &str {
        &self.control_number
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Catch-all parser producing [`GenericTransactionSet`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericTransactionSetParser;

impl GenericTransactionSetParser {
    /// Create a new catch-all parser.
    pub fn new() -> Self {
        Self
    }
}

impl TransactionSetParser for GenericTransactionSetParser {
    fn handles(&self, _segments: &[Segment]) -> bool {
        true
    }

    fn parse(&self, segments: &[Segment]) -> Result<Box<dyn TransactionSet>> {
        let [st, body @ .., se] = segments else {
            return Err(Error::Envelope(
                "transaction body must carry at least its ST and SE markers".to_string(),
            ));
        };

        let header = parse_st(st)?;
        let trailer = parse_se(se)?;
        if trailer.segment_count != segments.len() {
            warn!(
                declared = trailer.segment_count,
                actual = segments.len(),
                "SE segment count mismatch"
            );
        }
        if trailer.control_number != header.control_number {
            warn!(
                st = %header.control_number,
                se = %trailer.control_number,
                "transaction set control number mismatch"
            );
        }

        Ok(Box::new(GenericTransactionSet {
            set_type: header.set_type,
            control_number: header.control_number,
            segments: body.to_vec(),
        }))
    }
}
