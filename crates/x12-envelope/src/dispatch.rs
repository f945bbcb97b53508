//! Transaction-set dispatch
//!
//! A chain of responsibility over registered parsers: each exposes a cheap
//! `handles` check and a `parse`. Dispatch walks the chain in registration
//! order and the first claimant wins; registration order is the sole
//! tie-break, so a catch-all parser must be registered last. The dispatcher
//! holds no document state; it is purely a routing function, and a
//! configured dispatcher can be shared read-only across threads.

use tracing::{debug, trace};
use x12_segment::Segment;

use crate::document::TransactionSet;
use crate::envelopes::GroupHeader;
use crate::Result;

/// A pluggable per-type transaction parser.
///
/// `handles` must be cheap (typically an ST01 check) and `parse` must be
/// stateless: the same instance may serve concurrent `parse` calls.
pub trait TransactionSetParser: Send + Sync {
    /// Whether this parser claims the bounded body (ST..=SE inclusive).
    fn handles(&self, segments: &[Segment]) -> bool;

    /// Parse a claimed body into a typed transaction set. Errors returned
    /// here are fatal to the whole parse.
    fn parse(&self, segments: &[Segment]) -> Result<Box<dyn TransactionSet>>;
}

/// Hook invoked once per transaction set no registered parser claimed.
pub trait UnhandledTransactionSetSink: Send + Sync {
    /// Receive an unclaimed body together with its group header.
    fn accept(&self, segments: &[Segment], group: &GroupHeader);
}

/// Ordered, caller-owned registry of transaction-set parsers
#[derive(Default)]
pub struct TransactionDispatcher {
    parsers: Vec<Box<dyn TransactionSetParser>>,
    unhandled_sink: Option<Box<dyn UnhandledTransactionSetSink>>,
}

impl TransactionDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser at the end of the chain.
    pub fn register(&mut self, parser: Box<dyn TransactionSetParser>) -> &mut Self {
        self.parsers.push(parser);
        self
    }

    /// Set the sink invoked for unclaimed transaction sets.
    pub fn set_unhandled_sink(&mut self, sink: Box<dyn UnhandledTransactionSetSink>) -> &mut Self {
        self.unhandled_sink = Some(sink);
        self
    }

    /// Number of registered parsers.
    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    /// Route a bounded transaction body to the first claiming parser.
    ///
    /// Returns `Ok(None)` when no parser claims the body; the unhandled
    /// sink, if any, has then been invoked exactly once.
    pub fn dispatch(
        &self,
        segments: &[Segment],
        group: &GroupHeader,
    ) -> Result<Option<Box<dyn TransactionSet>>> {
        for (position, parser) in self.parsers.iter().enumerate() {
            if parser.handles(segments) {
                trace!(position, "transaction body claimed");
                return parser.parse(segments).map(Some);
            }
        }

        debug!(
            group = %group.control_number,
            "no registered parser claimed transaction body"
        );
        if let Some(sink) = &self.unhandled_sink {
            sink.accept(segments, group);
        }
        Ok(None)
    }
}

impl std::fmt::Debug for TransactionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionDispatcher")
            .field("parsers", &self.parsers.len())
            .field("unhandled_sink", &self.unhandled_sink.is_some())
            .finish()
    }
}
