#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # x12-ship-notice
//!
//! Typed parsing of the 856 advance ship notice.
//!
//! An 856 body is a BSN header, an open-ended region of HL hierarchical
//! loops (shipment at the root, orders below it, then tares, packs, items,
//! and batches), and an optional CTT summary. The generic loop forest
//! from `x12-loop` is resolved into typed
//! business loops here; what the hierarchy may contain is specific to each
//! parent's own type, not one global grammar.
//!
//! Recoverable problems such as duplicate loop ids, dangling parent
//! references, and wrong-coded root loops are collected on the resulting
//! [`ShipNotice`] next to the partially resolved structure, so a damaged
//! document can still be inspected. Decoding failures on mandatory fields
//! are fatal: an unreliable mandatory field usually means its neighbors
//! cannot be trusted either.

/// Typed loop structs and per-tag field decoding.
pub mod loops;
/// The 856 transaction-set parser and its result type.
pub mod parser;
/// Generic-to-typed loop resolution.
pub mod resolver;

pub use loops::{Batch, Item, Order, OrderChild, Pack, PackChild, Shipment, Tare, TareChild};
pub use parser::{ShipNotice, ShipNoticeParser, SHIP_NOTICE_SET_TYPE};
pub use resolver::SemanticError;
