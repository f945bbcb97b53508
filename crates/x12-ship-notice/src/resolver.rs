//! Generic-to-typed loop resolution
//!
//! Walks the generic forest recursively, choosing a typed constructor per
//! loop code. What a loop may contain depends on its parent's own type:
//! a shipment's children must all be orders; an order may mix tares,
//! packs, items, and batches in any order and multiplicity. Codes a parent
//! does not recognize are preserved as raw loops rather than dropped.
//!
//! Resolving one child subtree never touches sibling state; the transforms
//! are independent and order-preserving.

use thiserror::Error;
use tracing::debug;
use x12_envelope::Result;
use x12_loop::Loop;

use crate::loops::{Batch, Item, Order, OrderChild, Pack, PackChild, Shipment, Tare, TareChild};

/// Loop codes understood by the 856 resolver
pub const CODE_SHIPMENT: &str = "S";
pub const CODE_ORDER: &str = "O";
pub const CODE_TARE: &str = "T";
pub const CODE_PACK: &str = "P";
pub const CODE_ITEM: &str = "I";
pub const CODE_BATCH: &str = "B";

/// Recoverable semantic errors found while resolving the loop forest.
///
/// Distinct from schema errors: the forest itself was well-formed, but its
/// shape violates what the transaction family expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Ship notice has no shipment-level root loop")]
    MissingShipmentRoot,

    #[error("Extra shipment root '{id}' ignored; exactly one is expected")]
    ExtraShipmentRoot { id: String },

    #[error("Root loop '{id}' has code '{code}' where '{expected}' is expected")]
    UnexpectedRootCode {
        id: String,
        code: String,
        expected: String,
    },
}

/// Resolve the root region: exactly one shipment root is expected.
///
/// Zero, multiple, or wrong-coded roots record semantic errors while
/// resolution continues with whatever is resolvable. Returns the resolved
/// shipment (first well-coded root) and every root left unresolved.
pub fn resolve_roots(
    roots: Vec<Loop>,
    errors: &mut Vec<SemanticError>,
) -> Result<(Option<Shipment>, Vec<Loop>)> {
    let mut shipment = None;
    let mut unresolved = Vec::new();

    for root in roots {
        if root.code != CODE_SHIPMENT {
            errors.push(SemanticError::UnexpectedRootCode {
                id: root.id.clone(),
                code: root.code.clone(),
                expected: CODE_SHIPMENT.to_string(),
            });
            unresolved.push(root);
        } else if shipment.is_some() {
            errors.push(SemanticError::ExtraShipmentRoot {
                id: root.id.clone(),
            });
            unresolved.push(root);
        } else {
            shipment = Some(resolve_shipment(&root)?);
        }
    }

    if shipment.is_none() {
        errors.push(SemanticError::MissingShipmentRoot);
    }

    Ok((shipment, unresolved))
}

fn resolve_shipment(lp: &Loop) -> Result<Shipment> {
    let mut shipment = Shipment::decode(lp)?;

    for child in &lp.children {
        match child.code.as_str() {
            CODE_ORDER => shipment.orders.push(resolve_order(child)?),
            code => {
                debug!(id = %child.id, code, "unrecognized child under shipment kept raw");
                shipment.unresolved.push(child.clone());
            }
        }
    }

    Ok(shipment)
}

fn resolve_order(lp: &Loop) -> Result<Order> {
    let mut order = Order::decode(lp)?;

    for child in &lp.children {
        match child.code.as_str() {
            CODE_TARE => order.contents.push(OrderChild::Tare(resolve_tare(child)?)),
            CODE_PACK => order.contents.push(OrderChild::Pack(resolve_pack(child)?)),
            CODE_ITEM => order.contents.push(OrderChild::Item(resolve_item(child)?)),
            CODE_BATCH => order
                .contents
                .push(OrderChild::Batch(resolve_batch(child)?)),
            code => {
                debug!(id = %child.id, code, "unrecognized child under order kept raw");
                order.unresolved.push(child.clone());
            }
        }
    }

    Ok(order)
}

fn resolve_tare(lp: &Loop) -> Result<Tare> {
    let mut tare = Tare::decode(lp)?;

    for child in &lp.children {
        match child.code.as_str() {
            CODE_PACK => tare.contents.push(TareChild::Pack(resolve_pack(child)?)),
            CODE_ITEM => tare.contents.push(TareChild::Item(resolve_item(child)?)),
            code => {
                debug!(id = %child.id, code, "unrecognized child under tare kept raw");
                tare.unresolved.push(child.clone());
            }
        }
    }

    Ok(tare)
}

fn resolve_pack(lp: &Loop) -> Result<Pack> {
    let mut pack = Pack::decode(lp)?;

    for child in &lp.children {
        match child.code.as_str() {
            CODE_ITEM => pack.contents.push(PackChild::Item(resolve_item(child)?)),
            CODE_BATCH => pack.contents.push(PackChild::Batch(resolve_batch(child)?)),
            code => {
                debug!(id = %child.id, code, "unrecognized child under pack kept raw");
                pack.unresolved.push(child.clone());
            }
        }
    }

    Ok(pack)
}

fn resolve_item(lp: &Loop) -> Result<Item> {
    let mut item = Item::decode(lp)?;

    for child in &lp.children {
        match child.code.as_str() {
            CODE_BATCH => item.batches.push(resolve_batch(child)?),
            code => {
                debug!(id = %child.id, code, "unrecognized child under item kept raw");
                item.unresolved.push(child.clone());
            }
        }
    }

    Ok(item)
}

fn resolve_batch(lp: &Loop) -> Result<Batch> {
    let mut batch = Batch::decode(lp)?;

    // Batches are leaves; any child code is unrecognized here
    for child in &lp.children {
        debug!(id = %child.id, code = %child.code, "unrecognized child under batch kept raw");
        batch.unresolved.push(child.clone());
    }

    Ok(batch)
}
