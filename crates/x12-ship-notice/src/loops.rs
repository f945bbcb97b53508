//! Typed 856 loops
//!
//! Each struct is a one-time transform of a generic loop: identity, a
//! handful of decoded fields, typed children, and everything the decoder
//! did not recognize retained verbatim. Unrecognized segment tags land in
//! `unparsed`; unrecognized child loop codes land in `unresolved`, never
//! dropped, so unknown codes survive a round through the engine.

use chrono::NaiveDate;
use serde::Serialize;
use x12_envelope::{Error, Result};
use x12_loop::Loop;
use x12_segment::Segment;

/// Shipment-level loop (HL code "S")
#[derive(Debug, Clone, Serialize)]
pub struct Shipment {
    /// Loop id from the HL marker
    pub id: String,
    /// Packaging code (TD101)
    pub packaging_code: Option<String>,
    /// Lading quantity (TD102); mandatory numeric when present
    pub lading_quantity: Option<u32>,
    /// Carrier identification (TD503)
    pub carrier_code: Option<String>,
    /// Transportation method code (TD504)
    pub transport_method: Option<String>,
    /// Child loops; a shipment's children must all be orders
    pub orders: Vec<Order>,
    /// Child loops whose code is not recognized at this position
    pub unresolved: Vec<Loop>,
    /// Segments no decoder recognized, in order
    pub unparsed: Vec<Segment>,
}

/// Order-level loop (HL code "O")
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Loop id from the HL marker
    pub id: String,
    /// Purchase order number (PRF01)
    pub purchase_order_number: Option<String>,
    /// Purchase order date (PRF04), lenient
    pub purchase_order_date: Option<NaiveDate>,
    /// Children in encounter order; any mix of tare/pack/item/batch
    pub contents: Vec<OrderChild>,
    /// Child loops whose code is not recognized at this position
    pub unresolved: Vec<Loop>,
    /// Segments no decoder recognized, in order
    pub unparsed: Vec<Segment>,
}

/// A child of an order, preserving encounter order across types
#[derive(Debug, Clone, Serialize)]
pub enum OrderChild {
    Tare(Tare),
    Pack(Pack),
    Item(Item),
    Batch(Batch),
}

/// Tare-level loop (HL code "T"), e.g. a pallet
#[derive(Debug, Clone, Serialize)]
pub struct Tare {
    /// Loop id from the HL marker
    pub id: String,
    /// Marks and numbers qualifier (MAN01)
    pub marks_qualifier: Option<String>,
    /// Marks and numbers, typically the SSCC (MAN02)
    pub marks: Option<String>,
    /// Children in encounter order
    pub contents: Vec<TareChild>,
    pub unresolved: Vec<Loop>,
    pub unparsed: Vec<Segment>,
}

/// A child of a tare
#[derive(Debug, Clone, Serialize)]
pub enum TareChild {
    Pack(Pack),
    Item(Item),
}

/// Pack-level loop (HL code "P"), e.g. a carton
#[derive(Debug, Clone, Serialize)]
pub struct Pack {
    /// Loop id from the HL marker
    pub id: String,
    /// Marks and numbers qualifier (MAN01)
    pub marks_qualifier: Option<String>,
    /// Marks and numbers (MAN02)
    pub marks: Option<String>,
    /// Children in encounter order
    pub contents: Vec<PackChild>,
    pub unresolved: Vec<Loop>,
    pub unparsed: Vec<Segment>,
}

/// A child of a pack
#[derive(Debug, Clone, Serialize)]
pub enum PackChild {
    Item(Item),
    Batch(Batch),
}

/// Item-level loop (HL code "I")
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    /// Loop id from the HL marker
    pub id: String,
    /// Product/service id qualifier-value pairs (LIN02/03, LIN04/05, …)
    pub identifiers: Vec<(String, String)>,
    /// Number of units shipped (SN102); mandatory numeric when SN1 present
    pub units_shipped: Option<u32>,
    /// Unit of measurement (SN103)
    pub unit_of_measure: Option<String>,
    /// Batches under this item
    pub batches: Vec<Batch>,
    pub unresolved: Vec<Loop>,
    pub unparsed: Vec<Segment>,
}

/// Batch-level loop (HL code "B")
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    /// Loop id from the HL marker
    pub id: String,
    /// Expiration date (DTM02 with qualifier 036), lenient
    pub expiration_date: Option<NaiveDate>,
    pub unresolved: Vec<Loop>,
    pub unparsed: Vec<Segment>,
}

// ============================================================================
// Per-tag segment decoding
// ============================================================================

impl Shipment {
    pub(crate) fn decode(lp: &Loop) -> Result<Self> {
        let mut shipment = Self {
            id: lp.id.clone(),
            packaging_code: None,
            lading_quantity: None,
            carrier_code: None,
            transport_method: None,
            orders: Vec::new(),
            unresolved: Vec::new(),
            unparsed: Vec::new(),
        };

        for segment in &lp.segments {
            match segment.tag.as_str() {
                "TD1" => {
                    shipment.packaging_code = opt_string(segment, 1);
                    shipment.lading_quantity = opt_u32(segment, 2)?;
                }
                "TD5" => {
                    shipment.carrier_code = opt_string(segment, 3);
                    shipment.transport_method = opt_string(segment, 4);
                }
                _ => shipment.unparsed.push(segment.clone()),
            }
        }

        Ok(shipment)
    }
}

impl Order {
    pub(crate) fn decode(lp: &Loop) -> Result<Self> {
        let mut order = Self {
            id: lp.id.clone(),
            purchase_order_number: None,
            purchase_order_date: None,
            contents: Vec::new(),
            unresolved: Vec::new(),
            unparsed: Vec::new(),
        };

        for segment in &lp.segments {
            match segment.tag.as_str() {
                "PRF" => {
                    order.purchase_order_number = opt_string(segment, 1);
                    order.purchase_order_date = opt_date(segment, 4);
                }
                _ => order.unparsed.push(segment.clone()),
            }
        }

        Ok(order)
    }
}

impl Tare {
    pub(crate) fn decode(lp: &Loop) -> Result<Self> {
        let (marks_qualifier, marks, unparsed) = decode_marks(lp);
        Ok(Self {
            id: lp.id.clone(),
            marks_qualifier,
            marks,
            contents: Vec::new(),
            unresolved: Vec::new(),
            unparsed,
        })
    }
}

impl Pack {
    pub(crate) fn decode(lp: &Loop) -> Result<Self> {
        let (marks_qualifier, marks, unparsed) = decode_marks(lp);
        Ok(Self {
            id: lp.id.clone(),
            marks_qualifier,
            marks,
            contents: Vec::new(),
            unresolved: Vec::new(),
            unparsed,
        })
    }
}

impl Item {
    pub(crate) fn decode(lp: &Loop) -> Result<Self> {
        let mut item = Self {
            id: lp.id.clone(),
            identifiers: Vec::new(),
            units_shipped: None,
            unit_of_measure: None,
            batches: Vec::new(),
            unresolved: Vec::new(),
            unparsed: Vec::new(),
        };

        for segment in &lp.segments {
            match segment.tag.as_str() {
                "LIN" => {
                    // LIN carries qualifier/value pairs from element 2 on
                    let mut index = 2;
                    while let (Some(qualifier), Some(value)) = (
                        segment.field_non_empty(index),
                        segment.field_non_empty(index + 1),
                    ) {
                        item.identifiers
                            .push((qualifier.to_string(), value.to_string()));
                        index += 2;
                    }
                }
                "SN1" => {
                    item.units_shipped = Some(req_u32(segment, 2)?);
                    item.unit_of_measure = opt_string(segment, 3);
                }
                _ => item.unparsed.push(segment.clone()),
            }
        }

        Ok(item)
    }
}

impl Batch {
    pub(crate) fn decode(lp: &Loop) -> Result<Self> {
        let mut batch = Self {
            id: lp.id.clone(),
            expiration_date: None,
            unresolved: Vec::new(),
            unparsed: Vec::new(),
        };

        for segment in &lp.segments {
            match segment.tag.as_str() {
                // 036 is the expiration qualifier
                "DTM" if segment.field_or_empty(1) == "036" => {
                    batch.expiration_date = opt_date(segment, 2);
                }
                _ => batch.unparsed.push(segment.clone()),
            }
        }

        Ok(batch)
    }
}

fn decode_marks(lp: &Loop) -> (Option<String>, Option<String>, Vec<Segment>) {
    let mut qualifier = None;
    let mut marks = None;
    let mut unparsed = Vec::new();

    for segment in &lp.segments {
        if segment.is_tag("MAN") {
            qualifier = opt_string(segment, 1);
            marks = opt_string(segment, 2);
        } else {
            unparsed.push(segment.clone());
        }
    }

    (qualifier, marks, unparsed)
}

// ============================================================================
// Field helpers
// ============================================================================

fn opt_string(segment: &Segment, index: usize) -> Option<String> {
    segment.field_non_empty(index).map(ToString::to_string)
}

/// Decode an optional numeric count; present but non-numeric is fatal.
fn opt_u32(segment: &Segment, index: usize) -> Result<Option<u32>> {
    segment
        .field_non_empty(index)
        .map(|value| parse_u32(segment, index, value))
        .transpose()
}

/// Decode a mandatory numeric count; absent or non-numeric is fatal.
pub(crate) fn req_u32(segment: &Segment, index: usize) -> Result<u32> {
    let value = segment.field_non_empty(index).ok_or_else(|| {
        Error::field_decode(
            &segment.tag,
            index,
            "",
            segment.line,
            "mandatory count is missing",
        )
    })?;
    parse_u32(segment, index, value)
}

fn parse_u32(segment: &Segment, index: usize, value: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        Error::field_decode(
            &segment.tag,
            index,
            value,
            segment.line,
            "expected an unsigned count",
        )
    })
}

/// Lenient CCYYMMDD date; anything unparseable decodes to `None`.
fn opt_date(segment: &Segment, index: usize) -> Option<NaiveDate> {
    segment
        .field_non_empty(index)
        .and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok())
}
