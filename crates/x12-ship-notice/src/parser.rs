//! 856 ship notice transaction-set parser
//!
//! Claims bounded transaction bodies whose ST01 is "856" and turns them
//! into a [`ShipNotice`]: decoded BSN header, retained heading segments,
//! the hierarchical loop region assembled and resolved into typed loops,
//! and the CTT summary count.
//!
//! Recoverable problems (schema errors from loop assembly, semantic errors
//! from resolution) are collected on the result. Fatal problems (a missing
//! BSN, an undecodable mandatory field) fail the whole transaction set.

use std::any::Any;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, trace, warn};
use x12_envelope::envelopes::{parse_se, parse_st, set_type_code};
use x12_envelope::{Error, Result, TransactionSet, TransactionSetParser};
use x12_loop::{Loop, LoopBuilder, SchemaError};
use x12_segment::Segment;

use crate::loops::{self, Shipment};
use crate::resolver::{self, SemanticError};

/// Transaction set identifier for the advance ship notice
pub const SHIP_NOTICE_SET_TYPE: &str = "856";

/// A fully parsed 856 advance ship notice
#[derive(Debug)]
pub struct ShipNotice {
    /// Transaction set control number (ST02)
    pub control_number: String,
    /// Transaction set purpose code (BSN01, e.g. "00" original)
    pub purpose_code: String,
    /// Shipment identification (BSN02)
    pub shipment_id: String,
    /// Document creation date (BSN03)
    pub date: NaiveDate,
    /// Document creation time (BSN04)
    pub time: NaiveTime,
    /// Heading segments between BSN and the first loop marker, retained raw
    pub heading: Vec<Segment>,
    /// The resolved shipment hierarchy, when a well-coded root existed
    pub shipment: Option<Shipment>,
    /// Root loops left unresolved (extra or wrong-coded roots)
    pub unresolved_roots: Vec<Loop>,
    /// Total line items from the CTT summary, when present
    pub line_item_count: Option<u32>,
    /// Recoverable loop assembly errors
    pub schema_errors: Vec<SchemaError>,
    /// Recoverable resolution errors
    pub semantic_errors: Vec<SemanticError>,
}

impl ShipNotice {
    /// Whether any recoverable error was collected during the parse.
    pub fn has_errors(&self) -> bool {
        !self.schema_errors.is_empty() || !self.semantic_errors.is_empty()
    }
}

impl TransactionSet for ShipNotice {
    fn set_type(&self) -> &str {
        SHIP_NOTICE_SET_TYPE
    }

    fn control_number(&self) -> &str {
        &self.control_number
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Parser for 856 transaction bodies, registered with a dispatcher.
#[derive(Debug, Default)]
pub struct ShipNoticeParser;

impl ShipNoticeParser {
    pub fn new() -> Self {
        Self
    }
}

impl TransactionSetParser for ShipNoticeParser {
    fn handles(&self, segments: &[Segment]) -> bool {
        set_type_code(segments) == Some(SHIP_NOTICE_SET_TYPE)
    }

    fn parse(&self, segments: &[Segment]) -> Result<Box<dyn TransactionSet>> {
        let [st, body @ .., se] = segments else {
            return Err(Error::Envelope(
                "Transaction body must start with ST and end with SE".to_string(),
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
        trace!(control_number = %header.control_number, "parsing ship notice body");

        // BSN must lead the body
        let (bsn, rest) = match body {
            [first, rest @ ..] if first.is_tag("BSN") => (first, rest),
            [first, ..] => return Err(Error::unexpected("BSN", &first.tag, first.line)),
            [] => {
                return Err(Error::UnexpectedEndOfInput {
                    expected: "BSN".to_string(),
                });
            }
        };

        // Heading runs until the first loop marker; the loop region runs
        // from there until the trailing CTT summary, if one is present
        let marker_at = rest.iter().position(|s| s.is_tag("HL"));
        let (heading, mut loop_region) = match marker_at {
            Some(index) => rest.split_at(index),
            None => (rest, &rest[rest.len()..]),
        };

        let mut line_item_count = None;
        if let [region @ .., ctt] = loop_region {
            if ctt.is_tag("CTT") {
                line_item_count = Some(loops::req_u32(ctt, 1)?);
                loop_region = region;
            }
        }

        let forest = LoopBuilder::new().build(loop_region);
        let mut semantic_errors = Vec::new();
        let (shipment, unresolved_roots) =
            resolver::resolve_roots(forest.roots, &mut semantic_errors)?;

        if !forest.errors.is_empty() || !semantic_errors.is_empty() {
            debug!(
                control_number = %header.control_number,
                schema_errors = forest.errors.len(),
                semantic_errors = semantic_errors.len(),
                "ship notice parsed with recoverable errors"
            );
        }

        Ok(Box::new(ShipNotice {
            control_number: header.control_number,
            purpose_code: req_string(bsn, 1)?,
            shipment_id: req_string(bsn, 2)?,
            date: req_date(bsn, 3)?,
            time: req_time(bsn, 4)?,
            heading: heading.to_vec(),
            shipment,
            unresolved_roots,
            line_item_count,
            schema_errors: forest.errors,
            semantic_errors,
        }))
    }
}

// BSN fields are mandatory; undecodable values are fatal.

fn req_string(segment: &Segment, index: usize) -> Result<String> {
    segment
        .field_non_empty(index)
        .map(ToString::to_string)
        .ok_or_else(|| {
            Error::field_decode(
                &segment.tag,
                index,
                "",
                segment.line,
                "mandatory field is missing",
            )
        })
}

fn req_date(segment: &Segment, index: usize) -> Result<NaiveDate> {
    let value = req_string(segment, index)?;
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").map_err(|_| {
        Error::field_decode(
            &segment.tag,
            index,
            value,
            segment.line,
            "expected a CCYYMMDD date",
        )
    })
}

fn req_time(segment: &Segment, index: usize) -> Result<NaiveTime> {
    let value = req_string(segment, index)?;
    let trimmed = value.trim();
    let format = if trimmed.len() >= 6 { "%H%M%S" } else { "%H%M" };
    NaiveTime::parse_from_str(trimmed, format).map_err(|_| {
        Error::field_decode(
            &segment.tag,
            index,
            value,
            segment.line,
            "expected an HHMM or HHMMSS time",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loops::OrderChild;

    fn seg(tag: &str, fields: &[&str], line: usize) -> Segment {
        Segment::new(tag, fields.iter().map(ToString::to_string).collect(), line)
    }

    fn body(middle: Vec<Segment>) -> Vec<Segment> {
        let mut segments = vec![
            seg("ST", &["856", "0001"], 1),
            seg("BSN", &["00", "SHIP42", "20240115", "1200"], 2),
        ];
        segments.extend(middle);
        let count = segments.len() + 1;
        segments.push(seg("SE", &[&count.to_string(), "0001"], 99));
        segments
    }

    #[test]
    fn test_handles_only_856() {
        let parser = ShipNoticeParser::new();
        assert!(parser.handles(&[seg("ST", &["856", "0001"], 1)]));
        assert!(!parser.handles(&[seg("ST", &["850", "0001"], 1)]));
        assert!(!parser.handles(&[seg("BSN", &["00"], 1)]));
        assert!(!parser.handles(&[]));
    }

    #[test]
    fn test_parses_full_hierarchy() {
        let segments = body(vec![
            seg("DTM", &["011", "20240114"], 3),
            seg("HL", &["1", "", "S"], 4),
            seg("TD1", &["CTN25", "2"], 5),
            seg("HL", &["2", "1", "O"], 6),
            seg("PRF", &["PO5561"], 7),
            seg("HL", &["3", "2", "I"], 8),
            seg("LIN", &["", "UP", "012345678901"], 9),
            seg("SN1", &["", "24", "EA"], 10),
            seg("CTT", &["1"], 11),
        ]);

        let set = ShipNoticeParser::new().parse(&segments).unwrap();
        let notice = set.as_any().downcast_ref::<ShipNotice>().unwrap();

        assert_eq!(notice.control_number, "0001");
        assert_eq!(notice.purpose_code, "00");
        assert_eq!(notice.shipment_id, "SHIP42");
        assert_eq!(notice.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(notice.time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(notice.heading.len(), 1);
        assert_eq!(notice.heading[0].tag, "DTM");
        assert_eq!(notice.line_item_count, Some(1));
        assert!(!notice.has_errors());

        let shipment = notice.shipment.as_ref().unwrap();
        assert_eq!(shipment.lading_quantity, Some(2));
        assert_eq!(shipment.orders.len(), 1);
        let order = &shipment.orders[0];
        assert_eq!(order.purchase_order_number.as_deref(), Some("PO5561"));
        let OrderChild::Item(item) = &order.contents[0] else {
            panic!("Expected an item under the order");
        };
        assert_eq!(item.units_shipped, Some(24));
    }

    #[test]
    fn test_missing_bsn_is_fatal() {
        let segments = vec![
            seg("ST", &["856", "0001"], 1),
            seg("HL", &["1", "", "S"], 2),
            seg("SE", &["3", "0001"], 3),
        ];

        assert!(matches!(
            ShipNoticeParser::new().parse(&segments),
            Err(Error::UnexpectedSegment { line: 2, .. })
        ));
    }

    #[test]
    fn test_bad_bsn_date_is_fatal() {
        let segments = vec![
            seg("ST", &["856", "0001"], 1),
            seg("BSN", &["00", "SHIP42", "JAN152024", "1200"], 2),
            seg("SE", &["3", "0001"], 3),
        ];

        assert!(matches!(
            ShipNoticeParser::new().parse(&segments),
            Err(Error::FieldDecode { field: 3, .. })
        ));
    }

    #[test]
    fn test_non_numeric_ctt_count_is_fatal() {
        let segments = body(vec![
            seg("HL", &["1", "", "S"], 3),
            seg("CTT", &["three"], 4),
        ]);

        assert!(matches!(
            ShipNoticeParser::new().parse(&segments),
            Err(Error::FieldDecode { field: 1, .. })
        ));
    }

    #[test]
    fn test_no_loop_region_collects_missing_root() {
        let segments = body(vec![seg("DTM", &["011", "20240114"], 3)]);

        let set = ShipNoticeParser::new().parse(&segments).unwrap();
        let notice = set.as_any().downcast_ref::<ShipNotice>().unwrap();

        assert!(notice.shipment.is_none());
        assert_eq!(
            notice.semantic_errors,
            vec![SemanticError::MissingShipmentRoot]
        );
        assert!(notice.has_errors());
    }

    #[test]
    fn test_schema_errors_collected_not_fatal() {
        // Loop 3 names a parent that never appears
        let segments = body(vec![
            seg("HL", &["1", "", "S"], 3),
            seg("HL", &["3", "9", "O"], 4),
        ]);

        let set = ShipNoticeParser::new().parse(&segments).unwrap();
        let notice = set.as_any().downcast_ref::<ShipNotice>().unwrap();

        assert!(notice.shipment.is_some());
        assert_eq!(notice.schema_errors.len(), 1);
        assert!(matches!(
            notice.schema_errors[0],
            SchemaError::MissingParent { .. }
        ));
    }

    #[test]
    fn test_se_trailer_mismatches_tolerated() {
        // Wrong SE01 count and an SE02 not pairing with ST02 do not move
        // the boundary, so the set still parses
        let segments = vec![
            seg("ST", &["856", "0001"], 1),
            seg("BSN", &["00", "SHIP42", "20240115", "1200"], 2),
            seg("HL", &["1", "", "S"], 3),
            seg("SE", &["99", "MISMATCH"], 4),
        ];

        let set = ShipNoticeParser::new().parse(&segments).unwrap();
        let notice = set.as_any().downcast_ref::<ShipNotice>().unwrap();
        assert_eq!(notice.control_number, "0001");
        assert!(notice.shipment.is_some());
    }

    #[test]
    fn test_missing_hhmmss_time_variants() {
        let mut segments = vec![
            seg("ST", &["856", "0001"], 1),
            seg("BSN", &["00", "SHIP42", "20240115", "143059"], 2),
            seg("HL", &["1", "", "S"], 3),
        ];
        segments.push(seg("SE", &["5", "0001"], 4));

        let set = ShipNoticeParser::new().parse(&segments).unwrap();
        let notice = set.as_any().downcast_ref::<ShipNotice>().unwrap();
        assert_eq!(notice.time, NaiveTime::from_hms_opt(14, 30, 59).unwrap());
    }
}
