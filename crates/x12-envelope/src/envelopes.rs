//! X12 envelope control segments (ISA/IEA, GS/GE, ST/SE)
//!
//! Decoding here is deliberately partial: enough of each control segment is
//! decoded to frame the document and identify its parties and control
//! numbers. Mandatory numeric and date fields fail fatally when they cannot
//! be decoded; everything else is carried through as-is.

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use x12_segment::Segment;

/// Interchange sender or receiver identity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartyId {
    /// Qualifier for the id (e.g., "01" DUNS, "ZZ" mutually defined)
    pub qualifier: String,
    /// Party identification, trailing padding removed
    pub id: String,
}

/// Interchange usage indicator (ISA15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageIndicator {
    /// Production data ("P")
    Production,
    /// Test data ("T")
    Test,
    /// Information ("I")
    Information,
    /// Any other code, carried without interpretation
    Unknown,
}

impl UsageIndicator {
    fn from_code(code: &str) -> Self {
        match code {
            "P" => Self::Production,
            "T" => Self::Test,
            "I" => Self::Information,
            _ => Self::Unknown,
        }
    }
}

/// ISA - Interchange Control Header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchangeHeader {
    /// Interchange sender (ISA05/ISA06)
    pub sender: PartyId,
    /// Interchange receiver (ISA07/ISA08)
    pub receiver: PartyId,
    /// Interchange date (ISA09, YYMMDD)
    pub date: NaiveDate,
    /// Interchange time (ISA10, HHMM)
    pub time: NaiveTime,
    /// Interchange control version (ISA12)
    pub version: String,
    /// Interchange control number (ISA13)
    pub control_number: String,
    /// Usage indicator (ISA15)
    pub usage: UsageIndicator,
}

/// IEA - Interchange Control Trailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchangeTrailer {
    /// Number of functional groups in the interchange (IEA01)
    pub group_count: usize,
    /// Interchange control number (IEA02, must match ISA13)
    pub control_number: String,
}

/// GS - Functional Group Header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupHeader {
    /// Functional identifier code (GS01, e.g., "SH" for ship notices)
    pub functional_code: String,
    /// Application sender code (GS02)
    pub sender: String,
    /// Application receiver code (GS03)
    pub receiver: String,
    /// Group date (GS04, CCYYMMDD)
    pub date: NaiveDate,
    /// Group time (GS05, HHMM or HHMMSS)
    pub time: NaiveTime,
    /// Group control number (GS06)
    pub control_number: String,
    /// Responsible agency code (GS07)
    pub agency: Option<String>,
    /// Version/release/industry identifier (GS08)
    pub version: Option<String>,
}

/// GE - Functional Group Trailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTrailer {
    /// Number of transaction sets in the group (GE01)
    pub set_count: usize,
    /// Group control number (GE02, must match GS06)
    pub control_number: String,
}

/// ST - Transaction Set Header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSetHeader {
    /// Transaction set identifier code (ST01, e.g., "856")
    pub set_type: String,
    /// Transaction set control number (ST02)
    pub control_number: String,
}

/// SE - Transaction Set Trailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSetTrailer {
    /// Number of segments in the set including ST and SE (SE01)
    pub segment_count: usize,
    /// Transaction set control number (SE02, must match ST02)
    pub control_number: String,
}

// ============================================================================
// Parsing Functions
// ============================================================================

/// Parse an ISA (Interchange Control Header) segment
pub fn parse_isa(segment: &Segment) -> Result<InterchangeHeader> {
    expect_tag(segment, "ISA")?;

    if segment.field_count() < 13 {
        return Err(Error::Envelope(format!(
            "ISA segment must have at least 13 elements, got {}",
            segment.field_count()
        )));
    }

    Ok(InterchangeHeader {
        sender: PartyId {
            qualifier: segment.field_or_empty(5).trim().to_string(),
            id: segment.field_or_empty(6).trim().to_string(),
        },
        receiver: PartyId {
            qualifier: segment.field_or_empty(7).trim().to_string(),
            id: segment.field_or_empty(8).trim().to_string(),
        },
        date: field_date(segment, 9, "%y%m%d")?,
        time: field_time(segment, 10)?,
        version: segment.field_or_empty(12).trim().to_string(),
        control_number: segment.field_or_empty(13).trim().to_string(),
        usage: UsageIndicator::from_code(segment.field_or_empty(15).trim()),
    })
}

/// Parse an IEA (Interchange Control Trailer) segment
pub fn parse_iea(segment: &Segment) -> Result<InterchangeTrailer> {
    expect_tag(segment, "IEA")?;

    Ok(InterchangeTrailer {
        group_count: field_usize(segment, 1)?,
        control_number: segment.field_or_empty(2).trim().to_string(),
    })
}

/// Parse a GS (Functional Group Header) segment
pub fn parse_gs(segment: &Segment) -> Result<GroupHeader> {
    expect_tag(segment, "GS")?;

    if segment.field_count() < 6 {
        return Err(Error::Envelope(format!(
            "GS segment must have at least 6 elements, got {}",
            segment.field_count()
        )));
    }

    Ok(GroupHeader {
        functional_code: segment.field_or_empty(1).to_string(),
        sender: segment.field_or_empty(2).trim().to_string(),
        receiver: segment.field_or_empty(3).trim().to_string(),
        date: field_date(segment, 4, "%Y%m%d")?,
        time: field_time(segment, 5)?,
        control_number: segment.field_or_empty(6).to_string(),
        agency: segment.field_non_empty(7).map(ToString::to_string),
        version: segment.field_non_empty(8).map(ToString::to_string),
    })
}

/// Parse a GE (Functional Group Trailer) segment
pub fn parse_ge(segment: &Segment) -> Result<GroupTrailer> {
    expect_tag(segment, "GE")?;

    Ok(GroupTrailer {
        set_count: field_usize(segment, 1)?,
        control_number: segment.field_or_empty(2).to_string(),
    })
}

/// Parse an ST (Transaction Set Header) segment
pub fn parse_st(segment: &Segment) -> Result<TransactionSetHeader> {
    expect_tag(segment, "ST")?;

    let set_type = segment.field_non_empty(1).ok_or_else(|| {
        Error::Envelope(format!(
            "ST segment at line {} has no transaction set identifier",
            segment.line
        ))
    })?;

    Ok(TransactionSetHeader {
        set_type: set_type.to_string(),
        control_number: segment.field_or_empty(2).to_string(),
    })
}

/// Parse an SE (Transaction Set Trailer) segment
pub fn parse_se(segment: &Segment) -> Result<TransactionSetTrailer> {
    expect_tag(segment, "SE")?;

    Ok(TransactionSetTrailer {
        segment_count: field_usize(segment, 1)?,
        control_number: segment.field_or_empty(2).to_string(),
    })
}

/// Transaction set identifier (ST01) of a bounded transaction body, if its
/// first segment is an ST. The cheap check used by `handles`
/// implementations.
pub fn set_type_code(segments: &[Segment]) -> Option<&str> {
    segments
        .first()
        .filter(|s| s.is_tag("ST"))
        .and_then(|s| s.field_non_empty(1))
}

// ============================================================================
// Field helpers
// ============================================================================

fn expect_tag(segment: &Segment, tag: &str) -> Result<()> {
    if !segment.is_tag(tag) {
        return Err(Error::unexpected(tag, &segment.tag, segment.line));
    }
    Ok(())
}

fn field_usize(segment: &Segment, index: usize) -> Result<usize> {
    let value = segment.field_or_empty(index).trim();
    value.parse::<usize>().map_err(|_| {
        Error::field_decode(
            &segment.tag,
            index,
            value,
            segment.line,
            "expected an unsigned number",
        )
    })
}

fn field_date(segment: &Segment, index: usize, format: &str) -> Result<NaiveDate> {
    let value = segment.field_or_empty(index).trim();
    NaiveDate::parse_from_str(value, format).map_err(|_| {
        Error::field_decode(
            &segment.tag,
            index,
            value,
            segment.line,
            format!("expected a date in {format} form"),
        )
    })
}

fn field_time(segment: &Segment, index: usize) -> Result<NaiveTime> {
    let value = segment.field_or_empty(index).trim();
    let format = if value.len() >= 6 { "%H%M%S" } else { "%H%M" };
    NaiveTime::parse_from_str(value, format).map_err(|_| {
        Error::field_decode(
            &segment.tag,
            index,
            value,
            segment.line,
            "expected a time in HHMM or HHMMSS form",
        )
    })
}
