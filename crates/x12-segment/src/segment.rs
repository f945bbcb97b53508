//! Segment model
//!
//! A segment is one tagged, delimiter-separated line of the wire format.
//! Segments are immutable once tokenized; downstream components only ever
//! read them.

use serde::{Deserialize, Serialize};

/// A tokenized X12 segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment tag (e.g., "ISA", "HL", "LIN")
    pub tag: String,
    /// Ordered field values following the tag; values may be empty
    pub fields: Vec<String>,
    /// One-based source line of the segment
    pub line: usize,
}

impl Segment {
    /// Create a new segment.
    pub fn new(tag: impl Into<String>, fields: Vec<String>, line: usize) -> Self {
        Self {
            tag: tag.into(),
            fields,
            line,
        }
    }

    /// One-based field accessor matching X12 element numbering:
    /// `field(1)` is the first element after the tag. Returns `None` when
    /// the element is absent.
    pub fn field(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.fields.get(index - 1).map(String::as_str)
    }

    /// One-based field accessor returning `""` for absent elements.
    pub fn field_or_empty(&self, index: usize) -> &str {
        self.field(index).unwrap_or("")
    }

    /// One-based field accessor treating an empty value as absent.
    pub fn field_non_empty(&self, index: usize) -> Option<&str> {
        self.field(index).filter(|v| !v.is_empty())
    }

    /// Whether this segment carries the given tag.
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Number of field values following the tag.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag)?;
        for field in &self.fields {
            write!(f, "*{field}")?;
        }
        Ok(())
    }
}
