//! X12 delimiter definitions and detection
//!
//! X12 carries no service string advice; the element separator is whatever
//! character follows the ISA tag, at a fixed offset in the interchange-open
//! segment. Everything else falls back to conventional defaults.

/// Default X12 delimiters (when no ISA is available for detection)
pub const DEFAULT_ELEMENT_SEPARATOR: char = '*';
pub const DEFAULT_SEGMENT_TERMINATOR: char = '~';

/// Byte offset of the element separator inside an ISA segment ("ISA*...")
const ISA_SEPARATOR_OFFSET: usize = 3;

/// Delimiters used for tokenizing X12 text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Element separator (default '*')
    pub element: char,
    /// Segment terminator (default '~'), used when the input is a single
    /// anchor-terminated line rather than CRLF/LF separated
    pub segment: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            element: DEFAULT_ELEMENT_SEPARATOR,
            segment: DEFAULT_SEGMENT_TERMINATOR,
        }
    }
}

impl Delimiters {
    /// Detect the element separator from the fixed offset of an
    /// interchange-open segment. Returns `None` when the text does not
    /// start with `ISA` or is too short to carry a separator.
    pub fn from_interchange_open(text: &str) -> Option<Self> {
        if !text.starts_with("ISA") {
            return None;
        }

        let element = text.chars().nth(ISA_SEPARATOR_OFFSET)?;
        if element.is_ascii_alphanumeric() || element == '\r' || element == '\n' {
            return None;
        }

        Some(Self {
            element,
            segment: DEFAULT_SEGMENT_TERMINATOR,
        })
    }

    /// Detect delimiters from the interchange-open segment, falling back to
    /// the supplied default when detection is not possible.
    pub fn detect_or(text: &str, default: Self) -> Self {
        Self::from_interchange_open(text).unwrap_or(default)
    }
}
