//! X12 tokenizer
//!
//! Splits raw interchange text into [`Segment`]s. Input is either CRLF/LF
//! line separated (one segment per line) or a single line in which segments
//! end with the segment terminator. The element separator is detected from
//! the interchange-open segment when present.

use crate::syntax::Delimiters;
use crate::{Error, Result, Segment};
use tracing::{debug, trace};

/// Tokenizer for X12 interchange text
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    /// Delimiters used when detection from the input is not possible
    default_delimiters: Delimiters,
}

impl Tokenizer {
    /// Create a tokenizer with conventional X12 defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tokenizer with caller-supplied fallback delimiters.
    pub fn with_delimiters(delimiters: Delimiters) -> Self {
        Self {
            default_delimiters: delimiters,
        }
    }

    /// Tokenize interchange text into segments.
    ///
    /// Blank lines are skipped. An empty or whitespace-only input yields an
    /// empty list, which callers treat as "no document".
    pub fn tokenize(&self, text: &str) -> Result<Vec<Segment>> {
        let trimmed = text.trim_start();
        let delimiters = Delimiters::detect_or(trimmed, self.default_delimiters);
        trace!(element = %delimiters.element, "tokenizing with detected delimiters");

        let mut segments = Vec::new();
        for (number, raw) in Self::split_lines(text, delimiters) {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split(delimiters.element);
            let tag = parts.next().unwrap_or("").trim();
            if tag.is_empty() {
                return Err(Error::tokenize(number, "segment without a tag"));
            }
            if !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::tokenize(
                    number,
                    format!("invalid segment tag '{tag}'"),
                ));
            }

            let fields: Vec<String> = parts.map(ToString::to_string).collect();
            segments.push(Segment::new(tag, fields, number));
        }

        debug!(count = segments.len(), "tokenized segments");
        Ok(segments)
    }

    /// Split the input into numbered raw segment lines. CRLF/LF input splits
    /// on newlines; a single-line interchange splits on the segment
    /// terminator instead.
    fn split_lines(text: &str, delimiters: Delimiters) -> Vec<(usize, String)> {
        let numbered = |parts: Vec<&str>| {
            parts
                .into_iter()
                .enumerate()
                .map(|(i, part)| (i + 1, part.trim_end_matches(delimiters.segment).to_string()))
                .collect()
        };

        if text.trim_end().contains('\n') {
            numbered(text.lines().collect())
        } else {
            numbered(text.split(delimiters.segment).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lf_separated() {
        let text = "ISA*00*TEST\nGS*SH*SENDER\nIEA*1*000000001\n";
        let segments = Tokenizer::new().tokenize(text).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].tag, "ISA");
        assert_eq!(segments[1].tag, "GS");
        assert_eq!(segments[2].tag, "IEA");
        assert_eq!(segments[1].line, 2);
    }

    #[test]
    fn test_tokenize_crlf_separated() {
        let text = "ISA*00*TEST\r\nIEA*1*000000001\r\n";
        let segments = Tokenizer::new().tokenize(text).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].fields, vec!["00", "TEST"]);
    }

    #[test]
    fn test_tokenize_single_line_anchor_terminated() {
        let text = "ISA*00*TEST~GS*SH*SENDER~IEA*1*000000001~";
        let segments = Tokenizer::new().tokenize(text).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].tag, "IEA");
        assert_eq!(segments[2].fields, vec!["1", "000000001"]);
    }

    #[test]
    fn test_tokenize_detects_separator_from_isa_offset() {
        let text = "ISA|00|TEST\nGS|SH|SENDER\n";
        let segments = Tokenizer::new().tokenize(text).unwrap();
        assert_eq!(segments[0].fields, vec!["00", "TEST"]);
        assert_eq!(segments[1].fields, vec!["SH", "SENDER"]);
    }

    #[test]
    fn test_tokenize_uses_default_without_isa() {
        let text = "HL*1**S\nHL*2*1*O\n";
        let segments = Tokenizer::new().tokenize(text).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].fields, vec!["1", "", "S"]);
    }

    #[test]
    fn test_tokenize_preserves_empty_fields() {
        let text = "HL*1**S*1\n";
        let segments = Tokenizer::new().tokenize(text).unwrap();
        assert_eq!(segments[0].fields, vec!["1", "", "S", "1"]);
    }

    #[test]
    fn test_tokenize_skips_blank_lines() {
        let text = "ISA*00*TEST\n\n\nIEA*1*1\n";
        let segments = Tokenizer::new().tokenize(text).unwrap();
        assert_eq!(segments.len(), 2);
        // Line numbers still reflect the original input
        assert_eq!(segments[1].line, 4);
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(Tokenizer::new().tokenize("").unwrap().is_empty());
        assert!(Tokenizer::new().tokenize("  \n \r\n").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_rejects_invalid_tag() {
        let err = Tokenizer::new().tokenize("ISA*00\nB@D*1\n").unwrap_err();
        match err {
            Error::Tokenize { line, .. } => assert_eq!(line, 2),
            other => panic!("Expected tokenize error, got {other:?}"),
        }
    }

    #[test]
    fn test_tokenize_custom_fallback_delimiters() {
        let delims = Delimiters {
            element: '|',
            segment: '!',
        };
        let tokenizer = Tokenizer::with_delimiters(delims);
        let segments = tokenizer.tokenize("HL|1||S!HL|2|1|O!").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].fields, vec!["2", "1", "O"]);
    }
}
