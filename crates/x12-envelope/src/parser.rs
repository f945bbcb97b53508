//! Envelope boundary state machine
//!
//! Walks the segment sequence through BeforeInterchange, InGroup, and
//! InTransaction states using a bidirectional cursor: each transaction
//! body is located by looking ahead to its SE trailer, then handed to the
//! dispatcher as a bounded slice.
//!
//! Structural errors (a boundary tag missing or in an impossible position)
//! abort the parse immediately. Trailer count and control-number
//! mismatches do not change where the boundaries are, so they are logged
//! and tolerated; full compliance validation is out of scope.

use tracing::{debug, warn};
use x12_segment::{SegmentCursor, Tokenizer};

use crate::dispatch::TransactionDispatcher;
use crate::document::{Document, Group, TransactionSet};
use crate::envelopes::{parse_ge, parse_gs, parse_iea, parse_isa, GroupHeader};
use crate::{Error, Result};

/// Parser for one complete X12 interchange
#[derive(Debug)]
pub struct EnvelopeParser {
    dispatcher: TransactionDispatcher,
    tokenizer: Tokenizer,
}

impl EnvelopeParser {
    /// Create a parser around a caller-configured dispatcher.
    pub fn new(dispatcher: TransactionDispatcher) -> Self {
        Self {
            dispatcher,
            tokenizer: Tokenizer::new(),
        }
    }

    /// Create a parser with a caller-supplied tokenizer (custom fallback
    /// delimiters).
    pub fn with_tokenizer(dispatcher: TransactionDispatcher, tokenizer: Tokenizer) -> Self {
        Self {
            dispatcher,
            tokenizer,
        }
    }

    /// Parse a complete interchange.
    ///
    /// Empty (or whitespace-only) input yields `Ok(None)`. Any other input
    /// must open with ISA and close with IEA, or the parse fails with a
    /// structural error. Recoverable errors inside transaction bodies are
    /// collected on the typed sets, never raised here.
    pub fn parse(&self, text: &str) -> Result<Option<Document>> {
        let segments = self.tokenizer.tokenize(text)?;
        if segments.is_empty() {
            debug!("empty input, no document");
            return Ok(None);
        }

        let mut cursor = SegmentCursor::new(&segments);

        let opening = cursor.next()?;
        if !opening.is_tag("ISA") {
            return Err(Error::unexpected("ISA", &opening.tag, opening.line));
        }
        let header = parse_isa(opening)?;

        let mut groups = Vec::new();
        let trailer = loop {
            let Some(next) = cursor.peek() else {
                return Err(Error::UnexpectedEndOfInput {
                    expected: "IEA".to_string(),
                });
            };
            match next.tag.as_str() {
                "IEA" => {
                    let iea = cursor.next()?;
                    break parse_iea(iea)?;
                }
                "GS" => groups.push(self.parse_group(&mut cursor)?),
                found => return Err(Error::unexpected("GS or IEA", found, next.line)),
            }
        };

        if cursor.has_next() {
            warn!("content after IEA ignored");
        }
        if trailer.group_count != groups.len() {
            warn!(
                declared = trailer.group_count,
                actual = groups.len(),
                "IEA group count mismatch"
            );
        }
        if trailer.control_number != header.control_number {
            warn!(
                isa = %header.control_number,
                iea = %trailer.control_number,
                "interchange control number mismatch"
            );
        }

        Ok(Some(Document {
            header,
            trailer,
            groups,
        }))
    }

    fn parse_group(&self, cursor: &mut SegmentCursor<'_>) -> Result<Group> {
        let gs = cursor.next()?;
        let header = parse_gs(gs)?;
        debug!(control = %header.control_number, code = %header.functional_code, "group open");

        let mut transaction_sets = Vec::new();
        let trailer = loop {
            let Some(next) = cursor.peek() else {
                return Err(Error::UnexpectedEndOfInput {
                    expected: "GE".to_string(),
                });
            };
            match next.tag.as_str() {
                "GE" => {
                    let ge = cursor.next()?;
                    break parse_ge(ge)?;
                }
                "ST" => {
                    if let Some(set) = self.parse_transaction(cursor, &header)? {
                        transaction_sets.push(set);
                    }
                }
                found => return Err(Error::unexpected("ST or GE", found, next.line)),
            }
        };

        if trailer.set_count != transaction_sets.len() {
            // Sets consumed by the unhandled sink still counted toward GE01
            // on the wire, so this stays informational.
            debug!(
                declared = trailer.set_count,
                kept = transaction_sets.len(),
                "GE transaction set count differs from kept sets"
            );
        }
        if trailer.control_number != header.control_number {
            warn!(
                gs = %header.control_number,
                ge = %trailer.control_number,
                "group control number mismatch"
            );
        }

        Ok(Group {
            header,
            trailer,
            transaction_sets,
        })
    }

    /// Locate the transaction's SE trailer by lookahead, then hand the
    /// bounded ST..=SE slice to the dispatcher.
    fn parse_transaction(
        &self,
        cursor: &mut SegmentCursor<'_>,
        group: &GroupHeader,
    ) -> Result<Option<Box<dyn TransactionSet>>> {
        let start = cursor.current_index();
        cursor.next()?; // the ST marker, already peeked by the caller

        loop {
            let Some(next) = cursor.peek() else {
                return Err(Error::UnexpectedEndOfInput {
                    expected: "SE".to_string(),
                });
            };
            match next.tag.as_str() {
                "SE" => {
                    cursor.next()?;
                    break;
                }
                "ST" => return Err(Error::NestedTransactionOpen { line: next.line }),
                "GE" => return Err(Error::GroupCloseInTransaction { line: next.line }),
                "GS" | "IEA" | "ISA" => {
                    return Err(Error::unexpected("SE", &next.tag, next.line));
                }
                _ => {
                    cursor.next()?;
                }
            }
        }

        let end = cursor.current_index();
        let body = cursor.slice(start, end)?;

        self.dispatcher.dispatch(body, group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::{GenericTransactionSet, GenericTransactionSetParser};

    fn generic_parser() -> EnvelopeParser {
        let mut dispatcher = TransactionDispatcher::new();
        dispatcher.register(Box::new(GenericTransactionSetParser::new()));
        EnvelopeParser::new(dispatcher)
    }

    fn interchange(body: &str) -> String {
        format!(
            "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       \
*240105*1015*U*00401*000000001*0*P*>\n{body}IEA*1*000000001\n"
        )
    }

    #[test]
    fn test_single_group_single_set() {
        let text = interchange(
            "GS*SH*APP1*APP2*20240105*1015*17*X*004010\n\
ST*856*0001\n\
BSN*00*SHIP1*20240105*1015\n\
TD1*CTN25*2\n\
SE*4*0001\n\
GE*1*17\n",
        );

        let document = generic_parser().parse(&text).unwrap().unwrap();
        assert_eq!(document.groups.len(), 1);
        assert_eq!(document.header.sender.id, "SENDER");
        assert_eq!(document.trailer.group_count, 1);

        let group = &document.groups[0];
        assert_eq!(group.header.functional_code, "SH");
        assert_eq!(group.transaction_sets.len(), 1);

        // Body equals the segments between ST and SE, in order
        let set = group.transaction_sets[0]
            .as_any()
            .downcast_ref::<GenericTransactionSet>()
            .unwrap();
        let tags: Vec<&str> = set.segments.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, vec!["BSN", "TD1"]);
        assert_eq!(set.control_number, "0001");
    }

    #[test]
    fn test_empty_input_is_no_document() {
        assert!(generic_parser().parse("").unwrap().is_none());
        assert!(generic_parser().parse("  \n\n").unwrap().is_none());
    }

    #[test]
    fn test_interchange_open_must_be_first() {
        let err = generic_parser()
            .parse("GS*SH*A*B*20240105*1015*17\n")
            .unwrap_err();
        match err {
            Error::UnexpectedSegment {
                expected, found, ..
            } => {
                assert_eq!(expected, "ISA");
                assert_eq!(found, "GS");
            }
            other => panic!("Expected structural error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_interchange_close_is_fatal() {
        let text = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       \
*240105*1015*U*00401*000000001*0*P*>\nGS*SH*A*B*20240105*1015*17\nGE*0*17\n";

        let err = generic_parser().parse(text).unwrap_err();
        match err {
            Error::UnexpectedEndOfInput { expected } => assert_eq!(expected, "IEA"),
            other => panic!("Expected missing IEA, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_groups_is_legal() {
        let text = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       \
*240105*1015*U*00401*000000001*0*P*>\nIEA*0*000000001\n";

        let document = generic_parser().parse(text).unwrap().unwrap();
        assert!(document.groups.is_empty());
    }

    #[test]
    fn test_nested_transaction_open_is_fatal() {
        let text = interchange(
            "GS*SH*A*B*20240105*1015*17\n\
ST*856*0001\n\
ST*856*0002\n\
SE*2*0002\n\
GE*1*17\n",
        );

        let err = generic_parser().parse(&text).unwrap_err();
        assert!(matches!(err, Error::NestedTransactionOpen { line: 4 }));
    }

    #[test]
    fn test_group_close_inside_transaction_is_fatal() {
        let text = interchange(
            "GS*SH*A*B*20240105*1015*17\n\
ST*856*0001\n\
BSN*00*S1*20240105*1015\n\
GE*1*17\n",
        );

        let err = generic_parser().parse(&text).unwrap_err();
        assert!(matches!(err, Error::GroupCloseInTransaction { .. }));
    }

    #[test]
    fn test_multiple_groups() {
        let text = interchange(
            "GS*SH*A*B*20240105*1015*17\n\
ST*856*0001\nSE*2*0001\n\
GE*1*17\n\
GS*IN*A*B*20240105*1015*18\n\
ST*810*0002\nSE*2*0002\n\
GE*1*18\n",
        );

        let document = generic_parser().parse(&text).unwrap().unwrap();
        assert_eq!(document.groups.len(), 2);
        assert_eq!(document.groups[1].header.functional_code, "IN");
        assert_eq!(document.transaction_set_count(), 2);
        assert_eq!(document.groups[1].transaction_sets[0].set_type(), "810");
    }

    #[test]
    fn test_unclaimed_sets_are_omitted() {
        // No parsers registered at all: sets vanish from the document
        let parser = EnvelopeParser::new(TransactionDispatcher::new());
        let text = interchange(
            "GS*SH*A*B*20240105*1015*17\n\
ST*856*0001\nSE*2*0001\n\
GE*1*17\n",
        );

        let document = parser.parse(&text).unwrap().unwrap();
        assert_eq!(document.transaction_set_count(), 0);
    }

    #[test]
    fn test_trailer_mismatches_are_tolerated() {
        // IEA declares two groups but carries one; control numbers differ
        let text = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       \
*240105*1015*U*00401*000000001*0*P*>\n\
GS*SH*A*B*20240105*1015*17\nGE*0*99\nIEA*2*MISMATCH\n";

        let document = generic_parser().parse(text).unwrap().unwrap();
        assert_eq!(document.groups.len(), 1);
        assert_eq!(document.trailer.group_count, 2);
    }

    #[test]
    fn test_single_line_interchange() {
        let text = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       \
*240105*1015*U*00401*000000001*0*P*>~GS*SH*A*B*20240105*1015*17~\
ST*856*0001~SE*2*0001~GE*1*17~IEA*1*000000001~";

        let document = generic_parser().parse(text).unwrap().unwrap();
        assert_eq!(document.groups.len(), 1);
        assert_eq!(document.transaction_set_count(), 1);
    }
}
