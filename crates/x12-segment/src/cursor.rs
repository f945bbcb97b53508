//! Bidirectional segment cursor
//!
//! Envelope and transaction parsers have to look past the current position
//! to find a region's end before committing, then rewind after an over-read
//! lookahead. The cursor is therefore explicit and index-addressable rather
//! than a consuming iterator.

use crate::{Error, Result, Segment};

/// A bidirectional cursor over a segment sequence
#[derive(Debug, Clone)]
pub struct SegmentCursor<'a> {
    segments: &'a [Segment],
    pos: usize,
}

impl<'a> SegmentCursor<'a> {
    /// Create a cursor positioned before the first segment.
    pub fn new(segments: &'a [Segment]) -> Self {
        Self { segments, pos: 0 }
    }

    /// Whether a call to [`next`](Self::next) would succeed.
    pub fn has_next(&self) -> bool {
        self.pos < self.segments.len()
    }

    /// Consume and return the next segment. Callers must check
    /// [`has_next`](Self::has_next) first; an exhausted cursor fails with
    /// `EndOfInput`.
    pub fn next(&mut self) -> Result<&'a Segment> {
        let segment = self
            .segments
            .get(self.pos)
            .ok_or(Error::EndOfInput { index: self.pos })?;
        self.pos += 1;
        Ok(segment)
    }

    /// Whether a call to [`previous`](Self::previous) would succeed.
    pub fn has_previous(&self) -> bool {
        self.pos > 0
    }

    /// Step back and return the segment before the current position.
    pub fn previous(&mut self) -> Result<&'a Segment> {
        if self.pos == 0 {
            return Err(Error::StartOfInput);
        }
        self.pos -= 1;
        Ok(&self.segments[self.pos])
    }

    /// Return the next segment without advancing.
    pub fn peek(&self) -> Option<&'a Segment> {
        self.segments.get(self.pos)
    }

    /// Index of the next segment to be returned by [`next`](Self::next).
    pub fn current_index(&self) -> usize {
        self.pos
    }

    /// Jump to an absolute index. `index == len` positions the cursor at
    /// end of input; anything beyond is out of bounds.
    pub fn reset(&mut self, index: usize) -> Result<()> {
        if index > self.segments.len() {
            return Err(Error::OutOfBounds {
                index,
                len: self.segments.len(),
            });
        }
        self.pos = index;
        Ok(())
    }

    /// Borrowed, non-copying view of a bounded region, handed to
    /// sub-parsers once the region's end has been located by lookahead.
    pub fn slice(&self, start: usize, end_exclusive: usize) -> Result<&'a [Segment]> {
        if start > end_exclusive || end_exclusive > self.segments.len() {
            return Err(Error::OutOfBounds {
                index: end_exclusive,
                len: self.segments.len(),
            });
        }
        Ok(&self.segments[start..end_exclusive])
    }

    /// Total number of segments under the cursor.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the underlying sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<Segment> {
        ["ISA", "GS", "ST", "SE", "GE", "IEA"]
            .iter()
            .enumerate()
            .map(|(i, tag)| Segment::new(*tag, vec![], i + 1))
            .collect()
    }

    #[test]
    fn test_next_advances_in_order() {
        let segs = segments();
        let mut cursor = SegmentCursor::new(&segs);

        assert!(cursor.has_next());
        assert_eq!(cursor.next().unwrap().tag, "ISA");
        assert_eq!(cursor.next().unwrap().tag, "GS");
        assert_eq!(cursor.current_index(), 2);
    }

    #[test]
    fn test_next_past_end_is_error() {
        let segs = segments();
        let mut cursor = SegmentCursor::new(&segs);
        cursor.reset(6).unwrap();

        assert!(!cursor.has_next());
        match cursor.next() {
            Err(Error::EndOfInput { index }) => assert_eq!(index, 6),
            other => panic!("Expected EndOfInput, got {other:?}"),
        }
    }

    #[test]
    fn test_previous_rewinds() {
        let segs = segments();
        let mut cursor = SegmentCursor::new(&segs);
        cursor.next().unwrap();
        cursor.next().unwrap();

        assert!(cursor.has_previous());
        assert_eq!(cursor.previous().unwrap().tag, "GS");
        assert_eq!(cursor.current_index(), 1);
    }

    #[test]
    fn test_previous_at_start_is_error() {
        let segs = segments();
        let mut cursor = SegmentCursor::new(&segs);

        assert!(!cursor.has_previous());
        assert!(matches!(cursor.previous(), Err(Error::StartOfInput)));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let segs = segments();
        let mut cursor = SegmentCursor::new(&segs);

        assert_eq!(cursor.peek().unwrap().tag, "ISA");
        assert_eq!(cursor.current_index(), 0);
        assert_eq!(cursor.next().unwrap().tag, "ISA");
    }

    #[test]
    fn test_reset_after_lookahead() {
        let segs = segments();
        let mut cursor = SegmentCursor::new(&segs);

        // Look ahead for SE, then rewind to where we started
        let start = cursor.current_index();
        while let Some(segment) = cursor.peek() {
            if segment.tag == "SE" {
                break;
            }
            cursor.next().unwrap();
        }
        let end = cursor.current_index();
        assert_eq!(end, 3);

        cursor.reset(start).unwrap();
        assert_eq!(cursor.next().unwrap().tag, "ISA");
    }

    #[test]
    fn test_reset_out_of_bounds() {
        let segs = segments();
        let mut cursor = SegmentCursor::new(&segs);
        assert!(matches!(
            cursor.reset(7),
            Err(Error::OutOfBounds { index: 7, len: 6 })
        ));
    }

    #[test]
    fn test_slice_is_bounded_view() {
        let segs = segments();
        let cursor = SegmentCursor::new(&segs);

        let body = cursor.slice(2, 4).unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].tag, "ST");
        assert_eq!(body[1].tag, "SE");

        assert!(cursor.slice(4, 2).is_err());
        assert!(cursor.slice(0, 7).is_err());
    }
}
