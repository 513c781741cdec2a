//! Row/column positions.
//!
//! The tree only stores byte offsets. [`LineIndex`] converts them to
//! [`Point`]s and back for editors that think in lines. Both `\n` and `\r\n`
//! end a line; columns count bytes.

use std::fmt;
use std::ops::Range;

use crate::edit::Edit;

/// Zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// Start offsets of every line of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &[u8]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.iter()
                .enumerate()
                .filter(|&(_, &b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Length of the indexed text.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Point of a byte offset. Offsets past the end clamp to the end.
    pub fn point(&self, offset: usize) -> Point {
        let offset = offset.min(self.len);
        let row = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Point {
            row,
            column: offset - self.line_starts[row],
        }
    }

    /// Byte offset of a point.
    ///
    /// A column past the end of its line clamps to the line's `\n`. Rows past
    /// the last line have no offset.
    pub fn offset(&self, point: Point) -> Option<usize> {
        let start = *self.line_starts.get(point.row)?;
        let end = self.content_end(point.row);
        Some((start + point.column).min(end))
    }

    fn content_end(&self, row: usize) -> usize {
        match self.line_starts.get(row + 1) {
            Some(&next) => next - 1,
            None => self.len,
        }
    }

    /// Byte range covered by a line, without its terminator.
    pub fn line_range(&self, row: usize, text: &[u8]) -> Option<Range<usize>> {
        let start = *self.line_starts.get(row)?;
        let mut end = self.content_end(row);
        if end > start && text.get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        Some(start..end)
    }

    /// Edit replacing the text between two points with `inserted_len` bytes.
    pub fn edit_for(&self, start: Point, end: Point, inserted_len: usize) -> Option<Edit> {
        let start = self.offset(start)?;
        let end = self.offset(end)?;
        if start > end {
            return None;
        }
        Some(Edit::replace(start..end, inserted_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const TEXT: &[u8] = b"int a;\r\nint b;\n\nx";

    #[test_case(0 => Point::new(0, 0) ; "start")]
    #[test_case(6 => Point::new(0, 6) ; "before crlf")]
    #[test_case(8 => Point::new(1, 0) ; "after crlf")]
    #[test_case(15 => Point::new(2, 0) ; "empty line")]
    #[test_case(16 => Point::new(3, 0) ; "last line")]
    #[test_case(99 => Point::new(3, 1) ; "clamped")]
    fn test_point(offset: usize) -> Point {
        LineIndex::new(TEXT).point(offset)
    }

    #[test]
    fn test_offset_round_trips_and_clamps() {
        let index = LineIndex::new(TEXT);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.offset(Point::new(1, 4)), Some(12));
        assert_eq!(index.offset(Point::new(2, 10)), Some(15));
        assert_eq!(index.offset(Point::new(3, 7)), Some(17));
        assert_eq!(index.offset(Point::new(4, 0)), None);
    }

    #[test]
    fn test_line_range_strips_crlf() {
        let index = LineIndex::new(TEXT);
        assert_eq!(index.line_range(0, TEXT), Some(0..6));
        assert_eq!(index.line_range(1, TEXT), Some(8..14));
        assert_eq!(index.line_range(2, TEXT), Some(15..15));
    }

    #[test]
    fn test_edit_for() {
        let index = LineIndex::new(TEXT);
        let edit = index
            .edit_for(Point::new(1, 4), Point::new(1, 5), 3)
            .unwrap();
        assert_eq!(edit, Edit::new(12, 13, 15));
        assert_eq!(index.edit_for(Point::new(1, 0), Point::new(0, 0), 0), None);
    }
}
