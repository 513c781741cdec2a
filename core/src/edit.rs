//! Text edits and how they move byte offsets.
//!
//! An [`Edit`] replaces `[start_byte, old_end_byte)` of the old text with
//! text that ends at `new_end_byte` in the new one. The same descriptor
//! drives three things:
//!
//! - validation against the old text length;
//! - [`Edit::map_offset`], which moves an old offset to where it lands in the
//!   new text;
//! - [`Edit::touches`], the dirty test deciding whether a node can be reused.

use crate::error::InvalidEdit;

/// A single replace-range edit, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct Edit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
}

impl Edit {
    pub const fn new(start_byte: usize, old_end_byte: usize, new_end_byte: usize) -> Self {
        Self {
            start_byte,
            old_end_byte,
            new_end_byte,
        }
    }

    /// Edit that replaces `range` of the old text with `inserted_len` bytes.
    pub fn replace(range: std::ops::Range<usize>, inserted_len: usize) -> Self {
        Self::new(range.start, range.end, range.start + inserted_len)
    }

    /// Checks the descriptor against the length of the text it edits.
    pub fn validate(&self, old_len: usize) -> Result<(), InvalidEdit> {
        if self.start_byte > self.old_end_byte {
            return Err(InvalidEdit::StartAfterOldEnd {
                start: self.start_byte,
                old_end: self.old_end_byte,
            });
        }
        if self.start_byte > self.new_end_byte {
            return Err(InvalidEdit::StartAfterNewEnd {
                start: self.start_byte,
                new_end: self.new_end_byte,
            });
        }
        if self.old_end_byte > old_len {
            return Err(InvalidEdit::OutOfBounds {
                old_end: self.old_end_byte,
                len: old_len,
            });
        }
        Ok(())
    }

    /// Length of the text after applying this edit to `old_len` bytes.
    ///
    /// Only meaningful for an edit that passed [`Edit::validate`].
    pub const fn new_len(&self, old_len: usize) -> usize {
        old_len - self.old_end_byte + self.new_end_byte
    }

    /// Where an offset of the old text lands in the new text.
    ///
    /// Offsets up to `start_byte` stay put, offsets from `old_end_byte` on
    /// shift by the size delta, offsets inside the replaced range collapse
    /// onto `new_end_byte`.
    #[inline]
    pub const fn map_offset(&self, offset: usize) -> usize {
        if offset <= self.start_byte {
            offset
        } else if offset >= self.old_end_byte {
            offset - self.old_end_byte + self.new_end_byte
        } else {
            self.new_end_byte
        }
    }

    /// Whether the old range `[start, end]` (inclusive) touches the edit.
    ///
    /// Inclusive on both sides: text inserted right after a token can extend
    /// it, and text inserted right before one can change its padding.
    #[inline]
    pub const fn touches(&self, start: usize, end: usize) -> bool {
        start <= self.old_end_byte && self.start_byte <= end
    }

    /// Single edit equivalent to applying `self` and then `next`.
    ///
    /// `next` is expressed in the coordinates of the text `self` produced.
    pub fn compose(&self, next: &Edit) -> Edit {
        let start = self.start_byte.min(next.start_byte);
        // End of the union of both changed regions, in intermediate coordinates.
        let middle_end = self.new_end_byte.max(next.old_end_byte);
        let old_end = if next.old_end_byte > self.new_end_byte {
            next.old_end_byte - self.new_end_byte + self.old_end_byte
        } else {
            self.old_end_byte
        };
        let new_end = middle_end - next.old_end_byte + next.new_end_byte;
        Edit::new(start, old_end, new_end)
    }

    /// Applies the edit to `old`, with `replacement` as the new bytes.
    pub fn apply(&self, old: &[u8], replacement: &[u8]) -> Result<Vec<u8>, InvalidEdit> {
        self.validate(old.len())?;
        if replacement.len() != self.new_end_byte - self.start_byte {
            return Err(InvalidEdit::LengthMismatch {
                expected: self.new_end_byte - self.start_byte,
                found: replacement.len(),
            });
        }
        let mut out = Vec::with_capacity(self.new_len(old.len()));
        out.extend_from_slice(&old[..self.start_byte]);
        out.extend_from_slice(replacement);
        out.extend_from_slice(&old[self.old_end_byte..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Edit::new(3, 2, 5) => matches Err(InvalidEdit::StartAfterOldEnd { .. }) ; "start after old end")]
    #[test_case(Edit::new(3, 4, 2) => matches Err(InvalidEdit::StartAfterNewEnd { .. }) ; "start after new end")]
    #[test_case(Edit::new(3, 11, 4) => matches Err(InvalidEdit::OutOfBounds { .. }) ; "past the end")]
    #[test_case(Edit::new(10, 10, 12) => matches Ok(()) ; "append")]
    #[test_case(Edit::new(0, 10, 0) => matches Ok(()) ; "delete everything")]
    fn test_validate(edit: Edit) -> Result<(), InvalidEdit> {
        edit.validate(10)
    }

    #[test]
    fn test_map_offset() {
        // "hello world" -> "hello big world": insert "big " at 6.
        let edit = Edit::new(6, 6, 10);
        assert_eq!(edit.map_offset(0), 0);
        assert_eq!(edit.map_offset(6), 6);
        assert_eq!(edit.map_offset(7), 11);

        // Delete bytes 2..5.
        let edit = Edit::new(2, 5, 2);
        assert_eq!(edit.map_offset(3), 2);
        assert_eq!(edit.map_offset(5), 2);
        assert_eq!(edit.map_offset(9), 6);
    }

    #[test]
    fn test_touches_is_inclusive() {
        let edit = Edit::new(5, 7, 7);
        assert!(edit.touches(7, 9));
        assert!(edit.touches(0, 5));
        assert!(!edit.touches(0, 4));
        assert!(!edit.touches(8, 12));
    }

    #[test]
    fn test_apply() {
        let edit = Edit::replace(6..11, 4);
        assert_eq!(edit.apply(b"hello world", b"rust").unwrap(), b"hello rust");
        assert!(matches!(
            edit.apply(b"hello world", b"x"),
            Err(InvalidEdit::LengthMismatch { expected: 4, found: 1 })
        ));
    }

    fn apply_str(text: &str, edit: Edit, replacement: &str) -> String {
        String::from_utf8(edit.apply(text.as_bytes(), replacement.as_bytes()).unwrap()).unwrap()
    }

    #[test_case("abcdefghij", Edit::replace(2..4, 3), "XYZ", Edit::replace(7..9, 0), "" ; "disjoint, second after first")]
    #[test_case("abcdefghij", Edit::replace(6..8, 1), "X", Edit::replace(1..2, 4), "1234" ; "disjoint, second before first")]
    #[test_case("abcdefghij", Edit::replace(3..5, 4), "WXYZ", Edit::replace(4..9, 1), "-" ; "overlapping")]
    #[test_case("abcdefghij", Edit::replace(3..3, 2), "++", Edit::replace(3..5, 0), "" ; "insert then delete it")]
    fn test_compose_matches_sequential_application(
        text: &str,
        first: Edit,
        first_text: &str,
        second: Edit,
        second_text: &str,
    ) {
        let middle = apply_str(text, first, first_text);
        let expected = apply_str(&middle, second, second_text);

        let combined = first.compose(&second);
        combined.validate(text.len()).unwrap();
        assert_eq!(combined.new_len(text.len()), expected.len());
        // Outside the combined range both texts agree.
        assert_eq!(
            &text[..combined.start_byte],
            &expected[..combined.start_byte]
        );
        assert_eq!(
            &text[combined.old_end_byte..],
            &expected[combined.new_end_byte..]
        );
    }
}
