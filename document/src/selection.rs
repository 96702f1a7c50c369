//! Multi-cursor selections. A `SelectionRange` is `{anchor, head}`, both
//! clamped to `[0, totalLength]`; `SelectionState` is a non-empty ordered
//! list of ranges plus a primary index, the same shape as the teacher's
//! `Cursor`/selection pair but flattened to the spec's simpler two-field
//! range (no sticky column, no selection-mode toggle).

use crate::range::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SelectionRange {
    pub anchor: usize,
    pub head: usize,
}

impl SelectionRange {
    pub fn new(anchor: usize, head: usize) -> SelectionRange {
        SelectionRange { anchor, head }
    }

    pub fn caret(pos: usize) -> SelectionRange {
        SelectionRange {
            anchor: pos,
            head: pos,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn as_range(&self) -> Range<usize> {
        Range::new(self.start(), self.end())
    }

    fn clamped(&self, total_length: usize) -> SelectionRange {
        SelectionRange {
            anchor: self.anchor.min(total_length),
            head: self.head.min(total_length),
        }
    }

    /// Shift this range by a byte delta applied at `at`, as if `byte_len`
    /// bytes were inserted (positive) or removed (negative) there. Used by
    /// the reducer to keep selections coherent across an edit.
    fn shift(&self, at: usize, delta: i64) -> SelectionRange {
        let shift_one = |pos: usize| -> usize {
            if pos < at {
                pos
            } else if delta >= 0 {
                pos + delta as usize
            } else {
                let removed = (-delta) as usize;
                if pos <= at + removed {
                    at
                } else {
                    pos - removed
                }
            }
        };

        SelectionRange {
            anchor: shift_one(self.anchor),
            head: shift_one(self.head),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    ranges: Vec<SelectionRange>,
    primary_index: usize,
}

impl SelectionState {
    pub fn single(range: SelectionRange) -> SelectionState {
        SelectionState {
            ranges: vec![range],
            primary_index: 0,
        }
    }

    pub fn initial() -> SelectionState {
        SelectionState::single(SelectionRange::caret(0))
    }

    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    pub fn primary(&self) -> SelectionRange {
        self.ranges[self.primary_index]
    }

    pub fn primary_index(&self) -> usize {
        self.primary_index
    }

    /// Build a new normalized selection from caller-supplied ranges: clamps
    /// every anchor/head into `[0, total_length]`, dedupes exact-duplicate
    /// ranges (keeping the first occurrence's position), and remaps
    /// `primary_index` onto the deduped list. Never produces an empty
    /// selection — an empty input keeps a single caret at 0.
    pub fn normalized(
        ranges: &[SelectionRange],
        primary_index: usize,
        total_length: usize,
    ) -> SelectionState {
        if ranges.is_empty() {
            return SelectionState::single(SelectionRange::caret(0));
        }

        let clamped: Vec<SelectionRange> =
            ranges.iter().map(|r| r.clamped(total_length)).collect();
        let primary_index = primary_index.min(clamped.len() - 1);
        let primary_range = clamped[primary_index];

        let mut deduped: Vec<SelectionRange> = Vec::with_capacity(clamped.len());
        for range in clamped {
            if !deduped.contains(&range) {
                deduped.push(range);
            }
        }
        let primary_index = deduped
            .iter()
            .position(|r| *r == primary_range)
            .unwrap_or(0);

        SelectionState {
            ranges: deduped,
            primary_index,
        }
    }

    /// Clamp every range's anchor/head into `[0, total_length]`, keeping
    /// ordering and primary index. Used after a delete shrinks the document.
    pub fn clamp_to(&self, total_length: usize) -> SelectionState {
        let ranges = self
            .ranges
            .iter()
            .map(|r| r.clamped(total_length))
            .collect();
        SelectionState {
            ranges,
            primary_index: self.primary_index,
        }
    }

    /// Shift every range as if `byte_len` bytes were inserted at `at` (or, if
    /// negative, removed).
    pub fn shift(&self, at: usize, delta: i64) -> SelectionState {
        let ranges = self.ranges.iter().map(|r| r.shift(at, delta)).collect();
        SelectionState {
            ranges,
            primary_index: self.primary_index,
        }
    }

    pub fn is_equal_to(&self, other: &SelectionState) -> bool {
        self.ranges == other.ranges && self.primary_index == other.primary_index
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize_clamps_and_dedupes_primary() {
        let s = SelectionState::normalized(&[SelectionRange::caret(100)], 5, 10);
        assert_eq!(10, s.primary().anchor);
        assert_eq!(0, s.primary_index());
    }

    #[test]
    fn shift_moves_ranges_after_insert_point() {
        let s = SelectionState::single(SelectionRange::caret(5));
        let shifted = s.shift(0, 3);
        assert_eq!(8, shifted.primary().anchor);
    }

    #[test]
    fn shift_collapses_onto_delete_point() {
        let s = SelectionState::single(SelectionRange::caret(8));
        let shifted = s.shift(2, -10);
        assert_eq!(2, shifted.primary().anchor);
    }

    #[test]
    fn normalize_dedupes_identical_ranges_and_remaps_primary() {
        let s = SelectionState::normalized(
            &[
                SelectionRange::caret(3),
                SelectionRange::caret(3),
                SelectionRange::new(1, 5),
            ],
            2,
            10,
        );
        assert_eq!(2, s.ranges().len());
        assert_eq!(SelectionRange::new(1, 5), s.primary());
        assert_eq!(1, s.primary_index());
    }

    #[test]
    fn empty_ranges_fall_back_to_single_caret() {
        let s = SelectionState::normalized(&[], 0, 100);
        assert_eq!(1, s.ranges().len());
        assert!(s.primary().is_caret());
    }
}
