//! The secondary index: a persistent order-statistic tree of line byte
//! lengths, plus the dirty-range bookkeeping and eager/lazy maintenance
//! strategies described in the spec.
//!
//! The underlying [`tree::LineTree`] derives every byte offset from subtree
//! aggregates rather than storing it absolutely per node (the same choice
//! the piece table makes for piece positions), so both maintenance
//! strategies below perform the identical O(log n + touched-lines) tree
//! surgery on every edit — there is no downstream node whose cached offset
//! would otherwise need walking. The eager/lazy distinction therefore lives
//! entirely in whether a [`DirtyRange`] is recorded: eager reconciles
//! (and bumps `last_reconciled_version`) on every edit; lazy defers that
//! bookkeeping into `dirty_ranges` for the store's background reconciler to
//! clear later, which still matters for anything hung off "this range
//! changed since the last reconcile" (e.g. an embedder's syntax-highlight or
//! soft-wrap cache) even though the index's own line boundaries are already
//! correct the moment the edit lands.

mod tree;

use tree::LineTree;

/// `{startLine, endLine (None = to end), offsetDelta, createdAtVersion}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRange {
    pub start_line: u64,
    pub end_line: Option<u64>,
    pub offset_delta: i64,
    pub created_at_version: u64,
}

impl DirtyRange {
    fn contains(&self, line: u64) -> bool {
        line >= self.start_line && self.end_line.map_or(true, |e| line <= e)
    }
}

/// `{line, startOffset, byteLen}` describing one line as the index
/// currently has it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub line: u64,
    pub start_offset: u64,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineIndexState {
    tree: LineTree,
    line_count: u64,
    dirty_ranges: Vec<DirtyRange>,
    last_reconciled_version: u64,
    rebuild_pending: bool,
}

impl LineIndexState {
    /// An empty document has `lineCount = 1` and no backing tree root.
    pub fn empty() -> LineIndexState {
        LineIndexState {
            tree: LineTree::new(),
            line_count: 1,
            dirty_ranges: Vec::new(),
            last_reconciled_version: 0,
            rebuild_pending: false,
        }
    }

    pub fn from_text(text: &str) -> LineIndexState {
        let mut tree = LineTree::new();
        for (i, len) in split_line_lengths(text.as_bytes()).into_iter().enumerate() {
            tree.insert(i as u64, len);
        }
        let line_count = tree.count().max(1);
        LineIndexState {
            tree,
            line_count,
            dirty_ranges: Vec::new(),
            last_reconciled_version: 0,
            rebuild_pending: false,
        }
    }

    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    pub fn last_reconciled_version(&self) -> u64 {
        self.last_reconciled_version
    }

    pub fn rebuild_pending(&self) -> bool {
        self.rebuild_pending
    }

    pub fn dirty_ranges(&self) -> &[DirtyRange] {
        &self.dirty_ranges
    }

    pub fn is_line_dirty(&self, line: u64) -> bool {
        self.dirty_ranges.iter().any(|r| r.contains(line))
    }

    pub fn offset_delta_for_line(&self, line: u64) -> i64 {
        self.dirty_ranges
            .iter()
            .filter(|r| r.contains(line))
            .map(|r| r.offset_delta)
            .sum()
    }

    pub fn find_line_at_position(&self, byte_offset: u64) -> LineInfo {
        let (line, start_offset, byte_len) = self.tree.find_at_offset(byte_offset);
        LineInfo {
            line,
            start_offset,
            byte_len,
        }
    }

    pub fn find_line_by_number(&self, line: u64) -> Option<LineInfo> {
        if self.tree.count() == 0 {
            return (line == 0).then_some(LineInfo {
                line: 0,
                start_offset: 0,
                byte_len: 0,
            });
        }
        let byte_len = self.tree.get(line)?;
        let start_offset = self.tree.start_offset(line)?;
        Some(LineInfo {
            line,
            start_offset,
            byte_len,
        })
    }

    pub fn get_line_start_offset(&self, line: u64) -> Option<u64> {
        self.find_line_by_number(line).map(|l| l.start_offset)
    }

    pub fn get_line_range(&self, line: u64) -> Option<crate::range::Range<u64>> {
        self.find_line_by_number(line)
            .map(|l| crate::range::Range::new(l.start_offset, l.start_offset + l.byte_len))
    }

    /// Same as [`Self::get_line_range`]: because the tree is always kept
    /// structurally precise (see module docs), there is no separate
    /// pending-delta application to perform. Kept as a distinct method for
    /// API parity with the spec's contract.
    pub fn get_line_range_precise(&self, line: u64) -> Option<crate::range::Range<u64>> {
        self.get_line_range(line)
    }
}

/// Decompose `bytes` into per-line byte lengths, each including its own
/// terminator (`\n`, `\r\n`, or bare `\r`); the final fragment has no
/// terminator iff `bytes` doesn't end with one. Always yields at least one
/// entry (length 0 for empty input).
fn split_line_lengths(bytes: &[u8]) -> Vec<u64> {
    let mut lens = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lens.push((i + 1 - start) as u64);
                start = i + 1;
                i += 1;
            }
            b'\r' => {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    lens.push((i + 2 - start) as u64);
                    start = i + 2;
                    i += 2;
                } else {
                    lens.push((i + 1 - start) as u64);
                    start = i + 1;
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    lens.push((bytes.len() - start) as u64);
    lens
}

fn ensure_real_root(tree: &mut LineTree) {
    if tree.count() == 0 {
        tree.insert(0, 0);
    }
}

/// Splice `text` into the tree at `at_byte`. Returns the inclusive line-rank
/// range touched by the edit.
fn mutate_insert(tree: &mut LineTree, at_byte: u64, text: &str) -> (u64, u64) {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        let (rank, _, _) = tree.find_at_offset(at_byte);
        return (rank, rank);
    }

    ensure_real_root(tree);
    let (line_rank, line_start, old_len) = tree.find_at_offset(at_byte);
    let local = at_byte - line_start;
    let suffix_len = old_len - local;

    let parts = split_line_lengths(bytes);
    tree.remove(line_rank);

    if parts.len() == 1 {
        tree.insert(line_rank, local + parts[0] + suffix_len);
        (line_rank, line_rank)
    } else {
        let last = parts.len() - 1;
        tree.insert(line_rank, local + parts[0]);
        for (i, &p) in parts[1..last].iter().enumerate() {
            tree.insert(line_rank + 1 + i as u64, p);
        }
        tree.insert(line_rank + last as u64, parts[last] + suffix_len);
        (line_rank, line_rank + last as u64)
    }
}

/// Collapse the byte range `[start, end)` out of the tree. Returns the
/// (single) line rank the merged remainder now lives at.
fn mutate_delete(tree: &mut LineTree, start: u64, end: u64) -> (u64, u64) {
    if start >= end {
        let (rank, _, _) = tree.find_at_offset(start);
        return (rank, rank);
    }

    let (rank_s, line_start_s, _len_s) = tree.find_at_offset(start);
    let (rank_e, line_start_e, len_e) = tree.find_at_offset(end);

    let prefix_len = start - line_start_s;
    let suffix_len = (line_start_e + len_e) - end;

    for _ in 0..(rank_e - rank_s) {
        tree.remove(rank_s + 1);
    }

    tree.set_len(rank_s, prefix_len + suffix_len);
    (rank_s, rank_s)
}

fn push_dirty(ranges: &mut Vec<DirtyRange>, new_range: DirtyRange) {
    ranges.push(new_range);
    ranges.sort_by_key(|r| r.start_line);
    merge_dirty_ranges(ranges);
}

/// `mergeDirtyRanges`: combine overlapping/adjacent spans, summing deltas on
/// the overlap. Assumes `ranges` is sorted by `start_line`.
fn merge_dirty_ranges(ranges: &mut Vec<DirtyRange>) {
    let mut merged: Vec<DirtyRange> = Vec::with_capacity(ranges.len());
    for r in ranges.drain(..) {
        if let Some(last) = merged.last_mut() {
            let last_end = last.end_line.unwrap_or(u64::MAX);
            let adjacent_or_overlapping = last_end == u64::MAX || r.start_line <= last_end + 1;
            if adjacent_or_overlapping {
                last.end_line = match (last.end_line, r.end_line) {
                    (None, _) | (_, None) => None,
                    (Some(a), Some(b)) => Some(a.max(b)),
                };
                last.offset_delta += r.offset_delta;
                last.created_at_version = last.created_at_version.max(r.created_at_version);
                continue;
            }
        }
        merged.push(r);
    }
    *ranges = merged;
}

/// Reconcile every dirty range overlapping `[from_line, to_line]`, trimming
/// partially-overlapping ranges down to the part outside the window.
fn reconcile_window(ranges: &[DirtyRange], from_line: u64, to_line: u64) -> Vec<DirtyRange> {
    let mut out = Vec::with_capacity(ranges.len());
    for r in ranges {
        let r_end = r.end_line.unwrap_or(u64::MAX);
        if r_end < from_line || r.start_line > to_line {
            out.push(*r);
            continue;
        }
        if r.start_line < from_line {
            out.push(DirtyRange {
                start_line: r.start_line,
                end_line: Some(from_line - 1),
                offset_delta: r.offset_delta,
                created_at_version: r.created_at_version,
            });
        }
        if r_end > to_line {
            out.push(DirtyRange {
                start_line: to_line + 1,
                end_line: r.end_line,
                offset_delta: r.offset_delta,
                created_at_version: r.created_at_version,
            });
        }
    }
    out
}

/// A maintenance strategy the reducer holds as configuration (§4.2).
pub trait LineIndexStrategy: std::fmt::Debug {
    fn insert(&self, state: &LineIndexState, at_byte: u64, text: &str, version: u64) -> LineIndexState;
    fn delete(&self, state: &LineIndexState, start: u64, end: u64, version: u64) -> LineIndexState;
}

/// Reconciles synchronously on every edit; `dirty_ranges` is always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EagerLineIndex;

impl LineIndexStrategy for EagerLineIndex {
    fn insert(&self, state: &LineIndexState, at_byte: u64, text: &str, version: u64) -> LineIndexState {
        if text.is_empty() {
            return state.clone();
        }
        let mut tree = state.tree.clone();
        mutate_insert(&mut tree, at_byte, text);
        LineIndexState {
            line_count: tree.count().max(1),
            tree,
            dirty_ranges: Vec::new(),
            last_reconciled_version: version,
            rebuild_pending: false,
        }
    }

    fn delete(&self, state: &LineIndexState, start: u64, end: u64, version: u64) -> LineIndexState {
        if start >= end {
            return state.clone();
        }
        let mut tree = state.tree.clone();
        mutate_delete(&mut tree, start, end);
        LineIndexState {
            line_count: tree.count().max(1),
            tree,
            dirty_ranges: Vec::new(),
            last_reconciled_version: version,
            rebuild_pending: false,
        }
    }
}

/// Performs the same tree surgery as [`EagerLineIndex`] (see module docs)
/// but records the touched range as dirty instead of reconciling
/// immediately, so a store can batch/schedule the reconcile pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyLineIndex;

impl LineIndexStrategy for LazyLineIndex {
    fn insert(&self, state: &LineIndexState, at_byte: u64, text: &str, version: u64) -> LineIndexState {
        if text.is_empty() {
            return state.clone();
        }
        let mut tree = state.tree.clone();
        let (touched_start, touched_end) = mutate_insert(&mut tree, at_byte, text);
        let mut dirty_ranges = state.dirty_ranges.clone();
        push_dirty(
            &mut dirty_ranges,
            DirtyRange {
                start_line: touched_start,
                end_line: Some(touched_end),
                offset_delta: text.len() as i64,
                created_at_version: version,
            },
        );
        LineIndexState {
            line_count: tree.count().max(1),
            tree,
            dirty_ranges,
            last_reconciled_version: state.last_reconciled_version,
            rebuild_pending: true,
        }
    }

    fn delete(&self, state: &LineIndexState, start: u64, end: u64, version: u64) -> LineIndexState {
        if start >= end {
            return state.clone();
        }
        let mut tree = state.tree.clone();
        let (touched_start, touched_end) = mutate_delete(&mut tree, start, end);
        let mut dirty_ranges = state.dirty_ranges.clone();
        push_dirty(
            &mut dirty_ranges,
            DirtyRange {
                start_line: touched_start,
                end_line: Some(touched_end),
                offset_delta: -((end - start) as i64),
                created_at_version: version,
            },
        );
        LineIndexState {
            line_count: tree.count().max(1),
            tree,
            dirty_ranges,
            last_reconciled_version: state.last_reconciled_version,
            rebuild_pending: true,
        }
    }
}

/// Make lines in `[from_line, to_line]` precisely accurate (trivially true
/// here; see module docs), clearing just that window's dirty bookkeeping.
pub fn reconcile_range(state: &LineIndexState, from_line: u64, to_line: u64, version: u64) -> LineIndexState {
    let dirty_ranges = reconcile_window(&state.dirty_ranges, from_line, to_line);
    let rebuild_pending = !dirty_ranges.is_empty();
    LineIndexState {
        tree: state.tree.clone(),
        line_count: state.line_count,
        dirty_ranges,
        last_reconciled_version: version,
        rebuild_pending,
    }
}

/// Clear every dirty range.
pub fn reconcile_full(state: &LineIndexState, version: u64) -> LineIndexState {
    LineIndexState {
        tree: state.tree.clone(),
        line_count: state.line_count,
        dirty_ranges: Vec::new(),
        last_reconciled_version: version,
        rebuild_pending: false,
    }
}

/// Reconcile the visible window first; any dirty range outside it is left
/// untouched for a later background pass.
pub fn reconcile_viewport(state: &LineIndexState, start_line: u64, end_line: u64, version: u64) -> LineIndexState {
    reconcile_range(state, start_line, end_line, version)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_state_has_one_line() {
        let s = LineIndexState::empty();
        assert_eq!(1, s.line_count());
        assert_eq!(Some(0), s.get_line_start_offset(0));
    }

    #[test]
    fn from_text_splits_on_newlines() {
        let s = LineIndexState::from_text("A\nB\nC");
        assert_eq!(3, s.line_count());
        assert_eq!(Some(0), s.get_line_start_offset(0));
        assert_eq!(Some(2), s.get_line_start_offset(1));
        assert_eq!(Some(4), s.get_line_start_offset(2));
    }

    #[test]
    fn eager_insert_of_newlines_expands_line_count() {
        let s = LineIndexState::empty();
        let s = EagerLineIndex.insert(&s, 0, "A\nB\nC", 1);
        assert_eq!(3, s.line_count());
        assert!(!s.rebuild_pending());
    }

    #[test]
    fn eager_insert_plain_text_keeps_one_line() {
        let s = LineIndexState::empty();
        let s = EagerLineIndex.insert(&s, 0, "hello", 1);
        assert_eq!(1, s.line_count());
        assert_eq!(Some(crate::range::Range::new(0, 5)), s.get_line_range(0));
    }

    #[test]
    fn coalesced_typing_extends_single_line() {
        let s = LineIndexState::empty();
        let s = EagerLineIndex.insert(&s, 0, "h", 1);
        let s = EagerLineIndex.insert(&s, 1, "i", 2);
        assert_eq!(1, s.line_count());
        assert_eq!(Some(crate::range::Range::new(0, 2)), s.get_line_range(0));
    }

    #[test]
    fn delete_spanning_lines_merges_them() {
        let s = LineIndexState::from_text("aaa\nbbb\nccc");
        assert_eq!(3, s.line_count());
        let s = EagerLineIndex.delete(&s, 2, 9, 1);
        assert_eq!(1, s.line_count());
    }

    #[test]
    fn delete_entire_document_collapses_to_one_empty_line() {
        let s = LineIndexState::from_text("A\nB\nC");
        let s = EagerLineIndex.delete(&s, 0, 5, 1);
        assert_eq!(1, s.line_count());
        assert_eq!(Some(crate::range::Range::new(0, 0)), s.get_line_range(0));
    }

    #[test]
    fn lazy_insert_marks_dirty_until_reconciled() {
        let s = LineIndexState::empty();
        let s = LazyLineIndex.insert(&s, 0, "A\nB\nC", 1);
        assert_eq!(3, s.line_count());
        assert!(s.rebuild_pending());
        assert!(s.is_line_dirty(0));
        assert!(s.is_line_dirty(2));

        let s = reconcile_full(&s, 2);
        assert!(!s.rebuild_pending());
        assert!(!s.is_line_dirty(0));
        assert_eq!(2, s.last_reconciled_version());
        // reconciliation never changes visible line content
        assert_eq!(Some(crate::range::Range::new(0, 2)), s.get_line_range(0));
    }

    #[test]
    fn reconcile_range_only_clears_requested_window() {
        let s = LineIndexState::empty();
        let s = LazyLineIndex.insert(&s, 0, "A\nB\nC\nD", 1);
        assert_eq!(4, s.line_count());

        let s = reconcile_range(&s, 0, 1, 2);
        assert!(!s.is_line_dirty(0));
        assert!(s.is_line_dirty(3));
        assert!(s.rebuild_pending());
    }

    #[test]
    fn merge_dirty_ranges_combines_adjacent_spans() {
        let mut ranges = vec![
            DirtyRange {
                start_line: 0,
                end_line: Some(2),
                offset_delta: 5,
                created_at_version: 1,
            },
            DirtyRange {
                start_line: 3,
                end_line: Some(4),
                offset_delta: -2,
                created_at_version: 2,
            },
        ];
        merge_dirty_ranges(&mut ranges);
        assert_eq!(1, ranges.len());
        assert_eq!(0, ranges[0].start_line);
        assert_eq!(Some(4), ranges[0].end_line);
        assert_eq!(3, ranges[0].offset_delta);
    }

    #[test]
    fn split_line_lengths_handles_crlf_and_lone_cr() {
        assert_eq!(vec![2, 2, 1], split_line_lengths(b"a\nb\nc"));
        assert_eq!(vec![3, 3, 1], split_line_lengths(b"a\r\nb\r\nc"));
        assert_eq!(vec![2, 1], split_line_lengths(b"a\rb"));
        assert_eq!(vec![0], split_line_lengths(b""));
    }
}
