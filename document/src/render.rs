//! Rendering selectors (§4.7): pure queries over a [`DocumentState`]
//! snapshot that a host uses to drive a viewport. None of these mutate
//! anything; they read the line index and piece table the way the reducer
//! does, just without producing a new state.
//!
//! [`ValueStream`] also lives here: it is the piece table's `getValueStream`
//! contract (§4.1), but since it needs a `chunkSize` concept and code-point
//! boundary bookkeeping the buffer crate has no reason to carry, it is built
//! on top of `textbuf`'s public byte cursor instead of inside `textbuf`
//! itself.

use textbuf::PieceTree;

use crate::selection::SelectionRange;
use crate::state::DocumentState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleLineRange {
    pub first_visible: u64,
    pub last_visible: u64,
    pub overscan_before: u64,
    pub overscan_after: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHeightConfig {
    pub line_height_px: f64,
    pub overscan_lines: u64,
}

pub fn get_visible_line_range(
    total_lines: u64,
    scroll_top: f64,
    viewport_height: f64,
    line_height: &LineHeightConfig,
) -> VisibleLineRange {
    if total_lines == 0 {
        return VisibleLineRange {
            first_visible: 0,
            last_visible: 0,
            overscan_before: 0,
            overscan_after: 0,
        };
    }

    let last_index = total_lines - 1;
    let lh = line_height.line_height_px.max(1.0);
    let first_raw = ((scroll_top.max(0.0)) / lh).floor() as u64;
    let first_raw = first_raw.min(last_index);
    let visible_count = ((viewport_height.max(0.0)) / lh).ceil() as u64;
    let last_raw = (first_raw + visible_count.max(1) - 1).min(last_index);

    let overscan_before = line_height.overscan_lines.min(first_raw);
    let overscan_after = line_height.overscan_lines.min(last_index - last_raw);

    VisibleLineRange {
        first_visible: first_raw - overscan_before,
        last_visible: last_raw + overscan_after,
        overscan_before,
        overscan_after,
    }
}

/// Content of every line in `range`, inclusive, each including its own
/// terminator (as the line index itself does — see its module docs).
pub fn get_visible_lines(state: &DocumentState, range: &VisibleLineRange) -> Vec<String> {
    let mut lines = Vec::with_capacity((range.last_visible - range.first_visible + 1) as usize);
    for line in range.first_visible..=range.last_visible {
        let Some(r) = state.line_index.get_line_range_precise(line) else {
            break;
        };
        lines.push(state.piece_table.get_text_range(r.start, r.end));
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
    pub line: u64,
    pub column: u64,
}

/// `column` is counted in UTF-16 code units, per §3.1's position-kind list.
pub fn position_to_line_column(state: &DocumentState, byte_offset: u64) -> LineColumn {
    let at = byte_offset.min(state.total_length());
    let info = state.line_index.find_line_at_position(at);
    let prefix = state.piece_table.get_text_range(info.start_offset, at);
    LineColumn {
        line: info.line,
        column: prefix.encode_utf16().count() as u64,
    }
}

pub fn line_column_to_position(state: &DocumentState, line: u64, column: u64) -> u64 {
    let Some(info) = state.line_index.find_line_by_number(line) else {
        return state.total_length();
    };
    let line_text = state
        .piece_table
        .get_text_range(info.start_offset, info.start_offset + info.byte_len);

    let mut units = 0u64;
    for (byte_idx, ch) in line_text.char_indices() {
        if units >= column {
            return info.start_offset + byte_idx as u64;
        }
        units += ch.len_utf16() as u64;
    }
    info.start_offset + line_text.len() as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSelectionRange {
    pub anchor: u64,
    pub head: u64,
}

/// A table of `(byteOffset, utf16Offset)` at every char boundary, plus a
/// trailing entry at the document's end; binary-searched by either column to
/// convert in either direction without ever landing mid-surrogate-pair.
fn offset_table(text: &str) -> Vec<(u64, u64)> {
    let mut table = Vec::with_capacity(text.len() + 1);
    let mut units = 0u64;
    for (byte_idx, ch) in text.char_indices() {
        table.push((byte_idx as u64, units));
        units += ch.len_utf16() as u64;
    }
    table.push((text.len() as u64, units));
    table
}

fn nearest(table: &[(u64, u64)], key: u64, key_of: impl Fn(&(u64, u64)) -> u64) -> usize {
    match table.binary_search_by_key(&key, key_of) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1).min(table.len() - 1),
    }
}

pub fn selection_to_char_offsets(state: &DocumentState) -> Vec<CharSelectionRange> {
    let text = state.get_value();
    let table = offset_table(&text);
    state
        .selection
        .ranges()
        .iter()
        .map(|r| CharSelectionRange {
            anchor: table[nearest(&table, r.anchor as u64, |&(b, _)| b)].1,
            head: table[nearest(&table, r.head as u64, |&(b, _)| b)].1,
        })
        .collect()
}

pub fn char_offsets_to_selection(
    state: &DocumentState,
    ranges: &[CharSelectionRange],
) -> Vec<SelectionRange> {
    let text = state.get_value();
    let table = offset_table(&text);
    ranges
        .iter()
        .map(|r| {
            SelectionRange::new(
                table[nearest(&table, r.anchor, |&(_, c)| c)].0 as usize,
                table[nearest(&table, r.head, |&(_, c)| c)].0 as usize,
            )
        })
        .collect()
}

fn is_utf8_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Lazy, finite sequence of chunks covering `[start, end)`, each a whole
/// number of UTF-8 code points: a short tail of continuation bytes that
/// would otherwise land at a `chunk_size` boundary is pulled into the
/// current chunk instead of being split across two.
pub struct ValueStream<'a> {
    bytes: textbuf::Bytes<'a>,
    end: u64,
    pos: u64,
    chunk_size: usize,
}

impl<'a> ValueStream<'a> {
    pub fn new(pt: &'a PieceTree, start: u64, end: u64, chunk_size: usize) -> ValueStream<'a> {
        let start = start.min(pt.len());
        let end = end.min(pt.len()).max(start);
        ValueStream {
            bytes: pt.bytes_at(start),
            end,
            pos: start,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<'a> Iterator for ValueStream<'a> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.pos >= self.end {
            return None;
        }

        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size && self.pos < self.end {
            let byte = self.bytes.next()?;
            chunk.push(byte);
            self.pos += 1;
        }

        while self.pos < self.end {
            match self.bytes.get() {
                Some(b) if is_utf8_continuation(b) => {
                    chunk.push(self.bytes.next().expect("peeked byte exists"));
                    self.pos += 1;
                }
                _ => break,
            }
        }

        Some(chunk)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    #[test]
    fn visible_range_applies_overscan_and_clamps() {
        let r = get_visible_line_range(
            100,
            200.0,
            50.0,
            &LineHeightConfig {
                line_height_px: 20.0,
                overscan_lines: 3,
            },
        );
        assert_eq!(10, r.first_visible + r.overscan_before);
        assert!(r.first_visible <= 10);
        assert!(r.last_visible < 100);
    }

    #[test]
    fn visible_range_on_empty_document() {
        let r = get_visible_line_range(
            0,
            0.0,
            100.0,
            &LineHeightConfig {
                line_height_px: 20.0,
                overscan_lines: 2,
            },
        );
        assert_eq!(0, r.first_visible);
        assert_eq!(0, r.last_visible);
    }

    #[test]
    fn visible_lines_materializes_content() {
        let s = DocumentState::empty(Config {
            content: Some("one\ntwo\nthree".to_string()),
            ..Config::default()
        });
        let range = VisibleLineRange {
            first_visible: 0,
            last_visible: 2,
            overscan_before: 0,
            overscan_after: 0,
        };
        let lines = get_visible_lines(&s, &range);
        assert_eq!(vec!["one\n", "two\n", "three"], lines);
    }

    #[test]
    fn position_and_line_column_round_trip() {
        let s = DocumentState::empty(Config {
            content: Some("ab\ncd".to_string()),
            ..Config::default()
        });
        let lc = position_to_line_column(&s, 4);
        assert_eq!(1, lc.line);
        assert_eq!(1, lc.column);
        assert_eq!(4, line_column_to_position(&s, 1, 1));
    }

    #[test]
    fn char_offsets_round_trip_ascii() {
        let s = DocumentState::empty(Config {
            content: Some("hello".to_string()),
            ..Config::default()
        });
        let s2 = crate::reducer::reduce(
            &s,
            &crate::action::DocumentAction::SetSelection {
                ranges: vec![SelectionRange::new(1, 3)],
            },
            &crate::line_index::EagerLineIndex,
            &crate::reducer::ReducerConfig::default(),
            0,
        );
        let chars = selection_to_char_offsets(&s2);
        assert_eq!(1, chars[0].anchor);
        assert_eq!(3, chars[0].head);
        let back = char_offsets_to_selection(&s2, &chars);
        assert_eq!(1, back[0].anchor);
        assert_eq!(3, back[0].head);
    }

    #[test]
    fn value_stream_never_splits_a_code_point() {
        let mut pt = PieceTree::new();
        pt.insert_str(0, "a世b");
        // "世" is 3 bytes; force a chunk boundary right after its first byte.
        let stream = ValueStream::new(&pt, 0, pt.len(), 2);
        let chunks: Vec<Vec<u8>> = stream.collect();
        let mut joined = Vec::new();
        for c in &chunks {
            assert!(std::str::from_utf8(c).is_ok(), "chunk split a code point");
            joined.extend_from_slice(c);
        }
        assert_eq!("a世b".as_bytes(), joined.as_slice());
    }
}
