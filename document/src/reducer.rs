//! The reducer (§4.4): the pure `(state, action) -> state` function. Never
//! mutates its arguments; every no-op branch hands back `state.clone()`,
//! which is cheap (every field but `version` is an `Arc`) and, for branches
//! that touch nothing, structurally identical to the input — see
//! [`DocumentState::is_identical_to`].
//!
//! Numeric action fields are plain `usize`/`u64`, so "non-finite input" from
//! §7 is already impossible by the time a `DocumentAction` exists — that
//! case is rejected at [`crate::action::deserialize_action`]'s boundary
//! instead. Out-of-range offsets are still clamped here, per §4.1/§4.4.

use std::sync::Arc;

use textbuf::PieceTree;

use crate::action::{DocumentAction, RemoteChange};
use crate::history::{HistoryChange, HistoryEntry, HistoryState};
use crate::line_index::{LineIndexState, LineIndexStrategy};
use crate::metadata::DocumentMetadata;
use crate::selection::{SelectionRange, SelectionState};
use crate::state::DocumentState;

/// Reducer-wide knobs that don't belong on a single action: the history
/// coalescing window (§9 open question, resolved to 500ms, configurable).
#[derive(Debug, Clone, Copy)]
pub struct ReducerConfig {
    pub coalesce_window_ms: u64,
}

impl Default for ReducerConfig {
    fn default() -> ReducerConfig {
        ReducerConfig {
            coalesce_window_ms: 500,
        }
    }
}

pub fn reduce(
    state: &DocumentState,
    action: &DocumentAction,
    strategy: &dyn LineIndexStrategy,
    config: &ReducerConfig,
    now_ms: u64,
) -> DocumentState {
    match action {
        DocumentAction::Insert { start, text } => {
            do_insert(state, *start, text, strategy, config, now_ms)
        }
        DocumentAction::Delete { start, end } => {
            do_delete(state, *start, *end, strategy, config, now_ms)
        }
        DocumentAction::Replace { start, end, text } => {
            do_replace(state, *start, *end, text, strategy, now_ms)
        }
        DocumentAction::SetSelection { ranges } => do_set_selection(state, ranges),
        DocumentAction::Undo => do_undo(state, strategy),
        DocumentAction::Redo => do_redo(state, strategy),
        DocumentAction::HistoryClear => do_history_clear(state),
        DocumentAction::ApplyRemote { changes } => do_apply_remote(state, changes, strategy),
        // Handled entirely by the store's transaction wiring.
        DocumentAction::TransactionStart
        | DocumentAction::TransactionCommit
        | DocumentAction::TransactionRollback => state.clone(),
        // Interface stubs (§1 out of scope: chunk load/evict execution).
        DocumentAction::LoadChunk { .. } | DocumentAction::EvictChunk { .. } => state.clone(),
    }
}

fn do_insert(
    state: &DocumentState,
    start: usize,
    text: &str,
    strategy: &dyn LineIndexStrategy,
    config: &ReducerConfig,
    now_ms: u64,
) -> DocumentState {
    if text.is_empty() {
        return state.clone();
    }

    let total = state.total_length();
    let at = (start as u64).min(total);

    let mut pt = (*state.piece_table).clone();
    pt.insert(at, text);

    let new_version = state.version + 1;
    let line_index = strategy.insert(&state.line_index, at, text, new_version);
    let selection = state.selection.shift(at as usize, text.len() as i64);

    let change = HistoryChange::Insert {
        position: at as usize,
        text: text.to_string(),
    };
    let history = push_or_coalesce_insert(&state.history, &change, &state.selection, &selection, config, now_ms);

    DocumentState {
        version: new_version,
        piece_table: Arc::new(pt),
        line_index: Arc::new(line_index),
        selection: Arc::new(selection),
        history: Arc::new(history),
        metadata: Arc::new(state.metadata.with_dirty(true)),
    }
}

fn push_or_coalesce_insert(
    history: &HistoryState,
    change: &HistoryChange,
    selection_before: &SelectionState,
    selection_after: &SelectionState,
    config: &ReducerConfig,
    now_ms: u64,
) -> HistoryState {
    let (position, text) = match change {
        HistoryChange::Insert { position, text } => (*position, text),
        _ => unreachable!("push_or_coalesce_insert only called with an Insert change"),
    };

    if let Some(top) = history.top_undo() {
        if let [HistoryChange::Insert {
            position: prev_pos,
            text: prev_text,
        }] = top.changes.as_slice()
        {
            let ends_where_new_begins = prev_pos + prev_text.len() == position;
            let neither_has_newline = !prev_text.contains('\n') && !text.contains('\n');
            let within_window = now_ms.saturating_sub(top.timestamp) < config.coalesce_window_ms;

            if ends_where_new_begins && neither_has_newline && within_window {
                let merged = HistoryEntry {
                    changes: vec![HistoryChange::Insert {
                        position: *prev_pos,
                        text: format!("{prev_text}{text}"),
                    }],
                    selection_before: top.selection_before.clone(),
                    selection_after: selection_after.clone(),
                    timestamp: now_ms,
                };
                return history.replace_top_undo(merged);
            }
        }
    }

    history.push_new(HistoryEntry {
        changes: vec![change.clone()],
        selection_before: selection_before.clone(),
        selection_after: selection_after.clone(),
        timestamp: now_ms,
    })
}

fn do_delete(
    state: &DocumentState,
    start: usize,
    end: usize,
    strategy: &dyn LineIndexStrategy,
    config: &ReducerConfig,
    now_ms: u64,
) -> DocumentState {
    let total = state.total_length();
    let lo = (start.min(end) as u64).min(total);
    let hi = (start.max(end) as u64).min(total);
    if lo >= hi {
        return state.clone();
    }

    let removed_text = state.piece_table.get_text_range(lo, hi);

    let mut pt = (*state.piece_table).clone();
    pt.remove(lo..hi);

    let new_version = state.version + 1;
    let line_index = strategy.delete(&state.line_index, lo, hi, new_version);
    let selection = state.selection.shift(lo as usize, -((hi - lo) as i64));

    let change = HistoryChange::Delete {
        position: lo as usize,
        text: removed_text,
    };
    let history = push_or_coalesce_delete(&state.history, &change, &state.selection, &selection, lo, hi, config, now_ms);

    DocumentState {
        version: new_version,
        piece_table: Arc::new(pt),
        line_index: Arc::new(line_index),
        selection: Arc::new(selection),
        history: Arc::new(history),
        metadata: Arc::new(state.metadata.with_dirty(true)),
    }
}

#[allow(clippy::too_many_arguments)]
fn push_or_coalesce_delete(
    history: &HistoryState,
    change: &HistoryChange,
    selection_before: &SelectionState,
    selection_after: &SelectionState,
    lo: u64,
    hi: u64,
    config: &ReducerConfig,
    now_ms: u64,
) -> HistoryState {
    let text = match change {
        HistoryChange::Delete { text, .. } => text,
        _ => unreachable!("push_or_coalesce_delete only called with a Delete change"),
    };

    if let Some(top) = history.top_undo() {
        if let [HistoryChange::Delete {
            position: prev_pos,
            text: prev_text,
        }] = top.changes.as_slice()
        {
            let prev_lo = *prev_pos as u64;
            let prev_hi = prev_lo + prev_text.len() as u64;
            let backward = hi == prev_lo;
            let forward = lo == prev_hi;
            let neither_has_newline = !prev_text.contains('\n') && !text.contains('\n');
            let within_window = now_ms.saturating_sub(top.timestamp) < config.coalesce_window_ms;

            if (backward || forward) && neither_has_newline && within_window {
                let (merged_position, merged_text) = if backward {
                    (lo, format!("{text}{prev_text}"))
                } else {
                    (prev_lo, format!("{prev_text}{text}"))
                };
                let merged = HistoryEntry {
                    changes: vec![HistoryChange::Delete {
                        position: merged_position as usize,
                        text: merged_text,
                    }],
                    selection_before: top.selection_before.clone(),
                    selection_after: selection_after.clone(),
                    timestamp: now_ms,
                };
                return history.replace_top_undo(merged);
            }
        }
    }

    history.push_new(HistoryEntry {
        changes: vec![change.clone()],
        selection_before: selection_before.clone(),
        selection_after: selection_after.clone(),
        timestamp: now_ms,
    })
}

fn do_replace(
    state: &DocumentState,
    start: usize,
    end: usize,
    text: &str,
    strategy: &dyn LineIndexStrategy,
    now_ms: u64,
) -> DocumentState {
    let total = state.total_length();
    let lo = (start.min(end) as u64).min(total);
    let hi = (start.max(end) as u64).min(total);

    if lo >= hi && text.is_empty() {
        return state.clone();
    }

    let removed_text = state.piece_table.get_text_range(lo, hi);

    let mut pt = (*state.piece_table).clone();
    if hi > lo {
        pt.remove(lo..hi);
    }
    if !text.is_empty() {
        pt.insert(lo, text);
    }

    let new_version = state.version + 1;
    let mut line_index = (*state.line_index).clone();
    if hi > lo {
        line_index = strategy.delete(&state.line_index, lo, hi, new_version);
    }
    if !text.is_empty() {
        line_index = strategy.insert(&line_index, lo, text, new_version);
    }

    let selection = state
        .selection
        .shift(lo as usize, -((hi - lo) as i64))
        .shift(lo as usize, text.len() as i64);

    let change = HistoryChange::Replace {
        position: lo as usize,
        new_text: text.to_string(),
        old_text: removed_text,
    };
    let history = state.history.push_new(HistoryEntry {
        changes: vec![change],
        selection_before: (*state.selection).clone(),
        selection_after: selection.clone(),
        timestamp: now_ms,
    });

    DocumentState {
        version: new_version,
        piece_table: Arc::new(pt),
        line_index: Arc::new(line_index),
        selection: Arc::new(selection),
        history: Arc::new(history),
        metadata: Arc::new(state.metadata.with_dirty(true)),
    }
}

fn do_set_selection(state: &DocumentState, ranges: &[SelectionRange]) -> DocumentState {
    let total = state.total_length() as usize;
    let new_selection = SelectionState::normalized(ranges, 0, total);
    if new_selection.is_equal_to(&state.selection) {
        return state.clone();
    }

    DocumentState {
        version: state.version + 1,
        piece_table: Arc::clone(&state.piece_table),
        line_index: Arc::clone(&state.line_index),
        selection: Arc::new(new_selection),
        history: Arc::clone(&state.history),
        metadata: Arc::clone(&state.metadata),
    }
}

fn do_undo(state: &DocumentState, strategy: &dyn LineIndexStrategy) -> DocumentState {
    let (entry, history) = match state.history.pop_undo_to_redo() {
        Some(v) => v,
        None => return state.clone(),
    };

    let mut pt = (*state.piece_table).clone();
    let mut li = (*state.line_index).clone();
    let new_version = state.version + 1;
    for change in entry.changes.iter().rev() {
        apply_inverse(&mut pt, &mut li, change, new_version, strategy);
    }

    let is_dirty = recompute_is_dirty(&history, &state.metadata);

    DocumentState {
        version: new_version,
        piece_table: Arc::new(pt),
        line_index: Arc::new(li),
        selection: Arc::new(entry.selection_before),
        history: Arc::new(history),
        metadata: Arc::new(state.metadata.with_dirty(is_dirty)),
    }
}

fn do_redo(state: &DocumentState, strategy: &dyn LineIndexStrategy) -> DocumentState {
    let (entry, history) = match state.history.pop_redo_to_undo() {
        Some(v) => v,
        None => return state.clone(),
    };

    let mut pt = (*state.piece_table).clone();
    let mut li = (*state.line_index).clone();
    let new_version = state.version + 1;
    for change in entry.changes.iter() {
        apply_forward(&mut pt, &mut li, change, new_version, strategy);
    }

    let is_dirty = recompute_is_dirty(&history, &state.metadata);

    DocumentState {
        version: new_version,
        piece_table: Arc::new(pt),
        line_index: Arc::new(li),
        selection: Arc::new(entry.selection_after),
        history: Arc::new(history),
        metadata: Arc::new(state.metadata.with_dirty(is_dirty)),
    }
}

/// `isDirty = undoStack non-empty OR metadata.lastSaved < top` (§4.4): with
/// no per-entry save-point version tracked, the closest faithful reading is
/// "there's still something to undo, or the document has never been saved";
/// see `DESIGN.md` for the full note.
fn recompute_is_dirty(history: &HistoryState, metadata: &DocumentMetadata) -> bool {
    !history.undo_stack().is_empty() || metadata.last_saved.is_none()
}

fn apply_inverse(
    pt: &mut PieceTree,
    li: &mut LineIndexState,
    change: &HistoryChange,
    version: u64,
    strategy: &dyn LineIndexStrategy,
) {
    match change {
        HistoryChange::Insert { position, text } => {
            let pos = *position as u64;
            let end = pos + text.len() as u64;
            pt.remove(pos..end);
            *li = strategy.delete(li, pos, end, version);
        }
        HistoryChange::Delete { position, text } => {
            let pos = *position as u64;
            pt.insert(pos, text);
            *li = strategy.insert(li, pos, text, version);
        }
        HistoryChange::Replace {
            position,
            new_text,
            old_text,
        } => {
            let pos = *position as u64;
            let end = pos + new_text.len() as u64;
            pt.remove(pos..end);
            pt.insert(pos, old_text);
            *li = strategy.delete(li, pos, end, version);
            *li = strategy.insert(li, pos, old_text, version);
        }
    }
}

fn apply_forward(
    pt: &mut PieceTree,
    li: &mut LineIndexState,
    change: &HistoryChange,
    version: u64,
    strategy: &dyn LineIndexStrategy,
) {
    match change {
        HistoryChange::Insert { position, text } => {
            let pos = *position as u64;
            pt.insert(pos, text);
            *li = strategy.insert(li, pos, text, version);
        }
        HistoryChange::Delete { position, text } => {
            let pos = *position as u64;
            let end = pos + text.len() as u64;
            pt.remove(pos..end);
            *li = strategy.delete(li, pos, end, version);
        }
        HistoryChange::Replace {
            position,
            new_text,
            old_text,
        } => {
            let pos = *position as u64;
            let end = pos + old_text.len() as u64;
            pt.remove(pos..end);
            pt.insert(pos, new_text);
            *li = strategy.delete(li, pos, end, version);
            *li = strategy.insert(li, pos, new_text, version);
        }
    }
}

fn do_history_clear(state: &DocumentState) -> DocumentState {
    DocumentState {
        version: state.version,
        piece_table: Arc::clone(&state.piece_table),
        line_index: Arc::clone(&state.line_index),
        selection: Arc::clone(&state.selection),
        history: Arc::new(state.history.clear()),
        metadata: Arc::clone(&state.metadata),
    }
}

fn do_apply_remote(
    state: &DocumentState,
    changes: &[RemoteChange],
    strategy: &dyn LineIndexStrategy,
) -> DocumentState {
    if changes.is_empty() {
        return state.clone();
    }

    let mut pt = (*state.piece_table).clone();
    let mut li = (*state.line_index).clone();
    let mut selection = (*state.selection).clone();
    let new_version = state.version + 1;
    let mut changed = false;

    for change in changes {
        match change {
            RemoteChange::Insert { start, text } => {
                if text.is_empty() {
                    continue;
                }
                let at = (*start as u64).min(pt.len());
                pt.insert(at, text);
                li = strategy.insert(&li, at, text, new_version);
                selection = selection.shift(at as usize, text.len() as i64);
                changed = true;
            }
            RemoteChange::Delete { start, length } => {
                if *length == 0 {
                    continue;
                }
                let lo = (*start as u64).min(pt.len());
                let hi = (lo + *length as u64).min(pt.len());
                if hi <= lo {
                    continue;
                }
                let removed = hi - lo;
                pt.remove(lo..hi);
                li = strategy.delete(&li, lo, hi, new_version);
                selection = selection.shift(lo as usize, -(removed as i64));
                changed = true;
            }
        }
    }

    if !changed {
        return state.clone();
    }

    DocumentState {
        version: new_version,
        piece_table: Arc::new(pt),
        line_index: Arc::new(li),
        selection: Arc::new(selection),
        history: Arc::clone(&state.history),
        metadata: Arc::new(state.metadata.with_dirty(true)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::line_index::EagerLineIndex;

    fn empty() -> DocumentState {
        DocumentState::empty(Config::default())
    }

    #[test]
    fn scenario_a_hello_world() {
        let s = empty();
        let s = reduce(
            &s,
            &DocumentAction::Insert {
                start: 0,
                text: "Hello World".to_string(),
            },
            &EagerLineIndex,
            &ReducerConfig::default(),
            0,
        );
        assert_eq!(11, s.total_length());
        assert_eq!(1, s.line_index.line_count());
        assert_eq!(1, s.history.undo_stack().len());
        assert_eq!("Hello World", s.get_value());
    }

    #[test]
    fn scenario_b_unicode_byte_length() {
        let s = empty();
        let s = reduce(
            &s,
            &DocumentAction::Insert {
                start: 0,
                text: "Hello 世界".to_string(),
            },
            &EagerLineIndex,
            &ReducerConfig::default(),
            0,
        );
        assert_eq!(12, s.total_length());
    }

    #[test]
    fn scenario_c_newline_insert_then_undo_then_redo() {
        let s = empty();
        let s = reduce(
            &s,
            &DocumentAction::Insert {
                start: 0,
                text: "A\nB\nC".to_string(),
            },
            &EagerLineIndex,
            &ReducerConfig::default(),
            0,
        );
        assert_eq!(3, s.line_index.line_count());

        let s = reduce(&s, &DocumentAction::Undo, &EagerLineIndex, &ReducerConfig::default(), 0);
        assert_eq!(1, s.line_index.line_count());
        assert_eq!(0, s.total_length());

        let s = reduce(&s, &DocumentAction::Redo, &EagerLineIndex, &ReducerConfig::default(), 0);
        assert_eq!(3, s.line_index.line_count());
    }

    #[test]
    fn scenario_e_coalesced_typing() {
        let config = ReducerConfig::default();
        let s = empty();
        let s = reduce(
            &s,
            &DocumentAction::Insert {
                start: 0,
                text: "h".to_string(),
            },
            &EagerLineIndex,
            &config,
            0,
        );
        let s = reduce(
            &s,
            &DocumentAction::Insert {
                start: 1,
                text: "i".to_string(),
            },
            &EagerLineIndex,
            &config,
            100,
        );
        assert_eq!(1, s.history.undo_stack().len());
        match &s.history.undo_stack()[0].changes[..] {
            [HistoryChange::Insert { text, .. }] => assert_eq!("hi", text),
            _ => panic!("expected a single coalesced insert"),
        }

        let s = reduce(&s, &DocumentAction::Undo, &EagerLineIndex, &config, 200);
        assert_eq!("", s.get_value());
    }

    #[test]
    fn invariant_4_noop_action_is_reference_equal() {
        let s = empty();
        let s2 = reduce(
            &s,
            &DocumentAction::Insert {
                start: 0,
                text: String::new(),
            },
            &EagerLineIndex,
            &ReducerConfig::default(),
            0,
        );
        assert!(s.is_identical_to(&s2));
    }

    #[test]
    fn invariant_10_set_selection_shares_unrelated_state() {
        let s = empty();
        let s2 = reduce(
            &s,
            &DocumentAction::SetSelection {
                ranges: vec![SelectionRange::caret(0)],
            },
            &EagerLineIndex,
            &ReducerConfig::default(),
            0,
        );
        // a caret at 0 is already the default selection, so this is a no-op
        assert!(s.is_identical_to(&s2));

        let s3 = reduce(
            &s,
            &DocumentAction::SetSelection {
                ranges: vec![SelectionRange::new(0, 0)],
            },
            &EagerLineIndex,
            &ReducerConfig::default(),
            0,
        );
        let _ = s3;
    }

    #[test]
    fn invariant_11_history_limit_caps_undo_stack() {
        let mut s = DocumentState::empty(Config {
            history_limit: 3,
            ..Config::default()
        });
        for i in 0..10 {
            s = reduce(
                &s,
                &DocumentAction::Insert {
                    start: s.total_length() as usize,
                    text: "x".to_string(),
                },
                &EagerLineIndex,
                &ReducerConfig::default(),
                // space typing far enough apart that nothing coalesces
                (i as u64) * 10_000,
            );
        }
        assert_eq!(3, s.history.undo_stack().len());
    }

    #[test]
    fn delete_coalesces_backward_typing_backspace() {
        let config = ReducerConfig::default();
        let s = DocumentState::empty(Config {
            content: Some("hello".to_string()),
            ..Config::default()
        });
        let s = reduce(&s, &DocumentAction::Delete { start: 4, end: 5 }, &EagerLineIndex, &config, 0);
        let s = reduce(&s, &DocumentAction::Delete { start: 3, end: 4 }, &EagerLineIndex, &config, 50);
        assert_eq!(1, s.history.undo_stack().len());
        assert_eq!("hel", s.get_value());
    }

    #[test]
    fn apply_remote_does_not_touch_history() {
        let s = empty();
        let s = reduce(
            &s,
            &DocumentAction::ApplyRemote {
                changes: vec![RemoteChange::Insert {
                    start: 0,
                    text: "abc".to_string(),
                }],
            },
            &EagerLineIndex,
            &ReducerConfig::default(),
            0,
        );
        assert_eq!("abc", s.get_value());
        assert!(s.history.undo_stack().is_empty());
    }

    #[test]
    fn replace_is_a_single_history_entry() {
        let s = DocumentState::empty(Config {
            content: Some("abcdef".to_string()),
            ..Config::default()
        });
        let s = reduce(
            &s,
            &DocumentAction::Replace {
                start: 1,
                end: 3,
                text: "XY".to_string(),
            },
            &EagerLineIndex,
            &ReducerConfig::default(),
            0,
        );
        assert_eq!("aXYdef", s.get_value());
        assert_eq!(1, s.history.undo_stack().len());

        let s = reduce(&s, &DocumentAction::Undo, &EagerLineIndex, &ReducerConfig::default(), 0);
        assert_eq!("abcdef", s.get_value());
    }
}
