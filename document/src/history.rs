//! Undo/redo state (§3.1, §4.4). Pure data plus the mechanical stack
//! operations; the *decision* of whether an incoming edit coalesces into the
//! top entry is the reducer's, since it needs to compare the new action
//! against the top entry's shape — this module only knows how to push,
//! replace-top, pop and trim.

use crate::selection::SelectionState;

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryChange {
    Insert {
        position: usize,
        text: String,
    },
    Delete {
        position: usize,
        text: String,
    },
    Replace {
        position: usize,
        new_text: String,
        old_text: String,
    },
}

impl HistoryChange {
    /// The change that undoes this one.
    pub fn invert(&self) -> HistoryChange {
        match self {
            HistoryChange::Insert { position, text } => HistoryChange::Delete {
                position: *position,
                text: text.clone(),
            },
            HistoryChange::Delete { position, text } => HistoryChange::Insert {
                position: *position,
                text: text.clone(),
            },
            HistoryChange::Replace {
                position,
                new_text,
                old_text,
            } => HistoryChange::Replace {
                position: *position,
                new_text: old_text.clone(),
                old_text: new_text.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub changes: Vec<HistoryChange>,
    pub selection_before: SelectionState,
    pub selection_after: SelectionState,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    limit: usize,
}

impl HistoryState {
    pub fn new(limit: usize) -> HistoryState {
        HistoryState {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn undo_stack(&self) -> &[HistoryEntry] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[HistoryEntry] {
        &self.redo_stack
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn top_undo(&self) -> Option<&HistoryEntry> {
        self.undo_stack.last()
    }

    /// Push a brand-new entry: empties redo, trims from the oldest end if
    /// over `limit`.
    pub fn push_new(&self, entry: HistoryEntry) -> HistoryState {
        let mut undo_stack = self.undo_stack.clone();
        undo_stack.push(entry);
        if undo_stack.len() > self.limit {
            let overflow = undo_stack.len() - self.limit;
            undo_stack.drain(0..overflow);
        }
        HistoryState {
            undo_stack,
            redo_stack: Vec::new(),
            limit: self.limit,
        }
    }

    /// Replace the top undo entry with `merged` (the coalesced case). Redo
    /// is still cleared, matching "any non-history mutating push empties
    /// redo."
    pub fn replace_top_undo(&self, merged: HistoryEntry) -> HistoryState {
        let mut undo_stack = self.undo_stack.clone();
        undo_stack.pop();
        undo_stack.push(merged);
        HistoryState {
            undo_stack,
            redo_stack: Vec::new(),
            limit: self.limit,
        }
    }

    pub fn pop_undo_to_redo(&self) -> Option<(HistoryEntry, HistoryState)> {
        let mut undo_stack = self.undo_stack.clone();
        let entry = undo_stack.pop()?;
        let mut redo_stack = self.redo_stack.clone();
        redo_stack.push(entry.clone());
        Some((
            entry,
            HistoryState {
                undo_stack,
                redo_stack,
                limit: self.limit,
            },
        ))
    }

    pub fn pop_redo_to_undo(&self) -> Option<(HistoryEntry, HistoryState)> {
        let mut redo_stack = self.redo_stack.clone();
        let entry = redo_stack.pop()?;
        let mut undo_stack = self.undo_stack.clone();
        undo_stack.push(entry.clone());
        Some((
            entry,
            HistoryState {
                undo_stack,
                redo_stack,
                limit: self.limit,
            },
        ))
    }

    pub fn clear(&self) -> HistoryState {
        HistoryState {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::selection::SelectionRange;

    fn entry(text: &str) -> HistoryEntry {
        HistoryEntry {
            changes: vec![HistoryChange::Insert {
                position: 0,
                text: text.to_string(),
            }],
            selection_before: SelectionState::single(SelectionRange::caret(0)),
            selection_after: SelectionState::single(SelectionRange::caret(text.len())),
            timestamp: 0,
        }
    }

    #[test]
    fn push_new_clears_redo() {
        let h = HistoryState::new(10);
        let (_, h) = h.push_new(entry("a")).pop_undo_to_redo().unwrap();
        assert_eq!(1, h.redo_stack().len());
        let h = h.push_new(entry("b"));
        assert!(h.redo_stack().is_empty());
    }

    #[test]
    fn limit_drops_oldest() {
        let mut h = HistoryState::new(2);
        h = h.push_new(entry("a"));
        h = h.push_new(entry("b"));
        h = h.push_new(entry("c"));
        assert_eq!(2, h.undo_stack().len());
        assert_eq!("b", match &h.undo_stack()[0].changes[0] {
            HistoryChange::Insert { text, .. } => text.as_str(),
            _ => unreachable!(),
        });
    }

    #[test]
    fn invert_swaps_insert_and_delete() {
        let c = HistoryChange::Insert {
            position: 2,
            text: "x".to_string(),
        };
        assert_eq!(
            HistoryChange::Delete {
                position: 2,
                text: "x".to_string()
            },
            c.invert()
        );
    }
}
