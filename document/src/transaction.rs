//! The transaction manager (§4.5): nested depth, a snapshot stack and a
//! pending-action log, owned exclusively by the store. Stack-structured, no
//! parent pointers, matching §9's "transaction nesting" guidance.

use crate::action::DocumentAction;
use crate::state::DocumentState;

#[derive(Debug, Clone, Default)]
pub struct TransactionManager {
    snapshot_stack: Vec<DocumentState>,
    pending_actions: Vec<DocumentAction>,
}

/// Result of [`TransactionManager::commit`].
pub struct CommitResult {
    pub is_outermost: bool,
    pub pending_actions: Vec<DocumentAction>,
}

impl TransactionManager {
    pub fn new() -> TransactionManager {
        TransactionManager {
            snapshot_stack: Vec::new(),
            pending_actions: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.snapshot_stack.len()
    }

    pub fn is_active(&self) -> bool {
        self.depth() > 0
    }

    pub fn begin(&mut self, current_state: DocumentState) {
        if self.depth() == 0 {
            self.pending_actions.clear();
        }
        self.snapshot_stack.push(current_state);
    }

    /// At depth 1 on entry, returns the accumulated pending actions and
    /// clears them; nested commits just decrement depth and return nothing.
    pub fn commit(&mut self) -> CommitResult {
        let is_outermost = self.depth() == 1;
        self.snapshot_stack.pop();
        if is_outermost {
            CommitResult {
                is_outermost,
                pending_actions: std::mem::take(&mut self.pending_actions),
            }
        } else {
            CommitResult {
                is_outermost,
                pending_actions: Vec::new(),
            }
        }
    }

    /// Pops and returns the snapshot at the current level; clears pending
    /// actions if this was the outermost level.
    pub fn rollback(&mut self) -> Option<DocumentState> {
        let snapshot = self.snapshot_stack.pop();
        if self.depth() == 0 {
            self.pending_actions.clear();
        }
        snapshot
    }

    pub fn track_action(&mut self, action: DocumentAction) {
        self.pending_actions.push(action);
    }

    /// Clears all state, returning the bottom (outermost) snapshot if any
    /// transaction was active.
    pub fn emergency_reset(&mut self) -> Option<DocumentState> {
        let bottom = self.snapshot_stack.first().cloned();
        self.snapshot_stack.clear();
        self.pending_actions.clear();
        bottom
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::DocumentState;

    #[test]
    fn nested_commit_returns_pending_only_at_depth_one() {
        let mut tx = TransactionManager::new();
        let s0 = DocumentState::empty(Default::default());
        tx.begin(s0.clone());
        tx.track_action(DocumentAction::Undo);
        tx.begin(s0.clone());
        tx.track_action(DocumentAction::Redo);

        let inner = tx.commit();
        assert!(!inner.is_outermost);
        assert!(inner.pending_actions.is_empty());

        let outer = tx.commit();
        assert!(outer.is_outermost);
        assert_eq!(2, outer.pending_actions.len());
        assert_eq!(0, tx.depth());
    }

    #[test]
    fn rollback_pops_exactly_one_level() {
        let mut tx = TransactionManager::new();
        let s0 = DocumentState::empty(Default::default());
        tx.begin(s0.clone());
        tx.begin(s0.clone());
        assert_eq!(2, tx.depth());
        tx.rollback();
        assert_eq!(1, tx.depth());
    }

    #[test]
    fn emergency_reset_returns_bottom_snapshot() {
        let mut tx = TransactionManager::new();
        let s0 = DocumentState::empty(Default::default());
        tx.begin(s0.clone());
        tx.begin(s0.clone());
        let bottom = tx.emergency_reset();
        assert!(bottom.is_some());
        assert_eq!(0, tx.depth());
    }
}
