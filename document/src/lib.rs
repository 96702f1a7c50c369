//! An in-memory text document engine: a piece-table buffer plus a line
//! index, wrapped in a pure reducer/transaction/store stack so multiple
//! observers can share one document without racing each other.
//!
//! The module layout mirrors the buffer crate's own split between a pure
//! data structure (`piece_tree`) and the thin mutable shell around it
//! (`PieceTree` itself): everything through [`reducer`] is pure, data-in
//! data-out; [`store`] is the one place state actually lives, and [`event`]
//! is an optional layer on top of it for hosts that want named events
//! instead of a single change notification.

mod action;
mod config;
mod diff;
mod error;
mod event;
mod history;
mod line_index;
mod metadata;
mod position;
mod range;
mod reducer;
mod render;
mod selection;
mod state;
mod store;
mod transaction;

pub use action::{
    deserialize_action, serialize_action, DocumentAction, RemoteChange,
};
pub use config::Config;
pub use diff::{
    compute_set_value_actions, compute_set_value_actions_optimized, diff, DiffResult, Edit,
    EditKind,
};
pub use error::{ActionError, Diagnostic, DiagnosticSink, LogDiagnosticSink, TransactionError};
pub use event::{EventKind, EventStore};
pub use history::{HistoryChange, HistoryEntry, HistoryState};
pub use line_index::{
    reconcile_full, reconcile_range, reconcile_viewport, DirtyRange, EagerLineIndex, LazyLineIndex,
    LineIndexState, LineIndexStrategy, LineInfo,
};
pub use metadata::{DocumentMetadata, LineEnding};
pub use position::{ByteLen, ByteOffset, CharOffset, Column, LineNumber};
pub use range::{ByteRange, Range};
pub use reducer::{reduce, ReducerConfig};
pub use render::{
    char_offsets_to_selection, get_visible_line_range, get_visible_lines,
    line_column_to_position, position_to_line_column, selection_to_char_offsets, CharSelectionRange,
    LineColumn, LineHeightConfig, ValueStream, VisibleLineRange,
};
pub use selection::{SelectionRange, SelectionState};
pub use state::DocumentState;
pub use store::{IdleDeadline, ListenerId, Scheduler, Store};
pub use transaction::{CommitResult, TransactionManager};

#[cfg(test)]
mod test {
    use super::*;

    /// Scenario F from the testable-properties list: a host builds a
    /// document, types a few characters (coalescing into one undo entry),
    /// undoes, and gets back exactly the pre-typing text.
    #[test]
    fn end_to_end_type_then_undo_round_trips_through_the_store() {
        let mut store = Store::new(
            DocumentState::empty(Config {
                content: Some("start".to_string()),
                ..Config::default()
            }),
            Box::new(EagerLineIndex),
        );

        store.dispatch(
            DocumentAction::Insert {
                start: 5,
                text: " ".to_string(),
            },
            0,
        );
        store.dispatch(
            DocumentAction::Insert {
                start: 6,
                text: "a".to_string(),
            },
            10,
        );
        store.dispatch(
            DocumentAction::Insert {
                start: 7,
                text: "b".to_string(),
            },
            20,
        );
        assert_eq!("start ab", store.get_snapshot().get_value());
        assert_eq!(1, store.get_snapshot().history.undo_stack().len());

        store.dispatch(DocumentAction::Undo, 30);
        assert_eq!("start", store.get_snapshot().get_value());

        store.dispatch(DocumentAction::Redo, 40);
        assert_eq!("start ab", store.get_snapshot().get_value());
    }
}
