//! The document snapshot (§3.1): `{version, pieceTable, lineIndex,
//! selection, history, metadata}`. Every component but `version` is
//! `Arc`-wrapped so that an action touching only one of them (e.g.
//! `SET_SELECTION`) can hand back a new `DocumentState` that shares every
//! other component by pointer — the structural-sharing invariant the
//! selectors and tests both rely on.

use std::sync::Arc;

use textbuf::PieceTree;

use crate::config::Config;
use crate::history::HistoryState;
use crate::line_index::LineIndexState;
use crate::metadata::DocumentMetadata;
use crate::selection::SelectionState;

#[derive(Debug, Clone)]
pub struct DocumentState {
    pub version: u64,
    pub piece_table: Arc<PieceTree>,
    pub line_index: Arc<LineIndexState>,
    pub selection: Arc<SelectionState>,
    pub history: Arc<HistoryState>,
    pub metadata: Arc<DocumentMetadata>,
}

impl DocumentState {
    pub fn empty(config: Config) -> DocumentState {
        let piece_table = match &config.content {
            Some(text) if !text.is_empty() => PieceTree::from(text.as_bytes()),
            _ => PieceTree::new(),
        };
        let line_index = match &config.content {
            Some(text) if !text.is_empty() => LineIndexState::from_text(text),
            _ => LineIndexState::empty(),
        };
        DocumentState {
            version: 0,
            piece_table: Arc::new(piece_table),
            line_index: Arc::new(line_index),
            selection: Arc::new(SelectionState::initial()),
            history: Arc::new(HistoryState::new(config.history_limit)),
            metadata: Arc::new(DocumentMetadata::new(
                config.encoding,
                config.line_ending,
            )),
        }
    }

    pub fn total_length(&self) -> u64 {
        self.piece_table.len()
    }

    pub fn get_value(&self) -> String {
        self.piece_table.get_text()
    }

    /// Reference-equality check across every component, used by
    /// no-op-preserving reducer branches and the structural-sharing tests.
    pub fn is_identical_to(&self, other: &DocumentState) -> bool {
        self.version == other.version
            && Arc::ptr_eq(&self.piece_table, &other.piece_table)
            && Arc::ptr_eq(&self.line_index, &other.line_index)
            && Arc::ptr_eq(&self.selection, &other.selection)
            && Arc::ptr_eq(&self.history, &other.history)
            && Arc::ptr_eq(&self.metadata, &other.metadata)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_config_yields_empty_document() {
        let s = DocumentState::empty(Config::default());
        assert_eq!(0, s.total_length());
        assert_eq!(1, s.line_index.line_count());
        assert_eq!("", s.get_value());
    }

    #[test]
    fn initial_content_seeds_both_trees() {
        let s = DocumentState::empty(Config {
            content: Some("a\nb".to_string()),
            ..Config::default()
        });
        assert_eq!(3, s.total_length());
        assert_eq!(2, s.line_index.line_count());
    }
}
