mod cursor_iterator;
mod piece_tree;

pub use cursor_iterator::CursorIterator;
pub use piece_tree::{
    builder::PieceTreeBuilder, bytes::Bytes, chunks::Chunk, chunks::Chunks, PieceTree, Snapshot,
};

pub mod utf8 {
    pub use crate::piece_tree::utf8::chars::{decode_utf8, Chars};
}
