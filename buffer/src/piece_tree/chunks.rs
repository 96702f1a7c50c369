use super::{
    buffers::BufferKind,
    tree::{piece::Piece, pieces::Pieces},
    PieceTree,
};

/// A contiguous run of bytes backed directly by one of the two buffers. No
/// copy is made; `Chunk` just borrows from whichever buffer the piece
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a>(pub(crate) &'a [u8]);

impl<'a> AsRef<[u8]> for Chunk<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        self.0
    }
}

/// Iterates the pieces of a document as borrowed byte chunks, in order.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    pt: &'a PieceTree,
    pieces: Pieces<'a>,
}

impl<'a> Chunks<'a> {
    #[inline]
    pub(crate) fn new(pt: &'a PieceTree, at: u64) -> Chunks<'a> {
        let pieces = Pieces::new(pt, at);
        Chunks { pt, pieces }
    }

    #[inline]
    pub fn get(&self) -> Option<(u64, Chunk<'a>)> {
        let (p_pos, piece) = self.pieces.get()?;
        let chunk = read_piece(self.pt, &piece)?;
        Some((p_pos, chunk))
    }

    #[inline]
    pub fn next(&mut self) -> Option<(u64, Chunk<'a>)> {
        let (p_pos, piece) = self.pieces.next()?;
        let chunk = read_piece(self.pt, &piece)?;
        Some((p_pos, chunk))
    }

    #[inline]
    pub fn prev(&mut self) -> Option<(u64, Chunk<'a>)> {
        let (p_pos, piece) = self.pieces.prev()?;
        let chunk = read_piece(self.pt, &piece)?;
        Some((p_pos, chunk))
    }

    pub fn buffer_len(&self) -> u64 {
        self.pt.len()
    }
}

#[inline(always)]
fn read_piece<'a>(pt: &'a PieceTree, piece: &Piece) -> Option<Chunk<'a>> {
    let start = piece.pos as usize;
    let end = (piece.pos + piece.len) as usize;
    match piece.kind {
        BufferKind::Add => Some(Chunk(pt.add.slice(start..end))),
        BufferKind::Original => Some(Chunk(pt.orig.slice(start..end))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::PieceTree;

    fn chunk(pos: u64, string: &str) -> Option<(u64, Chunk)> {
        Some((pos, Chunk(string.as_bytes())))
    }

    #[test]
    fn next_start() {
        let mut pt = PieceTree::new();
        pt.insert(0, "bar");
        pt.insert(0, "foo");

        let mut chunks = pt.chunks();

        assert_eq!(chunk(0, "foo"), chunks.get());
        assert_eq!(chunk(3, "bar"), chunks.next());

        assert_eq!(None, chunks.next());
        assert_eq!(None, chunks.next());
        assert_eq!(None, chunks.next());
    }

    #[test]
    fn prev_end() {
        let mut pt = PieceTree::new();
        pt.insert(0, "bar");
        pt.insert(0, "foo");

        let mut chunks = pt.chunks_at(pt.len());

        assert_eq!(None, chunks.get());

        assert_eq!(chunk(3, "bar"), chunks.prev());
        assert_eq!(chunk(0, "foo"), chunks.prev());

        assert_eq!(None, chunks.prev());
        assert_eq!(chunk(0, "foo"), chunks.get());
    }

    #[test]
    fn next_prev() {
        let mut pt = PieceTree::new();
        pt.insert(0, "bar");
        pt.insert(0, "foo");

        let mut chunks = pt.chunks();

        assert_eq!(chunk(0, "foo"), chunks.get());
        assert_eq!(chunk(3, "bar"), chunks.next());
        assert_eq!(chunk(0, "foo"), chunks.prev());
    }

    #[test]
    fn prev_next() {
        let mut pt = PieceTree::new();
        pt.insert(0, "bar");
        pt.insert(0, "foo");

        let mut chunks = pt.chunks_at(pt.len());

        assert_eq!(None, chunks.get());
        assert_eq!(chunk(3, "bar"), chunks.prev());
        assert_eq!(chunk(0, "foo"), chunks.prev());
        assert_eq!(chunk(3, "bar"), chunks.next());
    }
}
