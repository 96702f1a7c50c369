use super::{chunks::Chunks, PieceTree};

/// Byte-granularity cursor over a document. Walks chunk by chunk (each chunk
/// borrowed straight out of the add or original buffer) rather than copying
/// bytes, re-fetching the next/previous chunk only when the cursor steps
/// past the one it has cached.
#[derive(Debug, Clone)]
pub struct Bytes<'a> {
    pt: &'a PieceTree,
    chunks: Chunks<'a>,
    chunk: Option<(u64, &'a [u8])>,
    pos: u64,
}

impl<'a> Bytes<'a> {
    #[inline]
    pub(crate) fn new(pt: &'a PieceTree, at: u64) -> Bytes<'a> {
        let mut chunks = Chunks::new(pt, at);
        let chunk = chunks.get().map(|(p, c)| (p, c.0));
        Bytes {
            pt,
            chunks,
            chunk,
            pos: at,
        }
    }

    /// Current cursor position.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Reposition the cursor to an absolute byte offset.
    pub fn at(&mut self, pos: u64) {
        *self = Bytes::new(self.pt, pos);
    }

    /// Byte the cursor is currently positioned before, if any.
    pub fn get(&self) -> Option<u8> {
        let (start, chunk) = self.chunk?;
        let off = (self.pos - start) as usize;
        chunk.get(off).copied()
    }

    /// Return the byte after the cursor and advance past it.
    pub fn next(&mut self) -> Option<u8> {
        let byte = self.get()?;
        self.pos += 1;

        if let Some((start, chunk)) = self.chunk {
            if self.pos - start >= chunk.len() as u64 {
                self.chunk = self.chunks.next().map(|(p, c)| (p, c.0));
            }
        }

        Some(byte)
    }

    /// Move the cursor back one byte and return the byte now after it.
    pub fn prev(&mut self) -> Option<u8> {
        if self.pos == 0 {
            return None;
        }

        let need_prev_chunk = match self.chunk {
            Some((start, _)) => self.pos == start,
            None => true,
        };

        if need_prev_chunk {
            self.chunk = self.chunks.prev().map(|(p, c)| (p, c.0));
        }

        self.pos -= 1;
        self.get()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forward_across_pieces() {
        let mut pt = PieceTree::new();
        pt.insert(0, "baz");
        pt.insert(0, "bar");
        pt.insert(0, "foo");

        let mut bytes = Bytes::new(&pt, 0);
        let mut collected = Vec::new();
        while let Some(b) = bytes.next() {
            collected.push(b);
        }
        assert_eq!(b"foobarbaz".to_vec(), collected);
    }

    #[test]
    fn backward_across_pieces() {
        let mut pt = PieceTree::new();
        pt.insert(0, "baz");
        pt.insert(0, "bar");
        pt.insert(0, "foo");

        let mut bytes = Bytes::new(&pt, pt.len());
        let mut collected = Vec::new();
        while let Some(b) = bytes.prev() {
            collected.push(b);
        }
        collected.reverse();
        assert_eq!(b"foobarbaz".to_vec(), collected);
    }

    #[test]
    fn reposition() {
        let mut pt = PieceTree::new();
        pt.insert(0, "hello world");

        let mut bytes = Bytes::new(&pt, 0);
        bytes.at(6);
        assert_eq!(Some(b'w'), bytes.next());
    }
}
