pub(crate) mod buffers;
pub(crate) mod builder;
pub(crate) mod bytes;
pub(crate) mod chunks;
pub(crate) mod tree;
pub(crate) mod utf8;

use std::io;
use std::ops::{Bound, RangeBounds};

use self::buffers::{AddBuffer, BufferKind, OriginalBuffer};
use self::bytes::Bytes;
use self::chunks::Chunks;
use self::tree::piece::Piece;
use self::tree::Tree;
use self::utf8::chars::Chars;

/// A cheap, immutable snapshot of a document's content. Because the tree is
/// persistent, taking one is an `Arc` clone of the root, not a copy of the
/// underlying bytes; restoring one never touches the add buffer, which only
/// ever grows.
#[derive(Debug, Clone)]
pub struct Snapshot {
    tree: Tree,
    len: u64,
}

/// A persistent piece table over two backing buffers: an immutable original
/// buffer holding a document's initial content, and an append-only add
/// buffer receiving every byte inserted afterwards.
///
/// Every mutating method replaces the internal tree with a new persistent
/// version; older [`Snapshot`]s (and clones of `PieceTree` itself) keep
/// seeing the tree as it was when they were taken.
#[derive(Debug, Clone)]
pub struct PieceTree {
    pub(crate) tree: Tree,
    pub(crate) orig: OriginalBuffer,
    pub(crate) add: AddBuffer,
    pub(crate) len: u64,
}

impl PieceTree {
    /// Create a new, empty piece tree.
    #[inline]
    pub fn new() -> PieceTree {
        PieceTree {
            tree: Tree::new(),
            orig: OriginalBuffer::new(),
            add: AddBuffer::new(),
            len: 0,
        }
    }

    /// Build a document whose initial content is read from `reader`. The
    /// bytes are copied into memory once, up front; no further I/O happens.
    #[inline]
    pub fn from_reader<R: io::Read>(reader: R) -> io::Result<PieceTree> {
        let orig = OriginalBuffer::from_reader(reader)?;
        log::debug!("built piece tree from reader: {} original bytes", orig.len());
        Ok(Self::from_original_buffer(orig))
    }

    pub(crate) fn from_original_buffer(orig: OriginalBuffer) -> PieceTree {
        let len = orig.len() as u64;
        let mut tree = Tree::new();
        if len > 0 {
            tree.insert(0, Piece::new(BufferKind::Original, 0, len), false);
        }
        PieceTree {
            tree,
            orig,
            add: AddBuffer::new(),
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of pieces currently in the tree. Exposed for tests and
    /// diagnostics; callers should not depend on a particular piece count
    /// for otherwise-equivalent documents.
    #[inline]
    pub fn piece_count(&self) -> usize {
        self.tree.node_count
    }

    /// Insert `bytes` at byte offset `pos`. All inserted content lands in
    /// the add buffer; if the insertion directly abuts the add buffer's
    /// last piece, the tree coalesces it into that piece instead of
    /// allocating a new node.
    pub fn insert<B: AsRef<[u8]>>(&mut self, pos: u64, bytes: B) {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return;
        }

        debug_assert!(
            pos <= self.len,
            "insert: attempting to index {pos} over buffer len {}",
            self.len
        );

        let add_pos = self.add.len() as u64;
        self.add.extend(bytes);

        let piece = Piece::new(BufferKind::Add, add_pos, bytes.len() as u64);
        self.tree.insert(pos, piece, true);
        self.len += bytes.len() as u64;
    }

    #[inline]
    pub fn insert_str(&mut self, pos: u64, string: &str) {
        self.insert(pos, string.as_bytes());
    }

    pub fn insert_char(&mut self, pos: u64, ch: char) {
        let mut buf = [0u8; 4];
        self.insert(pos, ch.encode_utf8(&mut buf).as_bytes());
    }

    /// Insert `bytes` at the end of the document.
    #[inline]
    pub fn append<B: AsRef<[u8]>>(&mut self, bytes: B) {
        let pos = self.len;
        self.insert(pos, bytes);
    }

    /// Remove a byte range. Accepts any `RangeBounds<u64>`, so `pt.remove(5..)`
    /// and `pt.remove(..)` both work as one would expect.
    pub fn remove<R: RangeBounds<u64>>(&mut self, range: R) {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e + 1,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };

        debug_assert!(
            end <= self.len,
            "remove: attempting to index {end} over buffer len {}",
            self.len
        );

        if start >= end {
            return;
        }

        self.tree.remove(start..end);
        self.len -= end - start;
    }

    #[inline]
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::new(self, 0)
    }

    #[inline]
    pub fn chunks_at(&self, pos: u64) -> Chunks<'_> {
        Chunks::new(self, pos)
    }

    #[inline]
    pub fn bytes(&self) -> Bytes<'_> {
        Bytes::new(self, 0)
    }

    #[inline]
    pub fn bytes_at(&self, pos: u64) -> Bytes<'_> {
        Bytes::new(self, pos)
    }

    #[inline]
    pub fn chars(&self) -> Chars<'_> {
        Chars::new(self, 0)
    }

    #[inline]
    pub fn chars_at(&self, pos: u64) -> Chars<'_> {
        Chars::new(self, pos)
    }

    /// Materialize the document's content as a `String`, replacing any
    /// invalid UTF-8 with `U+FFFD` as it goes (a piece only guarantees a
    /// byte range, never UTF-8 validity, so this can never panic).
    pub fn get_text(&self) -> String {
        String::from(self)
    }

    /// Materialize the byte range `[start, end)` as a `String`, same
    /// replacement-character behavior as [`Self::get_text`].
    pub fn get_text_range(&self, start: u64, end: u64) -> String {
        let start = start.min(self.len);
        let end = end.min(self.len).max(start);
        let mut s = String::with_capacity((end - start) as usize);
        let mut chars = self.chars_at(start);
        while let Some((char_start, _, ch)) = chars.next() {
            if char_start >= end {
                break;
            }
            s.push(ch);
        }
        s
    }

    /// Take a cheap snapshot of the current tree, for later rollback.
    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tree: self.tree.clone(),
            len: self.len,
        }
    }

    /// Restore the tree to a previously taken snapshot. The add buffer is
    /// untouched: bytes already appended stay put, simply unreferenced by
    /// any piece until something points at them again.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.tree = snapshot.tree;
        self.len = snapshot.len;
    }
}

impl Default for PieceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AsRef<[u8]>> From<A> for PieceTree {
    fn from(value: A) -> Self {
        PieceTree::from_reader(io::Cursor::new(value.as_ref())).unwrap()
    }
}

impl From<&PieceTree> for String {
    fn from(pt: &PieceTree) -> String {
        let mut s = String::with_capacity(pt.len() as usize);
        let mut chars = pt.chars();
        while let Some((_, _, ch)) = chars.next() {
            s.push(ch);
        }
        s
    }
}
