/// Which of the two backing buffers a piece indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BufferKind {
    Add,
    Original,
}

/// The original buffer holds the document's initial content. It never
/// changes for the lifetime of the document: pieces may reference it, but
/// nothing ever mutates the bytes underneath them.
#[derive(Debug, Clone, Default)]
pub(crate) struct OriginalBuffer {
    bytes: Vec<u8>,
}

impl OriginalBuffer {
    #[inline]
    pub fn new() -> OriginalBuffer {
        OriginalBuffer { bytes: Vec::new() }
    }

    #[inline]
    pub fn from_vec(bytes: Vec<u8>) -> OriginalBuffer {
        OriginalBuffer { bytes }
    }

    #[inline]
    pub fn from_reader<R: std::io::Read>(mut reader: R) -> std::io::Result<OriginalBuffer> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(OriginalBuffer { bytes })
    }

    #[inline]
    pub fn slice(&self, range: std::ops::Range<usize>) -> &[u8] {
        &self.bytes[range]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Minimum capacity the add buffer grows to on its first allocation, and the
/// floor for every doubling step after that.
const ADD_BUFFER_MIN_CAPACITY: usize = 1024;

/// Append-only buffer that receives every byte inserted into the document.
/// Bytes already written are never modified or relocated; only the capacity
/// grows, geometrically, so existing `&[u8]` borrows taken through a piece
/// stay valid for the life of this buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct AddBuffer {
    bytes: Vec<u8>,
}

impl AddBuffer {
    #[inline]
    pub fn new() -> AddBuffer {
        AddBuffer { bytes: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn slice(&self, range: std::ops::Range<usize>) -> &[u8] {
        &self.bytes[range]
    }

    /// Append `data`, growing capacity geometrically (doubling, starting
    /// from `ADD_BUFFER_MIN_CAPACITY`) rather than relying on the growth
    /// factor `Vec` happens to use, so the policy is an explicit, testable
    /// contract rather than an implementation detail of the standard
    /// library.
    pub fn extend(&mut self, data: &[u8]) {
        self.reserve_for(data.len());
        self.bytes.extend_from_slice(data);
    }

    fn reserve_for(&mut self, additional: usize) {
        let needed = self.bytes.len() + additional;
        let mut cap = self.bytes.capacity();
        if cap == 0 {
            cap = ADD_BUFFER_MIN_CAPACITY;
        }
        while cap < needed {
            cap *= 2;
        }
        if cap > self.bytes.capacity() {
            self.bytes.reserve(cap - self.bytes.len());
        }
    }
}
