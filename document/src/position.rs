//! Newtype position kinds. Five disjoint numeric kinds that must never be
//! mixed by accident: a byte offset is not a byte length is not a character
//! offset is not a line number is not a column. Conversions between them are
//! always named functions, never a blanket `From`/`Into`.

use std::fmt;
use std::ops::{Add, Sub};

macro_rules! position_newtype {
    ($name:ident) => {
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub usize);

        impl $name {
            #[inline]
            pub const fn new(value: usize) -> Self {
                $name(value)
            }

            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }
        }

        impl Add for $name {
            type Output = $name;
            #[inline]
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = $name;
            #[inline]
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

position_newtype!(ByteOffset);
position_newtype!(ByteLen);
position_newtype!(CharOffset);
position_newtype!(LineNumber);
position_newtype!(Column);

impl ByteOffset {
    /// Byte offset of the start of `line`, given the line's starting byte
    /// offset as already resolved by the line index. Named constructor so
    /// callers can't silently add a `LineNumber` to a `ByteOffset`.
    pub fn from_line_start(offset: usize) -> ByteOffset {
        ByteOffset(offset)
    }

    pub fn checked_sub(self, rhs: ByteLen) -> ByteOffset {
        ByteOffset(self.0.saturating_sub(rhs.0))
    }

    pub fn saturating_add(self, rhs: ByteLen) -> ByteOffset {
        ByteOffset(self.0 + rhs.0)
    }
}

impl ByteLen {
    pub fn of_str(s: &str) -> ByteLen {
        ByteLen(s.len())
    }

    pub fn of_bytes(b: &[u8]) -> ByteLen {
        ByteLen(b.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_stays_within_kind() {
        let a = ByteOffset::new(5);
        let b = ByteLen::of_str("hello");
        let c = a.saturating_add(b);
        assert_eq!(ByteOffset::new(10), c);
    }

    #[test]
    fn newtypes_do_not_implicitly_convert() {
        let line = LineNumber::new(3);
        let col = Column::new(3);
        // Both wrap the same raw value but are distinct types; this would
        // not compile if uncommented:
        // let _: ByteOffset = line;
        assert_eq!(line.get(), col.get());
    }
}
