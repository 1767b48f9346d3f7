//! Cache Value Module
//!
//! Defines what a cache can store and the default immutable byte buffer.

use std::fmt;

use bytes::Bytes;

// == Value Trait ==
/// Capability a type needs to be stored in a cache.
///
/// `from_bytes` is the value factory used on the miss path and on explicit
/// writes; `byte_len` feeds the byte accounting.
pub trait Value: Clone + Send + Sync + 'static {
    /// Builds a value from raw bytes.
    fn from_bytes(bytes: Vec<u8>) -> Self;

    /// Number of bytes this value accounts for.
    fn byte_len(&self) -> usize;

    /// Returns a copy of the raw bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

// == Byte View ==
/// Immutable byte buffer, the default cache value.
///
/// Clones share the underlying buffer; `to_bytes` hands out a copy so
/// callers can never mutate cached data.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView(Bytes);

impl ByteView {
    /// Creates a view over the given bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Borrows the underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Value for ByteView {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }

    fn byte_len(&self) -> usize {
        self.0.len()
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({:?})", String::from_utf8_lossy(&self.0))
    }
}
