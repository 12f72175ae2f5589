use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::protocol::error::{ProxrpcError, Result};

/// Read cursor over an encoded byte buffer.
///
/// Values are decoded one record at a time with `postcard`, so a reader can
/// inspect a leading record (such as a proxy identity) before deciding whether
/// anything else follows.
///
/// # Example
///
/// ```
/// use proxrpc_common::codec::{InputStream, OutputStream};
///
/// let mut out = OutputStream::new();
/// out.write(&42u32).unwrap();
/// out.write("hello").unwrap();
///
/// let bytes = out.into_bytes();
/// let mut input = InputStream::new(&bytes);
/// assert_eq!(input.read::<u32>().unwrap(), 42);
/// assert_eq!(input.read::<String>().unwrap(), "hello");
/// assert!(input.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct InputStream<'a> {
    buf: &'a [u8],
}

impl<'a> InputStream<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Decodes the next record and advances past it.
    ///
    /// # Errors
    ///
    /// [`ProxrpcError::Truncated`] if the buffer ends inside the record,
    /// [`ProxrpcError::Encoding`] for any other malformed input.
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<T> {
        match postcard::take_from_bytes::<T>(self.buf) {
            Ok((value, rest)) => {
                self.buf = rest;
                Ok(value)
            }
            Err(postcard::Error::DeserializeUnexpectedEnd) => Err(ProxrpcError::Truncated(
                format!("{} byte(s) left", self.buf.len()),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Growable sink that records are appended to.
#[derive(Debug, Clone, Default)]
pub struct OutputStream {
    buf: Vec<u8>,
}

impl OutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let encoded = postcard::to_allocvec(value)?;
        self.buf.extend_from_slice(&encoded);
        Ok(())
    }

    /// Appends everything written to `other`.
    pub fn append(&mut self, other: OutputStream) {
        self.buf.extend_from_slice(&other.buf);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
