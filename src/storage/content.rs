//! One-shot byte streams with an optional declared length.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};

/// Upper bound on the buffer reserved up front from a declared size.
const MAX_PREALLOCATION: u64 = 64 * 1024;

/// A stream of bytes read from (or written to) a storage.
///
/// `Content` is consumed by value, so a single instance can be read at most
/// once. Delivering the same bytes twice requires buffering them with
/// [`Content::into_bytes`] or reading the value again from storage.
pub struct Content {
    stream: BoxStream<'static, io::Result<Bytes>>,
    size: Option<u64>,
}

impl Content {
    /// Content with no bytes and a known size of zero.
    pub fn empty() -> Self {
        Self {
            stream: stream::empty().boxed(),
            size: Some(0),
        }
    }

    /// Content backed by an in-memory buffer.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        let stream = if data.is_empty() {
            stream::empty().boxed()
        } else {
            stream::once(async move { Ok(data) }).boxed()
        };
        Self {
            stream,
            size: Some(size),
        }
    }

    /// Content backed by an arbitrary chunk stream.
    pub fn from_stream<S>(stream: S, size: Option<u64>) -> Self
    where
        S: futures::Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
            size,
        }
    }

    /// The declared size in bytes, if known.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Take the underlying chunk stream.
    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.stream
    }

    /// Read the whole stream into memory.
    ///
    /// The declared size is only a hint: it may come from an untrusted
    /// upstream, so the buffer grows with the bytes actually received.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        let capacity = self.size.unwrap_or(0).min(MAX_PREALLOCATION);
        let mut buffer = BytesMut::with_capacity(capacity as usize);
        let mut stream = self.stream;
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    /// Read the whole stream and decode it as UTF-8.
    pub async fn into_string(self) -> io::Result<String> {
        let bytes = self.into_bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content").field("size", &self.size).finish()
    }
}

impl From<Vec<u8>> for Content {
    fn from(data: Vec<u8>) -> Self {
        Content::from_bytes(data)
    }
}

impl From<&'static [u8]> for Content {
    fn from(data: &'static [u8]) -> Self {
        Content::from_bytes(Bytes::from_static(data))
    }
}

impl From<Bytes> for Content {
    fn from(data: Bytes) -> Self {
        Content::from_bytes(data)
    }
}
