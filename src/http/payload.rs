//! Payload sources for entity construction.

use crate::http::streaming::PayloadShape;
use bytes::{Buf, Bytes};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// A byte-stream source that can be reopened from the beginning any number
/// of times without re-issuing the I/O that produced it.
pub trait CursorProvider: Send + Sync {
    /// Open a fresh cursor positioned at the start of the content.
    fn open_cursor(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Total content length, when the backing store knows it.
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

/// Repeatable cursor over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct BytesCursor {
    data: Bytes,
}

impl BytesCursor {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl CursorProvider for BytesCursor {
    fn open_cursor(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(self.data.clone().reader()))
    }

    fn size_hint(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// Repeatable cursor over a file on disk.
///
/// Each `open_cursor` call opens the file again, so concurrent readers do
/// not share a seek position.
#[derive(Debug, Clone)]
pub struct FileCursor {
    path: PathBuf,
}

impl FileCursor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CursorProvider for FileCursor {
    fn open_cursor(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn size_hint(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }
}

/// Body source handed to the entity builder.
#[derive(Default)]
pub enum Payload {
    /// No body.
    #[default]
    Empty,
    /// In-memory bytes.
    Bytes(Bytes),
    /// A stream that may be read at most once (e.g. a live socket).
    Stream(Box<dyn Read + Send>),
    /// A cursor-backed stream that can be reopened from the start.
    Repeatable(Arc<dyn CursorProvider>),
}

impl Payload {
    /// Shape of this payload, for the streaming policy.
    pub fn shape(&self) -> PayloadShape {
        match self {
            Payload::Empty => PayloadShape::Empty,
            Payload::Bytes(b) => PayloadShape::Bytes(b.len() as u64),
            Payload::Stream(_) => PayloadShape::SingleUseStream,
            Payload::Repeatable(_) => PayloadShape::RepeatableStream,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Wrap a single-use reader.
    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Payload::Stream(Box::new(reader))
    }

    /// Wrap a repeatable cursor provider.
    pub fn repeatable(provider: impl CursorProvider + 'static) -> Self {
        Payload::Repeatable(Arc::new(provider))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("Payload::Empty"),
            Payload::Bytes(b) => write!(f, "Payload::Bytes({} bytes)", b.len()),
            Payload::Stream(_) => f.write_str("Payload::Stream"),
            Payload::Repeatable(_) => f.write_str("Payload::Repeatable"),
        }
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        if b.is_empty() {
            Payload::Empty
        } else {
            Payload::Bytes(b)
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Bytes::from(v).into()
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for Payload {
    fn from(s: &'static str) -> Self {
        Bytes::from_static(s.as_bytes()).into()
    }
}
