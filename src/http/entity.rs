//! Wire-level entity construction.
//!
//! [`build`] turns a [`Payload`] plus an [`EncodingDecision`] into an
//! [`HttpEntity`]. Buffering drains the source stream exactly once and the
//! source is dropped (closed) on every exit path, including read errors.

use crate::base::error::EntityError;
use crate::http::payload::{BytesCursor, CursorProvider, Payload};
use crate::http::streaming::EncodingDecision;
use bytes::{Buf, Bytes};
use std::fmt;
use std::io::Read;
use std::sync::{Arc, Mutex};
use tracing::debug;

enum EntityInner {
    Empty,
    /// Fully materialized; `content()` replays from the buffer.
    Buffered(Bytes),
    /// Single-use stream handed to the wire unconsumed; `content()` can
    /// surrender it exactly once.
    StreamOnce(Mutex<Option<Box<dyn Read + Send>>>),
    /// Cursor-backed; `content()` opens a fresh cursor per call.
    Repeatable(Arc<dyn CursorProvider>),
}

/// The wire-level representation of an HTTP message body.
pub struct HttpEntity {
    inner: EntityInner,
}

impl HttpEntity {
    /// An entity with no body.
    pub fn empty() -> Self {
        Self {
            inner: EntityInner::Empty,
        }
    }

    /// True when the body will be chunk-framed rather than length-framed.
    pub fn is_streaming(&self) -> bool {
        matches!(
            self.inner,
            EntityInner::StreamOnce(_) | EntityInner::Repeatable(_)
        )
    }

    /// Exact byte length, known only for empty and buffered entities.
    pub fn bytes_length(&self) -> Option<u64> {
        match &self.inner {
            EntityInner::Empty => Some(0),
            EntityInner::Buffered(b) => Some(b.len() as u64),
            EntityInner::StreamOnce(_) | EntityInner::Repeatable(_) => None,
        }
    }

    /// Open the body content.
    ///
    /// Buffered entities replay from memory on every call; repeatable
    /// entities open a fresh cursor; a single-use streaming entity can be
    /// opened exactly once, after which [`EntityError::StreamConsumed`] is
    /// returned rather than silently re-reading the source.
    pub fn content(&self) -> Result<Box<dyn Read + Send>, EntityError> {
        match &self.inner {
            EntityInner::Empty => Ok(Box::new(Bytes::new().reader())),
            EntityInner::Buffered(b) => Ok(Box::new(b.clone().reader())),
            EntityInner::StreamOnce(slot) => {
                let taken = slot
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .take();
                taken.ok_or(EntityError::StreamConsumed)
            }
            EntityInner::Repeatable(provider) => provider
                .open_cursor()
                .map_err(EntityError::Transformation),
        }
    }
}

impl fmt::Debug for HttpEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            EntityInner::Empty => f.write_str("HttpEntity::Empty"),
            EntityInner::Buffered(b) => write!(f, "HttpEntity::Buffered({} bytes)", b.len()),
            EntityInner::StreamOnce(_) => f.write_str("HttpEntity::StreamOnce"),
            EntityInner::Repeatable(_) => f.write_str("HttpEntity::Repeatable"),
        }
    }
}

/// Drain a source into memory. The source is owned and therefore dropped on
/// every path out of this function, so a read error cannot leak it.
fn materialize(mut source: Box<dyn Read + Send>) -> Result<Bytes, EntityError> {
    let mut buf = Vec::new();
    source
        .read_to_end(&mut buf)
        .map_err(EntityError::Transformation)?;
    Ok(Bytes::from(buf))
}

fn check_declared_length(bytes: &Bytes, expected: Option<u64>) -> Result<(), EntityError> {
    match expected {
        Some(n) if n != bytes.len() as u64 => Err(EntityError::ContentLengthMismatch {
            expected: n,
            actual: bytes.len() as u64,
        }),
        _ => Ok(()),
    }
}

/// Build the wire entity for a payload under an already-made decision.
///
/// May block while draining a stream payload; callers on a latency-sensitive
/// thread should offload via [`crate::http::dispatcher::DeferredDispatcher`].
pub fn build(payload: Payload, decision: EncodingDecision) -> Result<HttpEntity, EntityError> {
    match decision {
        EncodingDecision::Empty => {
            // Payload, if any, is dropped here; dropping closes the source.
            Ok(HttpEntity::empty())
        }
        EncodingDecision::Chunked => match payload {
            Payload::Empty => Ok(HttpEntity::empty()),
            Payload::Bytes(b) => {
                // Forced streaming over known bytes: a repeatable view over
                // the existing buffer, no copy.
                Ok(HttpEntity {
                    inner: EntityInner::Repeatable(Arc::new(BytesCursor::new(b))),
                })
            }
            Payload::Stream(s) => Ok(HttpEntity {
                inner: EntityInner::StreamOnce(Mutex::new(Some(s))),
            }),
            Payload::Repeatable(provider) => Ok(HttpEntity {
                inner: EntityInner::Repeatable(provider),
            }),
        },
        EncodingDecision::ContentLength(expected) => match payload {
            Payload::Empty => {
                check_declared_length(&Bytes::new(), expected)?;
                Ok(HttpEntity::empty())
            }
            Payload::Bytes(b) => {
                check_declared_length(&b, expected)?;
                Ok(HttpEntity {
                    inner: EntityInner::Buffered(b),
                })
            }
            Payload::Stream(s) => {
                let bytes = materialize(s)?;
                debug!(len = bytes.len(), "buffered single-use stream");
                check_declared_length(&bytes, expected)?;
                Ok(HttpEntity {
                    inner: EntityInner::Buffered(bytes),
                })
            }
            Payload::Repeatable(provider) => {
                let cursor = provider
                    .open_cursor()
                    .map_err(EntityError::Transformation)?;
                let bytes = materialize(cursor)?;
                check_declared_length(&bytes, expected)?;
                Ok(HttpEntity {
                    inner: EntityInner::Buffered(bytes),
                })
            }
        },
    }
}
