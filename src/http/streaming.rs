//! Streaming-policy decisions.
//!
//! [`decide`] is a pure function: given the payload shape, the configured
//! [`StreamingMode`], and the framing headers already present, it picks how
//! the body goes on the wire (buffered with `Content-Length`, chunked, or
//! empty) and which header mutations must be applied before the entity is
//! built. It never touches the payload itself.

use http::{StatusCode, Version};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How a listener or requester prefers to transmit bodies.
///
/// Resolved once per exchange from configuration; immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamingMode {
    /// Infer from payload shape and existing headers.
    #[default]
    Auto,
    /// Stream with chunked encoding whenever the protocol allows it.
    Always,
    /// Buffer fully and send a Content-Length.
    Never,
}

/// Shape of the payload, without the payload itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Empty,
    /// In-memory bytes of known length.
    Bytes(u64),
    /// A stream that can be read exactly once.
    SingleUseStream,
    /// A cursor-backed stream that can be reopened from the start.
    RepeatableStream,
}

impl PayloadShape {
    /// Byte length, when known without consuming anything.
    pub fn known_length(&self) -> Option<u64> {
        match self {
            PayloadShape::Empty => Some(0),
            PayloadShape::Bytes(n) => Some(*n),
            PayloadShape::SingleUseStream | PayloadShape::RepeatableStream => None,
        }
    }
}

/// Outcome of the streaming policy for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingDecision {
    /// Buffer the payload fully. `Some(n)` when a known byte length or an
    /// explicit header pins the expected length; the builder verifies it.
    ContentLength(Option<u64>),
    /// Hand the payload to the wire unconsumed, chunk-framed.
    Chunked,
    /// No body at all.
    Empty,
}

impl EncodingDecision {
    pub fn is_streaming(&self) -> bool {
        matches!(self, EncodingDecision::Chunked)
    }
}

/// Header changes the policy requires before the entity is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMutation {
    RemoveContentLength,
    RemoveTransferEncoding,
    /// Set (or overwrite) `Transfer-Encoding: chunked`.
    SetTransferEncodingChunked,
}

fn is_chunked(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("chunked")
}

/// Whether this status code forbids a message body outright.
///
/// 1xx, 204 and 304 never carry an entity; this overrides any configured
/// streaming mode.
pub fn status_forces_empty(status: StatusCode) -> bool {
    status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

/// Whether the negotiated protocol version can carry chunked encoding.
pub fn protocol_supports_chunked(version: Version) -> bool {
    version >= Version::HTTP_11
}

/// Decide how the body will be transmitted.
///
/// Pure and deterministic: the same inputs always produce the same decision
/// and mutation list. Rules, in priority order:
///
/// 1. Empty payload sends no body; any `Transfer-Encoding` is stripped.
/// 2. `Always` chunks when the protocol allows it, overwriting any existing
///    framing headers; otherwise it falls back to buffering.
/// 3. `Never` buffers fully and strips any `Transfer-Encoding`.
/// 4. `Auto` honors an explicit `Content-Length` first, then an explicit
///    `chunked` Transfer-Encoding or an unknown payload length, and buffers
///    otherwise. A `Transfer-Encoding` value that is not exactly `chunked`
///    is never forwarded: it is stripped and the payload buffered.
pub fn decide(
    mode: StreamingMode,
    shape: PayloadShape,
    existing_content_length: Option<u64>,
    existing_transfer_encoding: Option<&str>,
    supports_chunked: bool,
) -> (EncodingDecision, Vec<HeaderMutation>) {
    let mut mutations = Vec::new();

    // Rule 1: nothing to send.
    if shape == PayloadShape::Empty {
        if existing_transfer_encoding.is_some() {
            debug!("empty payload, stripping Transfer-Encoding");
            mutations.push(HeaderMutation::RemoveTransferEncoding);
        }
        return (EncodingDecision::Empty, mutations);
    }

    match mode {
        StreamingMode::Always => {
            if supports_chunked {
                if existing_content_length.is_some() {
                    debug!("streaming mode ALWAYS, removing explicit Content-Length");
                    mutations.push(HeaderMutation::RemoveContentLength);
                }
                match existing_transfer_encoding {
                    Some(v) if is_chunked(v) => {}
                    Some(v) => {
                        warn!(value = v, "overwriting non-chunked Transfer-Encoding");
                        mutations.push(HeaderMutation::SetTransferEncodingChunked);
                    }
                    None => mutations.push(HeaderMutation::SetTransferEncodingChunked),
                }
                (EncodingDecision::Chunked, mutations)
            } else {
                // Protocol cannot chunk; buffer the whole payload instead.
                debug!("streaming mode ALWAYS but protocol lacks chunked support, buffering");
                if existing_transfer_encoding.is_some() {
                    mutations.push(HeaderMutation::RemoveTransferEncoding);
                }
                (EncodingDecision::ContentLength(shape.known_length()), mutations)
            }
        }
        StreamingMode::Never => {
            if existing_transfer_encoding.is_some() {
                debug!("streaming mode NEVER, stripping Transfer-Encoding");
                mutations.push(HeaderMutation::RemoveTransferEncoding);
            }
            let expected = shape.known_length().or(existing_content_length);
            (EncodingDecision::ContentLength(expected), mutations)
        }
        StreamingMode::Auto => {
            if let Some(len) = existing_content_length {
                // Explicit length wins; a simultaneous Transfer-Encoding is a
                // conflict resolved in Content-Length's favor.
                if existing_transfer_encoding.is_some() {
                    warn!(
                        content_length = len,
                        "both framing headers present, Content-Length wins"
                    );
                    mutations.push(HeaderMutation::RemoveTransferEncoding);
                }
                return (EncodingDecision::ContentLength(Some(len)), mutations);
            }

            match existing_transfer_encoding {
                Some(v) if !is_chunked(v) => {
                    // Invalid value: never forwarded verbatim; buffer instead.
                    warn!(value = v, "invalid Transfer-Encoding value, buffering payload");
                    mutations.push(HeaderMutation::RemoveTransferEncoding);
                    (EncodingDecision::ContentLength(shape.known_length()), mutations)
                }
                Some(_) if supports_chunked => (EncodingDecision::Chunked, mutations),
                None if shape.known_length().is_none() && supports_chunked => {
                    mutations.push(HeaderMutation::SetTransferEncodingChunked);
                    (EncodingDecision::Chunked, mutations)
                }
                Some(_) | None => {
                    // Known length, or chunking unavailable: buffer.
                    if existing_transfer_encoding.is_some() {
                        mutations.push(HeaderMutation::RemoveTransferEncoding);
                    }
                    (EncodingDecision::ContentLength(shape.known_length()), mutations)
                }
            }
        }
    }
}

/// Response-side decision: applies the status-code override before the mode
/// rules. 204 strips both framing headers; 304 keeps an explicit
/// Content-Length but never a Transfer-Encoding.
pub fn decide_for_response(
    status: StatusCode,
    mode: StreamingMode,
    shape: PayloadShape,
    existing_content_length: Option<u64>,
    existing_transfer_encoding: Option<&str>,
    supports_chunked: bool,
) -> (EncodingDecision, Vec<HeaderMutation>) {
    if status_forces_empty(status) {
        let mut mutations = Vec::new();
        if existing_transfer_encoding.is_some() {
            mutations.push(HeaderMutation::RemoveTransferEncoding);
        }
        if existing_content_length.is_some() && status != StatusCode::NOT_MODIFIED {
            mutations.push(HeaderMutation::RemoveContentLength);
        }
        if shape != PayloadShape::Empty {
            debug!(status = %status, "status forbids a body, dropping payload");
        }
        return (EncodingDecision::Empty, mutations);
    }
    decide(
        mode,
        shape,
        existing_content_length,
        existing_transfer_encoding,
        supports_chunked,
    )
}
