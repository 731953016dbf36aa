//! Request/response assembly.
//!
//! Orchestrates one exchange in the fixed order: read existing framing
//! headers, run the streaming policy, apply its mutations, build the entity,
//! then write the final framing header and validate. The header table is
//! either fully updated or returned untouched inside the error.

use crate::base::error::EntityError;
use crate::http::entity::{self, HttpEntity};
use crate::http::headers::{HeaderTable, CONTENT_LENGTH, TRANSFER_ENCODING};
use crate::http::payload::Payload;
use crate::http::streaming::{
    self, protocol_supports_chunked, EncodingDecision, StreamingMode,
};
use http::{Method, StatusCode, Uri, Version};

/// An outbound request ready for the transport.
#[derive(Debug)]
pub struct WireRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderTable,
    pub entity: HttpEntity,
}

/// An outbound response ready for the transport.
#[derive(Debug)]
pub struct WireResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderTable,
    pub entity: HttpEntity,
}

impl WireResponse {
    /// Minimal last-resort response: fixed 500, no body, no detail leaked.
    pub fn fallback_500() -> Self {
        let mut headers = HeaderTable::new();
        // Infallible: constant name and value.
        let _ = headers.set(CONTENT_LENGTH, "0");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            version: Version::HTTP_11,
            headers,
            entity: HttpEntity::empty(),
        }
    }
}

/// Write the framing header matching the built entity, then validate.
fn finalize_framing(
    headers: &mut HeaderTable,
    entity: &HttpEntity,
    decision: EncodingDecision,
) -> Result<(), EntityError> {
    match decision {
        EncodingDecision::Empty => {
            // Framing headers were already stripped by the policy mutations.
        }
        EncodingDecision::Chunked => {
            if !headers.contains(TRANSFER_ENCODING) {
                headers.set(TRANSFER_ENCODING, "chunked")?;
            }
        }
        EncodingDecision::ContentLength(_) => {
            let len = entity.bytes_length().unwrap_or(0);
            headers.set(CONTENT_LENGTH, &len.to_string())?;
        }
    }
    headers.validate_framing()
}

/// Assemble an outbound response for one exchange.
///
/// The decision is computed exactly once from the status, mode, payload
/// shape and existing headers, and is immutable thereafter.
pub fn assemble_response(
    status: StatusCode,
    mode: StreamingMode,
    mut headers: HeaderTable,
    payload: Payload,
    version: Version,
) -> Result<WireResponse, EntityError> {
    let existing_length = headers.content_length()?;
    let existing_encoding = headers.get_unique(TRANSFER_ENCODING)?.map(str::to_owned);

    let (decision, mutations) = streaming::decide_for_response(
        status,
        mode,
        payload.shape(),
        existing_length,
        existing_encoding.as_deref(),
        protocol_supports_chunked(version),
    );

    headers.apply(&mutations)?;
    let entity = entity::build(payload, decision)?;
    finalize_framing(&mut headers, &entity, decision)?;

    Ok(WireResponse {
        status,
        version,
        headers,
        entity,
    })
}

/// Assemble an outbound request for one exchange.
pub fn assemble_request(
    method: Method,
    uri: Uri,
    mode: StreamingMode,
    mut headers: HeaderTable,
    payload: Payload,
    version: Version,
) -> Result<WireRequest, EntityError> {
    let existing_length = headers.content_length()?;
    let existing_encoding = headers.get_unique(TRANSFER_ENCODING)?.map(str::to_owned);

    let (decision, mutations) = streaming::decide(
        mode,
        payload.shape(),
        existing_length,
        existing_encoding.as_deref(),
        protocol_supports_chunked(version),
    );

    headers.apply(&mutations)?;
    let entity = entity::build(payload, decision)?;
    finalize_framing(&mut headers, &entity, decision)?;

    Ok(WireRequest {
        method,
        uri,
        version,
        headers,
        entity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_response_auto_bytes_gets_content_length() {
        let resp = assemble_response(
            StatusCode::OK,
            StreamingMode::Auto,
            HeaderTable::new(),
            Payload::from("hello"),
            Version::HTTP_11,
        )
        .unwrap();
        assert_eq!(resp.headers.get(CONTENT_LENGTH), Some("5"));
        assert!(!resp.headers.contains(TRANSFER_ENCODING));
        assert!(!resp.entity.is_streaming());
    }

    #[test]
    fn test_response_auto_stream_gets_chunked() {
        let resp = assemble_response(
            StatusCode::OK,
            StreamingMode::Auto,
            HeaderTable::new(),
            Payload::stream(Cursor::new(b"streamed".to_vec())),
            Version::HTTP_11,
        )
        .unwrap();
        assert_eq!(resp.headers.get(TRANSFER_ENCODING), Some("chunked"));
        assert!(!resp.headers.contains(CONTENT_LENGTH));
        assert!(resp.entity.is_streaming());
    }

    #[test]
    fn test_response_explicit_length_buffers_stream() {
        let mut headers = HeaderTable::new();
        headers.add(CONTENT_LENGTH, "6").unwrap();
        let resp = assemble_response(
            StatusCode::OK,
            StreamingMode::Auto,
            headers,
            Payload::stream(Cursor::new(b"sized!".to_vec())),
            Version::HTTP_11,
        )
        .unwrap();
        assert_eq!(resp.entity.bytes_length(), Some(6));
        assert_eq!(resp.headers.get(CONTENT_LENGTH), Some("6"));
        assert!(!resp.headers.contains(TRANSFER_ENCODING));
    }

    #[test]
    fn test_response_204_is_empty_without_transfer_encoding() {
        let mut headers = HeaderTable::new();
        headers.add(TRANSFER_ENCODING, "chunked").unwrap();
        let resp = assemble_response(
            StatusCode::NO_CONTENT,
            StreamingMode::Always,
            headers,
            Payload::from("should be dropped"),
            Version::HTTP_11,
        )
        .unwrap();
        assert_eq!(resp.entity.bytes_length(), Some(0));
        assert!(!resp.headers.contains(TRANSFER_ENCODING));
        assert!(!resp.headers.contains(CONTENT_LENGTH));
    }

    #[test]
    fn test_request_always_streams_without_content_length() {
        let req = assemble_request(
            Method::POST,
            Uri::from_static("http://example.com/upload"),
            StreamingMode::Always,
            HeaderTable::new(),
            Payload::from("payload"),
            Version::HTTP_11,
        )
        .unwrap();
        assert!(req.entity.is_streaming());
        assert_eq!(req.headers.get(TRANSFER_ENCODING), Some("chunked"));
        assert!(!req.headers.contains(CONTENT_LENGTH));
    }

    #[test]
    fn test_request_http10_never_chunks() {
        let req = assemble_request(
            Method::POST,
            Uri::from_static("http://example.com/legacy"),
            StreamingMode::Always,
            HeaderTable::new(),
            Payload::from("old school"),
            Version::HTTP_10,
        )
        .unwrap();
        assert!(!req.entity.is_streaming());
        assert_eq!(req.headers.get(CONTENT_LENGTH), Some("10"));
    }

    #[test]
    fn test_declared_length_mismatch_surfaces() {
        let mut headers = HeaderTable::new();
        headers.add(CONTENT_LENGTH, "99").unwrap();
        let err = assemble_response(
            StatusCode::OK,
            StreamingMode::Auto,
            headers,
            Payload::stream(Cursor::new(b"short".to_vec())),
            Version::HTTP_11,
        )
        .unwrap_err();
        assert!(matches!(err, EntityError::ContentLengthMismatch { .. }));
    }

    #[test]
    fn test_unparsable_content_length_rejected() {
        let mut headers = HeaderTable::new();
        headers.add(CONTENT_LENGTH, "not-a-number").unwrap();
        let err = assemble_response(
            StatusCode::OK,
            StreamingMode::Auto,
            headers,
            Payload::from("x"),
            Version::HTTP_11,
        )
        .unwrap_err();
        assert!(matches!(err, EntityError::InvalidHeader(_)));
    }

    #[test]
    fn test_fallback_500_shape() {
        let resp = WireResponse::fallback_500();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.entity.bytes_length(), Some(0));
        assert_eq!(resp.headers.get(CONTENT_LENGTH), Some("0"));
    }
}
