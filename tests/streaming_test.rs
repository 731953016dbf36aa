//! Streaming-policy scenario tests.
//!
//! Covers:
//! - mode x payload-shape decision matrix
//! - explicit-header precedence in AUTO mode
//! - the 204/304 status override beating the configured mode

use http::{StatusCode, Version};
use std::io::Cursor;
use wirebody::http::headers::HeaderTable;
use wirebody::http::message::assemble_response;
use wirebody::http::streaming::{decide, EncodingDecision, HeaderMutation, PayloadShape};
use wirebody::http::{Payload, StreamingMode};

#[test]
fn test_always_streams_every_shape() {
    for shape in [
        PayloadShape::Bytes(32),
        PayloadShape::SingleUseStream,
        PayloadShape::RepeatableStream,
    ] {
        let (decision, _) = decide(StreamingMode::Always, shape, None, None, true);
        assert_eq!(decision, EncodingDecision::Chunked, "shape {shape:?}");
    }
}

#[test]
fn test_always_entity_has_no_content_length() {
    let resp = assemble_response(
        StatusCode::OK,
        StreamingMode::Always,
        HeaderTable::new(),
        Payload::from("streamed anyway"),
        Version::HTTP_11,
    )
    .unwrap();
    assert!(resp.entity.is_streaming());
    assert!(!resp.headers.contains("Content-Length"));
    assert_eq!(resp.headers.get("Transfer-Encoding"), Some("chunked"));
}

#[test]
fn test_never_yields_exact_length() {
    let payloads: Vec<(Payload, u64)> = vec![
        (Payload::from("four"), 4),
        (Payload::stream(Cursor::new(vec![0u8; 1000])), 1000),
    ];
    for (payload, expected) in payloads {
        let resp = assemble_response(
            StatusCode::OK,
            StreamingMode::Never,
            HeaderTable::new(),
            payload,
            Version::HTTP_11,
        )
        .unwrap();
        assert_eq!(resp.entity.bytes_length(), Some(expected));
        assert_eq!(
            resp.headers.get("Content-Length"),
            Some(expected.to_string().as_str())
        );
    }
}

#[test]
fn test_auto_unknown_length_stream_chunks() {
    let (decision, mutations) =
        decide(StreamingMode::Auto, PayloadShape::SingleUseStream, None, None, true);
    assert_eq!(decision, EncodingDecision::Chunked);
    assert_eq!(mutations, vec![HeaderMutation::SetTransferEncodingChunked]);
}

#[test]
fn test_auto_explicit_content_length_buffers_to_match() {
    let mut headers = HeaderTable::new();
    headers.add("Content-Length", "42").unwrap();
    headers.add("Transfer-Encoding", "chunked").unwrap();

    let resp = assemble_response(
        StatusCode::OK,
        StreamingMode::Auto,
        headers,
        Payload::stream(Cursor::new(vec![7u8; 42])),
        Version::HTTP_11,
    )
    .unwrap();

    assert_eq!(resp.entity.bytes_length(), Some(42));
    assert_eq!(resp.headers.get("Content-Length"), Some("42"));
    assert!(!resp.headers.contains("Transfer-Encoding"));
}

#[test]
fn test_status_204_override_beats_always() {
    let resp = assemble_response(
        StatusCode::NO_CONTENT,
        StreamingMode::Always,
        HeaderTable::new(),
        Payload::from("non-empty bytes"),
        Version::HTTP_11,
    )
    .unwrap();
    assert_eq!(resp.entity.bytes_length(), Some(0));
    assert!(!resp.entity.is_streaming());
    assert!(!resp.headers.contains("Transfer-Encoding"));
}

#[test]
fn test_status_304_suppresses_transfer_encoding() {
    let mut headers = HeaderTable::new();
    headers.add("Content-Length", "1234").unwrap();
    let resp = assemble_response(
        StatusCode::NOT_MODIFIED,
        StreamingMode::Always,
        headers,
        Payload::Empty,
        Version::HTTP_11,
    )
    .unwrap();
    assert_eq!(resp.entity.bytes_length(), Some(0));
    assert!(!resp.headers.contains("Transfer-Encoding"));
    // A 304 may keep the length of the entity it describes.
    assert_eq!(resp.headers.get("Content-Length"), Some("1234"));
}

#[test]
fn test_invalid_transfer_encoding_never_reaches_wire() {
    let mut headers = HeaderTable::new();
    headers.add("Transfer-Encoding", "chunked, deflate").unwrap();
    let resp = assemble_response(
        StatusCode::OK,
        StreamingMode::Auto,
        headers,
        Payload::stream(Cursor::new(b"buffer me".to_vec())),
        Version::HTTP_11,
    )
    .unwrap();
    // Buffered with a computed length; the bad value is gone.
    assert_eq!(resp.entity.bytes_length(), Some(9));
    assert!(!resp.headers.contains("Transfer-Encoding"));
    assert_eq!(resp.headers.get("Content-Length"), Some("9"));
}

#[test]
fn test_http10_downgrades_always_to_buffering() {
    let resp = assemble_response(
        StatusCode::OK,
        StreamingMode::Always,
        HeaderTable::new(),
        Payload::stream(Cursor::new(b"no chunks".to_vec())),
        Version::HTTP_10,
    )
    .unwrap();
    assert!(!resp.entity.is_streaming());
    assert_eq!(resp.headers.get("Content-Length"), Some("9"));
}

#[test]
fn test_final_state_has_at_most_one_framing_header() {
    // Sweep the mode/shape grid; every successful assembly must satisfy the
    // wire invariant.
    let modes = [StreamingMode::Auto, StreamingMode::Always, StreamingMode::Never];
    for mode in modes {
        for payload in [
            Payload::Empty,
            Payload::from("abc"),
            Payload::stream(Cursor::new(b"xyz".to_vec())),
        ] {
            let resp = assemble_response(
                StatusCode::OK,
                mode,
                HeaderTable::new(),
                payload,
                Version::HTTP_11,
            )
            .unwrap();
            let both = resp.headers.contains("Content-Length")
                && resp.headers.contains("Transfer-Encoding");
            assert!(!both, "mode {mode:?} produced both framing headers");
        }
    }
}
