//! # wirebody
//!
//! `wirebody` decides how an HTTP message body goes on the wire and builds
//! it safely: buffered with `Content-Length`, chunk-framed, or empty. The
//! decision is a pure function of the payload shape, the configured
//! streaming mode, the framing headers already present, and the protocol
//! version — computed once per exchange and immutable thereafter.
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy with a 400/500 wire classifier
//! - [`config`] - Listener/requester configuration (streaming modes)
//! - [`http`] - Streaming policy, payloads, entity construction, strict
//!   header table, message assembly, and response dispatch
//! - [`transport`] - The transport-client seam, reference-counted client
//!   sharing, and the named-configuration registry
//!
//! ## Quick Start
//!
//! ```rust
//! use wirebody::http::headers::HeaderTable;
//! use wirebody::http::message::assemble_response;
//! use wirebody::http::{Payload, StreamingMode};
//! use http::{StatusCode, Version};
//!
//! let response = assemble_response(
//!     StatusCode::OK,
//!     StreamingMode::Auto,
//!     HeaderTable::new(),
//!     Payload::from("hello"),
//!     Version::HTTP_11,
//! )
//! .unwrap();
//! assert_eq!(response.headers.get("Content-Length"), Some("5"));
//! ```
//!
//! ## Correctness contracts
//!
//! - At most one of `Content-Length` / `Transfer-Encoding` reaches the wire;
//!   the framing-relevant headers never silently concatenate values.
//! - A single-use stream is read at most once; buffering closes the source
//!   on every exit path, including read errors.
//! - Response dispatch terminates in exactly one completion callback, with
//!   a fallback 500 substituted on transport send failure.
//! - A shared client is started on its first user and stopped on its last,
//!   exactly once each, under any thread interleaving.

pub mod base;
pub mod config;
pub mod http;
pub mod transport;

pub use base::error::EntityError;
