use http::StatusCode;
use thiserror::Error;

/// Errors raised while constructing or delivering an HTTP entity.
#[derive(Debug, Error)]
pub enum EntityError {
    /// A single-valued header was given more than one value.
    #[error("Header {name} does not support multiple values")]
    HeaderConflict { name: String },

    /// Content-Length and Transfer-Encoding were both present in the final
    /// header state.
    #[error("Content-Length and Transfer-Encoding are mutually exclusive")]
    FramingConflict,

    /// Header name or value failed RFC 7230 validation.
    #[error("Invalid header name or value: {0}")]
    InvalidHeader(String),

    /// The payload could not be converted to bytes while buffering.
    #[error("Payload could not be materialized: {0}")]
    Transformation(#[source] std::io::Error),

    /// The materialized body length disagrees with a declared Content-Length.
    #[error("Body length {actual} does not match declared Content-Length {expected}")]
    ContentLengthMismatch { expected: u64, actual: u64 },

    /// A single-use stream's content was requested after it was handed out.
    #[error("Stream content was already consumed")]
    StreamConsumed,

    /// The transport reported a send failure.
    #[error("Transport failed to send: {0}")]
    TransportSend(String),

    /// The underlying client failed to start.
    #[error("Transport client failed to start: {0}")]
    ClientStart(String),

    /// Listener/requester configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EntityError {
    /// Wire-visible status class for this error.
    ///
    /// Header and validation failures are the caller's fault (400-class);
    /// transformation and transport failures map to a generic 500 with no
    /// detail leaked to the peer.
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::HeaderConflict { .. }
            | EntityError::FramingConflict
            | EntityError::InvalidHeader(_)
            | EntityError::Config(_) => StatusCode::BAD_REQUEST,
            EntityError::Transformation(_)
            | EntityError::ContentLengthMismatch { .. }
            | EntityError::StreamConsumed
            | EntityError::TransportSend(_)
            | EntityError::ClientStart(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the error should surface to the peer as a 400-class response.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
