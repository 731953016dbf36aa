pub mod dispatcher;
pub mod entity;
pub mod headers;
pub mod message;
pub mod payload;
pub mod streaming;

// Re-exports for convenience
pub use entity::HttpEntity;
pub use headers::HeaderTable;
pub use message::{WireRequest, WireResponse};
pub use payload::Payload;
pub use streaming::{EncodingDecision, PayloadShape, StreamingMode};
