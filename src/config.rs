//! Listener and requester configuration.
//!
//! Streaming mode is resolved from these structs once per exchange and is
//! immutable thereafter.

use crate::base::error::EntityError;
use crate::http::streaming::StreamingMode;
use serde::{Deserialize, Serialize};

fn default_buffer_size() -> usize {
    8 * 1024
}

fn default_max_concurrency() -> usize {
    128
}

/// Server-side (listener) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Configuration name; also the registry key for shared clients.
    pub name: String,
    /// How response bodies are framed.
    #[serde(default)]
    pub response_streaming_mode: StreamingMode,
    /// Milliseconds to wait for the request body before giving up.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

/// Client-side (requester) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequesterConfig {
    pub name: String,
    /// How request bodies are framed.
    #[serde(default)]
    pub request_streaming_mode: StreamingMode,
    /// Buffer size used when draining streams to memory.
    #[serde(default = "default_buffer_size")]
    pub response_buffer_size: usize,
    /// Cap on in-flight requests through one shared client.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl ListenerConfig {
    pub fn from_json(json: &str) -> Result<Self, EntityError> {
        serde_json::from_str(json).map_err(|e| EntityError::Config(e.to_string()))
    }
}

impl RequesterConfig {
    pub fn from_json(json: &str) -> Result<Self, EntityError> {
        serde_json::from_str(json).map_err(|e| EntityError::Config(e.to_string()))
    }
}
