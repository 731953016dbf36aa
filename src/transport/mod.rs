//! Transport-side plumbing: the client seam, reference-counted sharing,
//! and the named-configuration registry.

pub mod client;
pub mod registry;
pub mod shareable;

pub use client::TransportClient;
pub use registry::{ClientHandle, ClientRegistry};
pub use shareable::ShareableClient;
