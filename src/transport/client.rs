//! Transport client seam.

use crate::base::error::EntityError;
use crate::http::message::{WireRequest, WireResponse};
use futures::future::BoxFuture;

/// A pooled transport-level client owned by the external HTTP library.
///
/// `start`/`stop` manage the underlying connection pool's lifecycle and are
/// expected to be idempotent only through [`ShareableClient`]'s counting;
/// implementations may assume strict pairing.
///
/// [`ShareableClient`]: crate::transport::ShareableClient
pub trait TransportClient: Send + Sync {
    /// Bring up the underlying pool. Called once, on the first user.
    fn start(&self) -> Result<(), EntityError>;

    /// Tear down the underlying pool. Called once, after the last user.
    fn stop(&self);

    /// Send a request, resolving to the transport's response.
    fn send(&self, request: WireRequest) -> BoxFuture<'_, Result<WireResponse, EntityError>>;
}
