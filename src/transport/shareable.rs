//! Reference-counted sharing of one transport client.
//!
//! Several logical configurations can resolve to the same physical client;
//! the usage counter ties the client's start/stop to the first acquire and
//! the last release, exactly once each.

use crate::base::error::EntityError;
use crate::http::message::{WireRequest, WireResponse};
use crate::transport::client::TransportClient;
use futures::future::BoxFuture;
use std::sync::Mutex;
use tracing::{debug, error};

/// Wraps one transport client behind a usage counter.
///
/// Invariants: the counter never goes negative, and the underlying client
/// sees exactly one `start()` per 0→1 transition and one `stop()` per 1→0
/// transition, under any interleaving of callers.
pub struct ShareableClient<C: TransportClient> {
    client: C,
    usage: Mutex<usize>,
}

impl<C: TransportClient> ShareableClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            usage: Mutex::new(0),
        }
    }

    /// Register a user. Starts the underlying client on the 0→1 transition;
    /// on start failure the counter is rolled back so a later acquire
    /// retries the start.
    pub fn acquire(&self) -> Result<(), EntityError> {
        let mut usage = self.usage.lock().unwrap_or_else(|p| p.into_inner());
        *usage += 1;
        if *usage == 1 {
            if let Err(e) = self.client.start() {
                *usage -= 1;
                return Err(e);
            }
            debug!("transport client started");
        }
        Ok(())
    }

    /// Deregister a user. Stops the underlying client on the 1→0 transition.
    ///
    /// Calling `release` without a matching `acquire` is a caller lifecycle
    /// bug: it is logged, asserted in debug builds, and the counter stays
    /// at zero.
    pub fn release(&self) {
        let mut usage = self.usage.lock().unwrap_or_else(|p| p.into_inner());
        match *usage {
            0 => {
                error!("release() without matching acquire()");
                debug_assert!(false, "usage counter underflow");
            }
            1 => {
                *usage = 0;
                self.client.stop();
                debug!("transport client stopped");
            }
            _ => *usage -= 1,
        }
    }

    /// Current user count (test/diagnostic hook).
    pub fn usage_count(&self) -> usize {
        *self.usage.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Send through the shared client.
    pub fn send(&self, request: WireRequest) -> BoxFuture<'_, Result<WireResponse, EntityError>> {
        self.client.send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeClient {
        starts: AtomicUsize,
        stops: AtomicUsize,
        fail_start: AtomicBool,
    }

    impl FakeClient {
        fn new() -> Self {
            Self {
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                fail_start: AtomicBool::new(false),
            }
        }
    }

    impl TransportClient for FakeClient {
        fn start(&self) -> Result<(), EntityError> {
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(EntityError::ClientStart("refused".into()));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn send(
            &self,
            _request: WireRequest,
        ) -> BoxFuture<'_, Result<WireResponse, EntityError>> {
            Box::pin(async {
                let mut resp = WireResponse::fallback_500();
                resp.status = StatusCode::OK;
                Ok(resp)
            })
        }
    }

    #[test]
    fn test_start_on_first_acquire_stop_on_last_release() {
        let shared = ShareableClient::new(FakeClient::new());
        shared.acquire().unwrap();
        shared.acquire().unwrap();
        assert_eq!(shared.client.starts.load(Ordering::SeqCst), 1);

        shared.release();
        assert_eq!(shared.client.stops.load(Ordering::SeqCst), 0);
        shared.release();
        assert_eq!(shared.client.stops.load(Ordering::SeqCst), 1);
        assert_eq!(shared.usage_count(), 0);
    }

    #[test]
    fn test_start_failure_rolls_back_counter() {
        let shared = ShareableClient::new(FakeClient::new());
        shared.client.fail_start.store(true, Ordering::SeqCst);
        assert!(shared.acquire().is_err());
        assert_eq!(shared.usage_count(), 0);

        // Next acquire retries the start.
        shared.client.fail_start.store(false, Ordering::SeqCst);
        shared.acquire().unwrap();
        assert_eq!(shared.client.starts.load(Ordering::SeqCst), 1);
        shared.release();
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_underflow_saturates_at_zero() {
        let shared = ShareableClient::new(FakeClient::new());
        shared.release();
        assert_eq!(shared.usage_count(), 0);
        assert_eq!(shared.client.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restart_after_full_release() {
        let shared = ShareableClient::new(FakeClient::new());
        shared.acquire().unwrap();
        shared.release();
        shared.acquire().unwrap();
        shared.release();
        assert_eq!(shared.client.starts.load(Ordering::SeqCst), 2);
        assert_eq!(shared.client.stops.load(Ordering::SeqCst), 2);
    }
}
