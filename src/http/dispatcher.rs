//! Response dispatch with an exactly-once terminal signal.
//!
//! Every path through [`send_response`] ends in exactly one completion
//! callback invocation. A transport send failure is converted into one
//! fallback-500 attempt followed by a failure completion; it never escapes
//! as a panic or a second callback.

use crate::base::error::EntityError;
use crate::http::message::WireResponse;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// The transport's response-ready seam: delivers one response to the wire.
pub trait ResponseSink {
    fn send(&mut self, response: &WireResponse) -> Result<(), EntityError>;
}

impl<F> ResponseSink for F
where
    F: FnMut(&WireResponse) -> Result<(), EntityError>,
{
    fn send(&mut self, response: &WireResponse) -> Result<(), EntityError> {
        self(response)
    }
}

/// Per-exchange completion guard.
///
/// Holds the completion callback and whether a terminal response has gone
/// out; completing twice is structurally impossible because the callback is
/// taken out of the slot on first use.
pub struct PendingResponse<F: FnOnce(Result<(), EntityError>)> {
    on_done: Option<F>,
}

impl<F: FnOnce(Result<(), EntityError>)> PendingResponse<F> {
    pub fn new(on_done: F) -> Self {
        Self {
            on_done: Some(on_done),
        }
    }

    /// Fire the completion callback. A second call is a lifecycle bug in the
    /// caller: it is logged and dropped, never delivered.
    pub fn complete(&mut self, result: Result<(), EntityError>) {
        match self.on_done.take() {
            Some(f) => f(result),
            None => {
                error!("completion callback already invoked; dropping duplicate signal");
                debug_assert!(false, "duplicate completion");
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.on_done.is_none()
    }
}

/// Send a response through the transport's ready callback.
///
/// On success the completion callback fires once with `Ok`. On send failure
/// a minimal 500 fallback is attempted exactly once and the completion
/// callback fires once with the original error, regardless of whether the
/// fallback itself got through.
pub fn send_response<S, F>(sink: &mut S, response: WireResponse, on_done: F)
where
    S: ResponseSink,
    F: FnOnce(Result<(), EntityError>),
{
    let mut pending = PendingResponse::new(on_done);

    match sink.send(&response) {
        Ok(()) => pending.complete(Ok(())),
        Err(original) => {
            warn!(error = %original, "response send failed, attempting fallback 500");
            let fallback = WireResponse::fallback_500();
            if let Err(fallback_err) = sink.send(&fallback) {
                // The connection is gone; nothing further to deliver.
                warn!(error = %fallback_err, "fallback response also failed");
            }
            pending.complete(Err(original));
        }
    }
}

type SendJob = Box<dyn FnOnce() + Send + 'static>;

/// Offloads potentially blocking sends (stream buffering, slow peers) to a
/// worker task behind a bounded queue.
///
/// When the queue is full the job runs inline on the caller's thread instead
/// of blocking or being dropped.
pub struct DeferredDispatcher {
    queue: mpsc::Sender<SendJob>,
}

impl DeferredDispatcher {
    /// Spawn the worker. `capacity` bounds the queue; beyond it callers
    /// execute inline.
    pub fn new(capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<SendJob>(capacity);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
        });
        Self { queue: tx }
    }

    /// Run `job` on the worker, or inline when the queue rejects it.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        match self.queue.try_send(Box::new(job)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                debug!("deferred queue full, executing send inline");
                job();
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                // Worker is gone (shutdown); still honor the send.
                debug!("deferred worker stopped, executing send inline");
                job();
            }
        }
    }
}
