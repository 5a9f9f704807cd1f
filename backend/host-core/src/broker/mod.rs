//! Correlation broker for host-issued calls into the rendering process.
//!
//! Each call gets a fresh `(result_id, error_id)` pair and parks a waiter in the
//! pending table. The native link feeds every inbound envelope to
//! [`Broker::resolve`], which wakes the matching waiter. Matching is purely by
//! id, so responses may arrive in any order.

mod pending;

pub use pending::CallId;

use crate::broker::pending::{PendingCall, PendingTable};
use crate::error::broker::BrokerError;
use crate::utils::normalize_args;

use common::ErrorLocation;
use models::{Envelope, ErrorPayload};

use std::any::type_name;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout as TokioTimeout;
use uuid::Uuid;

const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// What happened to an inbound envelope handed to [`Broker::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A pending call was completed with a value.
    Resolved,
    /// A pending call was completed with an error.
    Rejected,
    /// No pending call matched (already resolved, timed out, or never issued).
    Unmatched,
}

struct BrokerInner {
    pending: Mutex<PendingTable>,
    outbound_tx: mpsc::Sender<Envelope>,
    outbound_rx: Mutex<Option<mpsc::Receiver<Envelope>>>,
    default_timeout: Duration,
    closed: AtomicBool,
}

impl BrokerInner {
    fn table(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the pending entry if the call future is dropped or times out.
struct PendingGuard<'a> {
    inner: &'a BrokerInner,
    result_id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(call) = self.inner.table().take_by_result(&self.result_id) {
            trace!(
                "Discarded pending call '{}' ({}) after {:?}",
                call.method,
                call.id.result_id,
                call.created_at.elapsed()
            );
        }
    }
}

/// Cloneable handle; all clones share one pending table and outbound queue.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<BrokerInner>,
}

impl Broker {
    pub fn new(default_timeout: Duration) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        Self {
            inner: Arc::new(BrokerInner {
                pending: Mutex::new(PendingTable::default()),
                outbound_tx,
                outbound_rx: Mutex::new(Some(outbound_rx)),
                default_timeout,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Take the outbound request queue. Only the first caller gets it.
    pub fn take_outbound(&self) -> Option<mpsc::Receiver<Envelope>> {
        self.inner
            .outbound_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn default_timeout(&self) -> Duration {
        self.inner.default_timeout
    }

    pub fn pending_count(&self) -> usize {
        self.inner.table().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Invoke `method` on the rendering process and wait for its answer.
    ///
    /// `args` is normalized into a JSON array. `timeout` falls back to the
    /// broker default. Dropping the returned future discards the pending entry
    /// and a late response is then ignored.
    #[track_caller]
    pub fn call<T>(
        &self,
        method: &str,
        args: impl Serialize,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<T, BrokerError>> + Send + '_
    where
        T: DeserializeOwned + Send,
    {
        let location = ErrorLocation::from(Location::caller());
        let method = method.to_string();
        let encoded = serde_json::to_value(args).map_err(|e| BrokerError::Encode {
            message: format!("Failed to encode arguments for '{method}': {e}"),
            location,
        });
        let limit = timeout.unwrap_or(self.inner.default_timeout);

        async move {
            let payload = normalize_args(encoded?);
            self.call_value::<T>(method, payload, limit, location).await
        }
    }

    async fn call_value<T: DeserializeOwned>(
        &self,
        method: String,
        payload: Value,
        limit: Duration,
        location: ErrorLocation,
    ) -> Result<T, BrokerError> {
        let (waiter, receiver) = oneshot::channel();
        let id = self.register_pending(&method, waiter, type_name::<T>(), location)?;
        let _guard = PendingGuard {
            inner: &self.inner,
            result_id: id.result_id.clone(),
        };

        let request = Envelope::new(&method, &id.result_id, &id.error_id, payload);
        trace!("Sending '{method}' (result_id={})", id.result_id);
        self.inner
            .outbound_tx
            .send(request)
            .await
            .map_err(|_| BrokerError::Send {
                message: format!("Native link is closed; '{method}' not sent"),
                location,
            })?;

        let outcome = match TokioTimeout(limit, receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                return Err(BrokerError::Shutdown {
                    message: format!("Call '{method}' abandoned before a response arrived"),
                    location,
                });
            }
            Err(_) => {
                warn!("Call '{method}' timed out after {limit:?}");
                return Err(BrokerError::Timeout {
                    message: format!("'{method}' did not respond within {limit:?}"),
                    location,
                });
            }
        };

        let value = outcome?;
        serde_json::from_value::<T>(value).map_err(|e| BrokerError::Decode {
            message: format!(
                "Response to '{method}' is not a valid {}: {e}",
                type_name::<T>()
            ),
            location,
        })
    }

    /// Record a pending call under a fresh id pair.
    ///
    /// The closed flag is checked under the table lock so a call racing
    /// [`Broker::cancel_all`] is either drained by it or refused here.
    pub(crate) fn register_pending(
        &self,
        method: &str,
        waiter: pending::Waiter,
        expected_type: &'static str,
        location: ErrorLocation,
    ) -> Result<CallId, BrokerError> {
        let mut table = self.inner.table();
        if self.is_closed() {
            return Err(BrokerError::Shutdown {
                message: format!("Broker is shut down; '{method}' not sent"),
                location,
            });
        }

        let id = loop {
            let result_id = Uuid::new_v4().to_string();
            let error_id = Uuid::new_v4().to_string();
            if result_id != error_id && !table.contains_id(&result_id) && !table.contains_id(&error_id)
            {
                break CallId {
                    result_id,
                    error_id,
                };
            }
        };

        table.insert(PendingCall {
            id: id.clone(),
            method: method.to_string(),
            waiter,
            expected_type,
            created_at: Instant::now(),
        });
        Ok(id)
    }

    /// Complete the pending call matching `response`, if any.
    ///
    /// A second response for the same id pair finds nothing and is a no-op.
    pub fn resolve(&self, response: Envelope) -> Resolution {
        let Envelope {
            cmd,
            result_id,
            error_id,
            payload,
        } = response;

        let (call, outcome, resolution) = {
            let mut table = self.inner.table();
            if !result_id.is_empty()
                && let Some(call) = table.take_by_result(&result_id)
            {
                (call, Ok(payload), Resolution::Resolved)
            } else if !error_id.is_empty()
                && let Some(call) = table.take_by_error(&error_id)
            {
                let message = ErrorPayload::from_payload(&payload).message;
                let error = BrokerError::Remote {
                    message: format!("'{}' failed: {message}", call.method),
                    location: ErrorLocation::from(Location::caller()),
                };
                (call, Err(error), Resolution::Rejected)
            } else {
                debug!(
                    "No pending call for response '{cmd}' (result_id='{result_id}', error_id='{error_id}'); ignoring"
                );
                return Resolution::Unmatched;
            }
        };

        trace!(
            "Completing '{}' expecting {} after {:?}",
            call.method,
            call.expected_type,
            call.created_at.elapsed()
        );
        if call.waiter.send(outcome).is_err() {
            debug!("Caller of '{}' went away before its response", call.method);
        }
        resolution
    }

    /// Reject every outstanding call and refuse new ones.
    pub fn cancel_all(&self) -> usize {
        self.inner.closed.store(true, Ordering::Release);
        let count = self.reject_pending("cancelled by shutdown");
        if count > 0 {
            debug!("Rejected {count} pending call(s) on shutdown");
        }
        count
    }

    /// Reject every outstanding call with `reason`, leaving the broker open.
    pub fn reject_pending(&self, reason: &str) -> usize {
        let drained = self.inner.table().drain();
        let count = drained.len();
        for call in drained {
            let _ = call.waiter.send(Err(BrokerError::Shutdown {
                message: format!("'{}' {reason}", call.method),
                location: ErrorLocation::from(Location::caller()),
            }));
        }
        count
    }
}
