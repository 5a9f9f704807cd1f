use crate::error::broker::BrokerError;

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::oneshot;

pub(crate) type Waiter = oneshot::Sender<Result<Value, BrokerError>>;

/// Identifier pair correlating one request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId {
    pub result_id: String,
    pub error_id: String,
}

pub(crate) struct PendingCall {
    pub(crate) id: CallId,
    pub(crate) method: String,
    pub(crate) waiter: Waiter,
    pub(crate) expected_type: &'static str,
    pub(crate) created_at: Instant,
}

/// Outstanding calls, indexed by both halves of their id pair.
#[derive(Default)]
pub(crate) struct PendingTable {
    by_result: HashMap<String, PendingCall>,
    error_to_result: HashMap<String, String>,
}

impl PendingTable {
    pub(crate) fn contains_id(&self, id: &str) -> bool {
        self.by_result.contains_key(id) || self.error_to_result.contains_key(id)
    }

    pub(crate) fn insert(&mut self, call: PendingCall) {
        self.error_to_result
            .insert(call.id.error_id.clone(), call.id.result_id.clone());
        self.by_result.insert(call.id.result_id.clone(), call);
    }

    pub(crate) fn take_by_result(&mut self, result_id: &str) -> Option<PendingCall> {
        let call = self.by_result.remove(result_id)?;
        self.error_to_result.remove(&call.id.error_id);
        Some(call)
    }

    pub(crate) fn take_by_error(&mut self, error_id: &str) -> Option<PendingCall> {
        let result_id = self.error_to_result.remove(error_id)?;
        self.by_result.remove(&result_id)
    }

    pub(crate) fn drain(&mut self) -> Vec<PendingCall> {
        self.error_to_result.clear();
        self.by_result.drain().map(|(_, call)| call).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_result.len()
    }
}
