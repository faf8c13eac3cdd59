//! Pending-call table for client-initiated invocations.
//!
//! Each in-flight `invoke` owns one entry keyed by its correlation id. The
//! entry is removed exactly once: by its completion, by the caller's
//! deadline or cancellation (through [`PendingGuard`]), or by a session
//! teardown that rejects everything still waiting.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::InvocationId;

// ============================================================================
// Types
// ============================================================================

/// Completion channel of one invocation.
pub(crate) type CompletionSender = oneshot::Sender<Result<Value>>;

/// Receiving half handed back to the invoking caller.
pub(crate) type CompletionReceiver = oneshot::Receiver<Result<Value>>;

struct PendingCall {
    method: String,
    tx: CompletionSender,
}

// ============================================================================
// PendingCalls
// ============================================================================

/// Correlation id → completion channel.
#[derive(Default)]
pub(crate) struct PendingCalls {
    calls: Mutex<FxHashMap<InvocationId, PendingCall>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a call and returns the channel its outcome arrives on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the id is already pending.
    pub fn register(&self, id: InvocationId, method: &str) -> Result<CompletionReceiver> {
        let mut calls = self.calls.lock();
        if calls.contains_key(&id) {
            return Err(Error::protocol(format!(
                "invocation id {id} is already pending"
            )));
        }

        let (tx, rx) = oneshot::channel();
        calls.insert(
            id,
            PendingCall {
                method: method.to_string(),
                tx,
            },
        );
        Ok(rx)
    }

    /// Delivers an outcome and removes the entry.
    ///
    /// Returns `false` if no call with this id is pending.
    pub fn complete(&self, id: &InvocationId, outcome: Result<Value>) -> bool {
        let Some(call) = self.calls.lock().remove(id) else {
            return false;
        };

        debug!(invocation_id = %id, method = %call.method, ok = outcome.is_ok(), "Invocation completed");
        // Receiver may already be gone if the caller was cancelled.
        let _ = call.tx.send(outcome);
        true
    }

    /// Drops an entry without delivering anything.
    pub fn remove(&self, id: &InvocationId) -> bool {
        self.calls.lock().remove(id).is_some()
    }

    /// Rejects every pending call and empties the table.
    ///
    /// Returns the number of rejected calls.
    pub fn reject_all(&self, reason: impl Fn() -> Error) -> usize {
        let drained: Vec<_> = self.calls.lock().drain().collect();
        let count = drained.len();

        for (_, call) in drained {
            let _ = call.tx.send(Err(reason()));
        }

        if count > 0 {
            debug!(count, "Rejected pending invocations");
        }
        count
    }

    #[cfg(test)]
    pub fn contains(&self, id: &InvocationId) -> bool {
        self.calls.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }
}

// ============================================================================
// PendingGuard
// ============================================================================

/// Removes a pending entry when the invoking future ends for any reason.
///
/// Completion already removed the entry, so the drop is a no-op there; on
/// timeout, transport failure or cancellation it prevents a leak.
pub(crate) struct PendingGuard<'a> {
    table: &'a PendingCalls,
    id: InvocationId,
}

impl<'a> PendingGuard<'a> {
    pub fn new(table: &'a PendingCalls, id: InvocationId) -> Self {
        Self { table, id }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.table.remove(&self.id);
    }
}

// ============================================================================
// Tests
// ============================================================================
