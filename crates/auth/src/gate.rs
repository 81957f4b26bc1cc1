//! Single-flight guard over the access-token refresh.
//!
//! The gate is a two-state machine (`Idle`, `Refreshing`) plus the ordered
//! queue of requests waiting for the refresh to settle. The check-and-set in
//! [`RefreshGate::try_begin_refresh`] happens under a mutex that is never held
//! across an `.await`, so exactly one caller can move the gate out of `Idle`.

use axis_types::{ApiRequest, ApiResponse, traits::Result};
use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::oneshot;

/// Observable state of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// A request parked while a refresh is in flight, with the channel its caller
/// is waiting on.
pub struct PendingRequest {
    pub request: ApiRequest,
    pub reply: oneshot::Sender<Result<ApiResponse>>,
}

impl PendingRequest {
    /// Creates a pending entry and the receiver its caller awaits.
    #[must_use]
    pub fn new(request: ApiRequest) -> (Self, oneshot::Receiver<Result<ApiResponse>>) {
        let (reply, rx) = oneshot::channel();
        (Self { request, reply }, rx)
    }

    /// Answer the waiting caller. A caller that stopped waiting is ignored.
    pub fn settle(self, outcome: Result<ApiResponse>) {
        let _ = self.reply.send(outcome);
    }
}

enum Slot {
    Idle,
    Refreshing(Vec<PendingRequest>),
}

/// Process-wide refresh guard; see the module docs.
pub struct RefreshGate {
    slot: Mutex<Slot>,
    started: AtomicU64,
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
            started: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue `pending` and report whether the caller must start the refresh.
    ///
    /// Returns `true` only for the call that moved the gate from `Idle` to
    /// `Refreshing`; every other call just joins the queue.
    pub fn try_begin_refresh(&self, pending: PendingRequest) -> bool {
        let mut slot = self.lock();
        match &mut *slot {
            Slot::Idle => {
                *slot = Slot::Refreshing(vec![pending]);
                self.started.fetch_add(1, Ordering::Relaxed);
                true
            }
            Slot::Refreshing(queue) => {
                queue.push(pending);
                tracing::debug!(queued = queue.len(), "refresh in flight, request queued");
                false
            }
        }
    }

    /// Return to `Idle` and hand back the queue in arrival order.
    #[must_use]
    pub fn complete_refresh(&self) -> Vec<PendingRequest> {
        let mut slot = self.lock();
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Idle => Vec::new(),
            Slot::Refreshing(queue) => queue,
        }
    }

    #[must_use]
    pub fn state(&self) -> RefreshState {
        match &*self.lock() {
            Slot::Idle => RefreshState::Idle,
            Slot::Refreshing(_) => RefreshState::Refreshing,
        }
    }

    /// Number of requests currently waiting on the refresh.
    #[must_use]
    pub fn queued(&self) -> usize {
        match &*self.lock() {
            Slot::Idle => 0,
            Slot::Refreshing(queue) => queue.len(),
        }
    }

    /// Total refreshes started since creation.
    #[must_use]
    pub fn refreshes_started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }
}
