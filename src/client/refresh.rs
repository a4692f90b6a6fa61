//! Single-flight gate for credential refreshes.
//!
//! The gate is a two-state machine, `Idle -> Refreshing -> Idle`. The first
//! caller to [`RefreshGate::admit`] while idle becomes the leader and owns a
//! [`RefreshLease`]; everyone admitted while the lease is live gets a
//! [`RefreshWaiter`] and is released with the leader's outcome when the lease
//! is settled. Settling drains the queue and returns to `Idle` under one lock.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::auth::AuthError;

pub type RefreshOutcome = Result<(), AuthError>;

#[derive(Debug)]
enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

#[derive(Debug)]
pub struct RefreshGate {
    state: Mutex<RefreshState>,
}

/// Result of asking the gate for permission to refresh.
#[derive(Debug)]
pub enum Admission<'a> {
    /// No refresh was in flight; the caller must run it and settle the lease.
    Leader(RefreshLease<'a>),
    /// A refresh is already in flight; wait for its outcome.
    Waiter(RefreshWaiter),
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Enter the gate. Never suspends, so the transition to `Refreshing`
    /// happens before the leader's first await.
    pub fn admit(&self) -> Admission<'_> {
        let mut state = self.lock();
        if let RefreshState::Refreshing { waiters } = &mut *state {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            return Admission::Waiter(RefreshWaiter { rx });
        }
        *state = RefreshState::Refreshing {
            waiters: Vec::new(),
        };
        Admission::Leader(RefreshLease {
            gate: self,
            settled: false,
        })
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), RefreshState::Refreshing { .. })
    }

    /// Number of callers parked behind the in-flight refresh.
    pub fn queued(&self) -> usize {
        match &*self.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    fn drain(&self, outcome: RefreshOutcome) -> usize {
        let waiters = match std::mem::replace(&mut *self.lock(), RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        };
        let released = waiters.len();
        for waiter in waiters {
            // A waiter whose request future was dropped no longer listens.
            let _ = waiter.send(outcome.clone());
        }
        released
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Proof of leadership over the in-flight refresh.
///
/// Dropping an unsettled lease releases every waiter with
/// [`AuthError::RefreshAbandoned`].
#[derive(Debug)]
pub struct RefreshLease<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Release all waiters with `outcome` and return the gate to idle.
    /// Returns how many waiters were released.
    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        self.gate.drain(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let released = self.gate.drain(Err(AuthError::RefreshAbandoned));
            tracing::warn!(released, "refresh leader dropped before settling");
        }
    }
}

/// Parked caller waiting on someone else's refresh.
#[derive(Debug)]
pub struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx.await.unwrap_or(Err(AuthError::RefreshAbandoned))
    }
}
