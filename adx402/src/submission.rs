//! Per-form submission state.
//!
//! One [`SubmissionTracker`] per form. It refuses a second submission while
//! one is in flight and publishes every transition on a watch channel so a
//! front end can render progress.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Adx402Error, Result};

/// Failure classes the UI reacts to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    WalletNotConnected,
    SigningRejected,
    PaymentSigningUnavailable,
    ServerRejected,
    NetworkError,
    Other,
}

impl From<&Adx402Error> for FailureKind {
    fn from(e: &Adx402Error) -> Self {
        match e {
            Adx402Error::NotConnected | Adx402Error::NotVerified => FailureKind::WalletNotConnected,
            Adx402Error::SigningRejected(_) | Adx402Error::Cancelled => {
                FailureKind::SigningRejected
            }
            Adx402Error::PaymentSigningUnavailable => FailureKind::PaymentSigningUnavailable,
            Adx402Error::ServerRejected { .. } | Adx402Error::PaymentRejected(_) => {
                FailureKind::ServerRejected
            }
            Adx402Error::Network(_) => FailureKind::NetworkError,
            _ => FailureKind::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    /// Waiting on the wallet.
    Signing,
    /// Request on the wire.
    Submitting,
    /// Succeeded; `settlement` is the payment transaction id when the server
    /// sent a readable receipt.
    Settled { settlement: Option<String> },
    /// The backend reports the publisher already exists.
    AlreadyRegistered { message: String },
    Failed { kind: FailureKind, message: String },
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::Signing | SubmissionState::Submitting)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Settled { .. }
                | SubmissionState::AlreadyRegistered { .. }
                | SubmissionState::Failed { .. }
        )
    }

    fn from_error(e: &Adx402Error) -> Self {
        match e {
            Adx402Error::AlreadyRegistered(_) => SubmissionState::AlreadyRegistered {
                message: e.user_message(),
            },
            _ => SubmissionState::Failed {
                kind: FailureKind::from(e),
                message: e.user_message(),
            },
        }
    }
}

/// Observable state machine for one form.
#[derive(Debug, Clone)]
pub struct SubmissionTracker {
    tx: Arc<watch::Sender<SubmissionState>>,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SubmissionState::Idle);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> SubmissionState {
        self.tx.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.tx.borrow().is_in_flight()
    }

    /// Enter `initial` unless a submission is already in flight.
    pub fn begin(&self, initial: SubmissionState) -> Result<()> {
        let mut busy = false;
        self.tx.send_if_modified(|state| {
            if state.is_in_flight() {
                busy = true;
                false
            } else {
                *state = initial;
                true
            }
        });
        if busy {
            return Err(Adx402Error::Busy);
        }
        Ok(())
    }

    /// Move between in-flight phases. Ignored once the submission has ended.
    pub fn set_phase(&self, phase: SubmissionState) {
        self.tx.send_if_modified(|state| {
            if state.is_in_flight() && *state != phase {
                debug!(from = ?state, to = ?phase, "submission phase");
                *state = phase;
                true
            } else {
                false
            }
        });
    }

    pub fn settle(&self, settlement: Option<String>) {
        self.tx.send_replace(SubmissionState::Settled { settlement });
    }

    pub fn fail(&self, error: &Adx402Error) {
        warn!(error = %error, "submission failed");
        self.tx.send_replace(SubmissionState::from_error(error));
    }

    /// Return to `Idle` after a terminal state. No-op while in flight.
    pub fn reset(&self) {
        self.tx.send_if_modified(|state| {
            if state.is_in_flight() {
                false
            } else {
                *state = SubmissionState::Idle;
                true
            }
        });
    }

    /// Drive `fut` through the state machine, starting in `initial`.
    ///
    /// `settlement` picks the payment transaction id out of a successful
    /// result. Failures are recorded and returned; nothing is retried.
    pub async fn run<T, F>(
        &self,
        initial: SubmissionState,
        fut: F,
        settlement: impl FnOnce(&T) -> Option<String>,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.begin(initial)?;
        match fut.await {
            Ok(value) => {
                self.settle(settlement(&value));
                Ok(value)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }
}
