use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::SessionState;
use crate::app::SessionConfig;
use crate::backend::{ChatTransport, ExchangeOutcome};

/// Owns one chat session and admits at most one exchange at a time
///
/// All state lives behind a `watch` channel: writers go through
/// `send_modify`/`send_if_modified`, so readers always see the four fields
/// from a single point in time. Clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn ChatTransport>,
    state: watch::Sender<SessionState>,
    exchange_timeout: Option<Duration>,
}

/// Handle to an accepted exchange
///
/// Dropping it does not cancel anything; the exchange still runs to
/// completion and settles the session state.
#[must_use = "await `settled` to learn the outcome, or drop to let it finish in the background"]
pub struct Submission {
    handle: JoinHandle<ExchangeOutcome>,
}

impl Submission {
    /// Wait for the exchange to resolve
    pub async fn settled(self) -> ExchangeOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "exchange task ended abnormally");
                aborted()
            }
        }
    }
}

impl SessionController {
    /// Create an empty session over `transport`
    pub fn new(transport: Arc<dyn ChatTransport>, exchange_timeout: Option<Duration>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                transport,
                state,
                exchange_timeout,
            }),
        }
    }

    pub fn from_config(transport: Arc<dyn ChatTransport>, config: &SessionConfig) -> Self {
        Self::new(transport, config.exchange_timeout())
    }

    /// Submit a user message
    ///
    /// Returns `None` without touching state when the trimmed text is empty
    /// or an exchange is already in flight. Otherwise the user turn is in the
    /// transcript and `pending` is set before this returns; the network call
    /// runs on its own task. Must be called from within a Tokio runtime.
    pub fn submit(&self, text: &str) -> Option<Submission> {
        let message = text.trim();
        if message.is_empty() {
            debug!("blank submission ignored");
            return None;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "submission refused outside a Tokio runtime");
                return None;
            }
        };

        let accepted = self.inner.state.send_if_modified(|state| {
            if state.pending {
                return false;
            }
            state.begin(message);
            true
        });
        if !accepted {
            debug!("exchange already in flight, submission dropped");
            return None;
        }

        info!(chars = message.chars().count(), "submission accepted");
        let inner = Arc::clone(&self.inner);
        let message = message.to_string();
        let handle = runtime.spawn(async move { inner.exchange(message).await });
        Some(Submission { handle })
    }

    /// Submit and wait for the outcome; `None` when the submission was rejected
    pub async fn submit_and_wait(&self, text: &str) -> Option<ExchangeOutcome> {
        match self.submit(text) {
            Some(submission) => Some(submission.settled().await),
            None => None,
        }
    }

    /// Snapshot of the whole session
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.state.borrow().pending
    }

    /// Receive every state change from now on
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Resolve once no exchange is in flight
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|state| !state.pending).await;
    }

    /// Start over with an empty session; refused while an exchange is in flight
    pub fn reset(&self) -> bool {
        self.inner.state.send_if_modified(|state| {
            if state.pending {
                return false;
            }
            *state = SessionState::default();
            true
        })
    }
}

impl Inner {
    async fn exchange(&self, message: String) -> ExchangeOutcome {
        let mut guard = SettleGuard {
            state: &self.state,
            armed: true,
        };

        let call = self.transport.send_message(&message);
        let outcome = match self.exchange_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => ExchangeOutcome::TransportFailure {
                    detail: format!("no response within {}s", limit.as_secs_f32()),
                },
            },
            None => call.await,
        };

        match &outcome {
            ExchangeOutcome::Success { usage, .. } => {
                info!(?usage, "exchange completed");
            }
            ExchangeOutcome::ServerFailure { status, message } => {
                warn!(?status, ?message, "backend reported failure");
            }
            ExchangeOutcome::TransportFailure { detail } => {
                warn!(%detail, "no response from backend");
            }
        }

        guard.armed = false;
        self.state.send_modify(|state| state.settle(&outcome));
        outcome
    }
}

/// Releases the pending flag if the exchange unwinds or is torn down early
struct SettleGuard<'a> {
    state: &'a watch::Sender<SessionState>,
    armed: bool,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|state| state.settle(&aborted()));
        }
    }
}

fn aborted() -> ExchangeOutcome {
    ExchangeOutcome::ServerFailure {
        status: None,
        message: None,
    }
}
