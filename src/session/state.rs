use serde::{Deserialize, Serialize};

use crate::backend::{ExchangeOutcome, UsageSnapshot};
use crate::constants::{CONNECTIVITY_MESSAGE, REQUEST_FAILED_MESSAGE};

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything a view needs to draw a chat session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Append-only, in acceptance order
    pub transcript: Vec<Turn>,
    /// True while an exchange is in flight
    pub pending: bool,
    /// Most recent failure, cleared by the next accepted submission
    pub last_error: Option<String>,
    /// Latest quota counters; absent until a reply carries them
    pub usage: Option<UsageSnapshot>,
}

impl SessionState {
    /// Admit a submission: clear the error, echo the user turn, go pending
    pub(crate) fn begin(&mut self, message: &str) {
        self.last_error = None;
        self.transcript.push(Turn::user(message));
        self.pending = true;
    }

    /// Fold the result of the in-flight exchange back in and go idle
    pub(crate) fn settle(&mut self, outcome: &ExchangeOutcome) {
        match outcome {
            ExchangeOutcome::Success { reply, usage } => {
                self.transcript.push(Turn::assistant(reply.clone()));
                if let Some(usage) = usage {
                    self.usage = Some(*usage);
                }
            }
            ExchangeOutcome::ServerFailure { message, .. } => {
                let message = message
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(REQUEST_FAILED_MESSAGE);
                self.last_error = Some(message.to_string());
            }
            ExchangeOutcome::TransportFailure { .. } => {
                self.last_error = Some(CONNECTIVITY_MESSAGE.to_string());
            }
        }
        self.pending = false;
    }

    /// Last assistant reply, if the transcript ends with one
    pub fn last_reply(&self) -> Option<&str> {
        self.transcript
            .last()
            .filter(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn usage(used: u64, remaining: u64, limit: u64) -> UsageSnapshot {
        UsageSnapshot { used, remaining, limit }
    }

    #[test]
    fn test_success_keeps_prior_usage_when_absent() {
        let mut state = SessionState::default();
        state.begin("first");
        state.settle(&ExchangeOutcome::Success {
            reply: "one".to_string(),
            usage: Some(usage(1, 9, 10)),
        });
        state.begin("second");
        state.settle(&ExchangeOutcome::Success {
            reply: "two".to_string(),
            usage: None,
        });

        assert_eq!(state.usage, Some(usage(1, 9, 10)));
        assert_eq!(state.last_reply(), Some("two"));
        assert!(!state.pending);
    }

    #[test]
    fn test_usage_is_taken_verbatim() {
        let mut state = SessionState::default();
        state.begin("hi");
        // Inconsistent counters are not corrected locally
        state.settle(&ExchangeOutcome::Success {
            reply: "hello".to_string(),
            usage: Some(usage(5, 5, 3)),
        });
        assert_eq!(state.usage, Some(usage(5, 5, 3)));
    }

    #[test]
    fn test_server_failure_falls_back_to_generic_message() {
        let mut state = SessionState::default();
        state.begin("hi");
        state.settle(&ExchangeOutcome::ServerFailure {
            status: Some(500),
            message: None,
        });
        assert_eq!(state.last_error.as_deref(), Some(REQUEST_FAILED_MESSAGE));
        assert_eq!(state.transcript, vec![Turn::user("hi")]);
        assert_eq!(state.last_reply(), None);
    }

    #[test]
    fn test_begin_clears_previous_error() {
        let mut state = SessionState::default();
        state.begin("hi");
        state.settle(&ExchangeOutcome::TransportFailure {
            detail: "connection refused".to_string(),
        });
        assert_eq!(state.last_error.as_deref(), Some(CONNECTIVITY_MESSAGE));

        state.begin("again");
        assert_eq!(state.last_error, None);
        assert!(state.pending);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
