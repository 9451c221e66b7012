use async_trait::async_trait;

use super::types::ExchangeOutcome;

/// Carries one chat message to the backend and reports how it went
///
/// Implementations never return an error: every failure is folded into
/// [`ExchangeOutcome`]. Credentials are the transport's business.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one trimmed user message; exactly one outbound request per call
    async fn send_message(&self, message: &str) -> ExchangeOutcome;
}
