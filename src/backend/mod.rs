// Gateway module for the backend - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod client;
mod traits;
mod types;

// Public re-exports - the ONLY way to access backend functionality
pub use client::BackendClient;
#[cfg(test)]
pub use traits::MockChatTransport;
pub use traits::ChatTransport;
pub use types::{
    AuthSession, ChatRequest, ExchangeOutcome, LoginRequest, Preferences, Profile,
    RegistrationForm, UsageSnapshot,
};
