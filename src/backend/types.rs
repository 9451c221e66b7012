use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::constants::MIN_PASSWORD_LENGTH;
use crate::utils::ClientError;

/// Body of a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Quota counters as reported by the backend, cached verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub used: u64,
    pub remaining: u64,
    pub limit: u64,
}

impl fmt::Display for UsageSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({} remaining)", self.used, self.limit, self.remaining)
    }
}

/// Successful chat response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatReply {
    pub response: String,
    #[serde(default, deserialize_with = "lenient_usage")]
    pub usage: Option<UsageSnapshot>,
}

/// A partial or malformed usage object counts as no usage; the reply still stands
fn lenient_usage<'de, D>(deserializer: D) -> Result<Option<UsageSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Error envelope; any field may be missing or of the wrong shape
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Parse leniently: anything that isn't the expected object yields an empty body
    pub fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    /// `message` first, then `error`; blank strings count as absent
    pub fn into_message(self) -> Option<String> {
        self.message
            .filter(|m| !m.trim().is_empty())
            .or(self.error.filter(|e| !e.trim().is_empty()))
    }
}

/// How a single chat exchange ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The backend answered with a reply
    Success {
        reply: String,
        usage: Option<UsageSnapshot>,
    },
    /// A response arrived but reported failure
    ServerFailure {
        status: Option<u16>,
        message: Option<String>,
    },
    /// No response was obtained
    TransportFailure { detail: String },
}

impl ExchangeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Email and password sent to the auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form, validated locally before anything is sent
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<LoginRequest, ClientError> {
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ClientError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::Validation("Passwords do not match".to_string()));
        }
        Ok(LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Account details returned by login, registration and the profile route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
}

/// Result of a successful login or registration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: Profile,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileEnvelope {
    pub user: Profile,
}

/// Per-user meal preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dietary_restrictions: String,
    #[serde(default)]
    pub max_cooking_time: u32,
}

impl fmt::Display for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let restrictions = if self.dietary_restrictions.is_empty() {
            "none"
        } else {
            &self.dietary_restrictions
        };
        writeln!(f, "Dietary restrictions: {}", restrictions)?;
        if self.max_cooking_time > 0 {
            write!(f, "Max cooking time: {} minutes", self.max_cooking_time)
        } else {
            write!(f, "Max cooking time: no limit")
        }
    }
}
