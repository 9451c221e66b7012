use thiserror::Error;

/// Main error type for the meal-planning client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Not authenticated. Run `mealplan login` first")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// HTTP status reported by the backend, if this error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotAuthenticated => Some(401),
            _ => None,
        }
    }
}
