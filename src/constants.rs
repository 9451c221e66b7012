/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

// Backend routes
pub const CHAT_PATH: &str = "/llm";
pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const PREFERENCES_PATH: &str = "/api/preferences";
pub const PROFILE_PATH: &str = "/api/profile";
pub const HEALTH_PATH: &str = "/health";
pub const DB_HEALTH_PATH: &str = "/health/db";
pub const LLM_HEALTH_PATH: &str = "/health/llm";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

// Registration rules
pub const MIN_PASSWORD_LENGTH: usize = 6;

// User-facing fallback messages
pub const REQUEST_FAILED_MESSAGE: &str = "Failed to get response";
pub const CONNECTIVITY_MESSAGE: &str = "Network error. Please check if you're logged in.";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed";
pub const LOGOUT_FAILED_MESSAGE: &str = "Logout failed";
pub const LOAD_PREFERENCES_FAILED_MESSAGE: &str = "Failed to load preferences";
pub const SAVE_PREFERENCES_FAILED_MESSAGE: &str = "Failed to save preferences";
pub const PROFILE_FAILED_MESSAGE: &str = "Failed to load profile";

// Config & credential files
pub const APP_NAME: &str = "mealplan";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CREDENTIALS_FILE_NAME: &str = "credentials.toml";
pub const LOCAL_CONFIG_DIR: &str = ".mealplan";
pub const ENV_PREFIX: &str = "MEALPLAN_";
