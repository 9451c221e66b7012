pub mod app;
pub mod backend;
pub mod cli;
pub mod constants;
pub mod runtime;
pub mod session;
pub mod utils;

pub use app::{load_config, Config};
pub use backend::{BackendClient, ChatTransport, ExchangeOutcome, UsageSnapshot};
pub use session::{Role, SessionController, SessionState, Turn};
pub use utils::ClientError;
