/// Chat session module - Gateway

mod controller;
mod state;

pub use controller::{SessionController, Submission};
pub use state::{Role, SessionState, Turn};
