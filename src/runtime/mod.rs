/// Runtime orchestrator module - Gateway

mod chat;
mod non_interactive;
mod orchestrator;
mod render;

pub use chat::{ChatRepl, ReplCommand};
pub use non_interactive::{format_result, run_prompt, PromptResult};
pub use orchestrator::Orchestrator;
pub use render::Renderer;
