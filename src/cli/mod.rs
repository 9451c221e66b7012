/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;

pub use args::{Cli, Commands, OutputFormat, PreferencesAction};
pub use commands::{handle_command, show_version};
