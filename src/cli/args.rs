use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mealplan")]
#[command(version)]
#[command(about = "Chat with the meal-planning assistant from your terminal", long_about = None)]
pub struct Cli {
    /// Backend base URL (e.g., http://localhost:8080)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Send a single message and print the reply
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Output format for --prompt
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, requires = "prompt")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Start a chat session (default)
    Chat,
    /// Log in and remember the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MEALPLAN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account (logs in on success)
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Log out and forget the stored token
    Logout,
    /// Show or change meal preferences
    Preferences {
        #[command(subcommand)]
        action: PreferencesAction,
    },
    /// Check backend reachability and login state
    Status,
    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum PreferencesAction {
    /// Print the stored preferences
    Show,
    /// Update one or more preferences
    Set {
        /// Free-form restrictions, e.g. "vegetarian, no nuts"
        #[arg(long)]
        dietary_restrictions: Option<String>,
        /// Longest acceptable cooking time in minutes (0 = no limit)
        #[arg(long)]
        max_cooking_time: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
    /// Markdown formatted output
    Markdown,
}
