use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::chat::ChatRepl;
use super::non_interactive::{format_result, run_prompt};
use super::render::Renderer;
use crate::{
    app::{load_config, load_config_file, Config, CredentialStore},
    backend::BackendClient,
    cli::{handle_command, Cli},
    session::SessionController,
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
    credentials: CredentialStore,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let mut config = if let Some(config_path) = &cli.config {
            load_config_file(config_path)?
        } else {
            match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(error = %e, "failed to load config, using defaults");
                    Config::default()
                }
            }
        };

        if let Some(server) = &cli.server {
            config.server.base_url = server.clone();
        }

        if !config.ui.color {
            colored::control::set_override(false);
        }

        let credentials = match CredentialStore::load() {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "failed to load stored credentials");
                CredentialStore::default()
            }
        };

        debug!(server = %config.server.base_url, logged_in = credentials.is_logged_in(), "configured");
        Ok(Self {
            cli,
            config,
            credentials,
        })
    }

    /// Run the orchestrator
    ///
    /// Returns `false` when a one-shot prompt failed.
    pub async fn run(mut self) -> Result<bool> {
        if let Some(command) = &self.cli.command {
            if handle_command(command, &self.config, &mut self.credentials).await? {
                return Ok(true);
            }
        }

        let client = Arc::new(BackendClient::new(
            &self.config.server,
            self.credentials.token.clone(),
        )?);
        let controller = SessionController::from_config(client, &self.config.session);

        if let Some(prompt) = &self.cli.prompt {
            let result = run_prompt(&controller, prompt).await;
            println!("{}", format_result(&result, self.cli.output_format));
            return Ok(result.succeeded());
        }

        if !self.credentials.is_logged_in() {
            eprintln!(
                "{} not logged in; the backend will likely refuse chat requests. Run `mealplan login` first.",
                "warning:".yellow()
            );
        }

        let renderer = Renderer::new(self.config.ui.clone());
        ChatRepl::new(controller, renderer, self.config.session.show_usage)
            .run()
            .await?;
        Ok(true)
    }
}
