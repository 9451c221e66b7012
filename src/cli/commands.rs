use anyhow::{Context, Result};
use colored::Colorize;

use crate::{
    app::{get_config_dir, init_config, Config, CredentialStore},
    backend::{AuthSession, BackendClient, Preferences, RegistrationForm},
    utils::log_progress,
};

use super::{Commands, PreferencesAction};

/// Handle CLI subcommands
///
/// Returns `Ok(false)` when the caller should continue into the chat session.
pub async fn handle_command(
    command: &Commands,
    config: &Config,
    credentials: &mut CredentialStore,
) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing meal planner configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
            Ok(true)
        }
        Commands::Chat => Ok(false),
        Commands::Login { email, password } => {
            let client = BackendClient::new(&config.server, None)?;
            let session = client.login(email, password).await?;
            remember_login(credentials, session)?;
            Ok(true)
        }
        Commands::Register {
            email,
            password,
            confirm_password,
        } => {
            let form = RegistrationForm {
                email: email.clone(),
                password: password.clone(),
                confirm_password: confirm_password.clone(),
            };
            let client = BackendClient::new(&config.server, None)?;
            let session = client.register(&form).await?;
            remember_login(credentials, session)?;
            Ok(true)
        }
        Commands::Logout => {
            let client = BackendClient::new(&config.server, credentials.token.clone())?;
            if let Err(e) = client.logout().await {
                eprintln!("{} backend logout failed: {}", "warning:".yellow(), e);
            }
            credentials
                .clear()
                .context("Failed to clear stored credentials")?;
            println!("Logged out.");
            Ok(true)
        }
        Commands::Preferences { action } => {
            let client = BackendClient::new(&config.server, credentials.token.clone())?;
            handle_preferences(&client, action).await?;
            Ok(true)
        }
        Commands::Status => {
            show_status(config, credentials).await?;
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
    }
}

fn remember_login(credentials: &mut CredentialStore, session: AuthSession) -> Result<()> {
    let email = session.user.email.clone();
    credentials.set_login(session.token, session.user.email);
    credentials
        .save()
        .context("Logged in, but failed to store the session token")?;
    println!("Logged in as {}", email.green());
    Ok(())
}

async fn handle_preferences(client: &BackendClient, action: &PreferencesAction) -> Result<()> {
    match action {
        PreferencesAction::Show => {
            let preferences = client.preferences().await?;
            println!("{}", preferences);
        }
        PreferencesAction::Set {
            dietary_restrictions,
            max_cooking_time,
        } => {
            log_progress(1, 2, "Loading current preferences");
            let current = client.preferences().await?;
            let updated = merge_preferences(current, dietary_restrictions, *max_cooking_time);

            log_progress(2, 2, "Saving preferences");
            client.update_preferences(&updated).await?;
            println!("{}", "Preferences saved successfully!".green());
            println!("{}", updated);
        }
    }
    Ok(())
}

/// Apply only the fields the user passed on the command line
fn merge_preferences(
    mut current: Preferences,
    dietary_restrictions: &Option<String>,
    max_cooking_time: Option<u32>,
) -> Preferences {
    if let Some(restrictions) = dietary_restrictions {
        current.dietary_restrictions = restrictions.trim().to_string();
    }
    if let Some(minutes) = max_cooking_time {
        current.max_cooking_time = minutes;
    }
    current
}

/// Show version information
pub fn show_version() {
    println!("mealplan v{}", env!("CARGO_PKG_VERSION"));
    println!("   Terminal client for the meal-planning assistant");
}

/// Show backend reachability and local login state
async fn show_status(config: &Config, credentials: &CredentialStore) -> Result<()> {
    println!("Meal planner status:");
    println!();

    let client = BackendClient::new(&config.server, credentials.token.clone())?;
    if client.health().await {
        println!("  [OK] Backend: reachable at {}", client.base_url());
        println!("{}", health_line("Database", client.database_health().await));
        println!("{}", health_line("Language model", client.llm_health().await));
    } else {
        println!("  [ERROR] Backend: not reachable at {}", client.base_url());
    }

    match &credentials.email {
        Some(email) if credentials.is_logged_in() => {
            println!("  [OK] Login: {}", email);
        }
        _ => println!("  [WARNING] Login: not logged in (run `mealplan login`)"),
    }

    let config_path = get_config_dir()?.join("config.toml");
    if config_path.exists() {
        println!("  [OK] Configuration: {}", config_path.display());
    } else {
        println!("  [WARNING] Configuration: Not found (using defaults)");
    }

    println!();
    Ok(())
}

fn health_line(component: &str, healthy: bool) -> String {
    if healthy {
        format!("  [OK] {}: healthy", component)
    } else {
        format!("  [ERROR] {}: unavailable", component)
    }
}
