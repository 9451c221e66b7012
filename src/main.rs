use anyhow::Result;
use clap::Parser;

use mealplan::{cli::Cli, runtime::Orchestrator, utils::init_logger};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(cli.verbose);

    let orchestrator = Orchestrator::new(cli)?;
    if !orchestrator.run().await? {
        // One-shot prompt failed; the result has already been printed
        std::process::exit(1);
    }

    Ok(())
}
