//! League Service
//!
//! Entry point for the report CLI: loads configuration, sets up logging and
//! dispatches the requested command.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use league_service::cli::{Cli, CliHandler};
use league_service::{load_configuration, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // No logging settings yet, so report through the RUST_LOG defaults
            logging::initialize_logging()?;
            error!("{:#}", e);
            return Err(e);
        }
    };
    logging::initialize_from_config(&config.logging)?;

    info!("Starting League Service v{}", env!("CARGO_PKG_VERSION"));

    let handler = CliHandler::new(config);
    handler.handle_command(cli.command).await?;

    Ok(())
}
