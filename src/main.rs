//! Main entry point for the AVM user identification daemon
use anyhow::Context;
use clap::Parser;

use avmident::accounts::SystemAccounts;
use avmident::cli::args::Cli;
use avmident::server::{self, IdentServer};
use avmident::session::SessionContext;

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let config = cli.to_config()?;

    let listener = server::open_listener(config.port)
        .with_context(|| format!("Cannot listen on port {}", config.port))?;

    let accounts = SystemAccounts;
    let context = SessionContext {
        config: &config,
        accounts: &accounts,
    };

    let server = IdentServer::new(listener, context);
    server.run().context("Identification server stopped")?;

    Ok(())
}
