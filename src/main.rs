//! LMS CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use lms_client::cli::{auth, Cli, Commands};
use lms_client::client::AuthorizedClient;
use lms_client::config::ClientConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let client = Arc::new(AuthorizedClient::from_config(&config)?);

    match cli.command {
        Commands::Login(args) => auth::handle_login(client, &args).await,
        Commands::Register(args) => auth::handle_register(client, &args).await,
        Commands::Whoami => auth::handle_whoami(client).await,
        Commands::Logout => auth::handle_logout(client).await,
        Commands::Get(args) => auth::handle_get(client, &args).await,
    }
}
