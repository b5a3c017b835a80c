use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;


use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eduledger=info,ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("EduLedger starting up");

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.run().await
}
