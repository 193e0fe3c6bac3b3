use clap::Parser;
use tracing_subscriber::EnvFilter;

use rebase_ledger::cli::{ops, Cli};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = ops::handle_command(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
