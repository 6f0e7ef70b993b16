use clap::Parser;
use tracing::info;

use meridian::account::{AccountService, AccountStore};
use meridian::api::ApiServer;
use meridian::auth::TokenVerifier;
use meridian::config::ServiceConfig;
use meridian::storage::Storage;

/// Account service command-line arguments
#[derive(Parser, Debug)]
#[clap(name = "meridian", version)]
struct Args {
    /// Path to the TOML configuration file
    #[clap(long, default_value = "meridian.toml")]
    config: String,

    /// Override the configured HTTP port
    #[clap(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ServiceConfig::load_or_default(&args.config);
    let port = args.port.unwrap_or(config.server.port);

    info!("Account service starting...");
    info!("Database path: {}", config.server.db_path);

    let storage = Storage::open(&config.server.db_path)?;
    let store = AccountStore::new(&storage)?;
    let service = AccountService::new(store, config.account.clone());
    let verifier = TokenVerifier::new(config.auth.jwt_secret.as_bytes());

    ApiServer::new(service, verifier, port).start().await;

    Ok(())
}
