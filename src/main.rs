mod cli;

use std::{path::Path, sync::Arc};

use clap::Parser;
use cli::Cli;
use ebook_portal::{
    PortalApi,
    config::Config,
    session::{CliNavigator, Session},
    storage::FileStore,
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type PortalResult<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() -> PortalResult<()> {
    // Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!("{}=info,reqwest=warn,h2=warn", env!("CARGO_PKG_NAME"));
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish()
        .with(ErrorLayer::default())
        .init();

    // Load environment variables from .env files
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };

    let cli = Cli::parse();
    let config = Config::load()?;
    if let Err(e) = config.validate() {
        return Err(anyhow::anyhow!(e));
    }
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        api_url = %config.api_url,
        session_file = %config.session_file.display(),
        "starting ebook portal client"
    );

    let store = Arc::new(FileStore::new(&config.session_file));
    let navigator = Arc::new(CliNavigator::new(cli.command.route()));
    let session = Session::new(store, navigator, config.login_route.clone());
    let api = PortalApi::new(&config.api_url, session, config.timeout)?;

    cli::run(cli.command, &api, &config).await
}
