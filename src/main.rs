//! Starship proxy - serves the Star Wars starship catalog with filtering and caching
//!
//! Loads configuration, wires the fetcher to the upstream catalog and an
//! in-memory cache, then serves the HTTP API until interrupted.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starship_proxy::{
    cache::{Cache, CacheManager},
    cli::Cli,
    config::Config,
    data::{HttpTransport, Starship},
    fetcher::StarshipFetcher,
    sweeper::CacheSweeper,
    web::WebServer,
};

/// Initializes logging; `RUST_LOG` takes precedence over `--log-level`
fn init_tracing(cli: &Cli) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli);

    info!("Starting starship proxy v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    info!(
        upstream = %config.upstream.base_url,
        ttl_secs = config.cache.ttl_secs,
        max_entries = config.cache.max_entries,
        "Configuration loaded"
    );

    let transport = Arc::new(HttpTransport::with_timeout(config.upstream.timeout())?);
    let cache: Arc<dyn Cache<Vec<Starship>>> =
        Arc::new(CacheManager::with_capacity(config.cache.max_entries));
    let fetcher = StarshipFetcher::new(
        transport,
        Arc::clone(&cache),
        config.upstream.base_url.clone(),
        config.cache.ttl(),
    );

    let sweeper = CacheSweeper::spawn(cache, config.cache.sweep_interval());

    let web_server = WebServer::new(&config.server, fetcher);
    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    sweeper.shutdown().await;
    info!("Starship proxy stopped");

    Ok(())
}
