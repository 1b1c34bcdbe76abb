//! Basemap Gateway - enhanced previews for satellite basemap quads.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use basemap_gateway::{
    basemap::BasemapService,
    config::Config,
    preview::{PreviewCache, PreviewService},
    server::{create_router, RouterConfig},
    upstream::PlanetClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!(
        "Basemap Gateway v{} starting",
        env!("CARGO_PKG_VERSION")
    );
    info!("Configuration:");
    info!("  Planet API: {}", config.planet_base_url);
    info!(
        "  Upstream: {}s timeout, {} poll attempts every {}s",
        config.upstream_timeout, config.poll_attempts, config.poll_delay
    );
    if config.cache_previews {
        info!(
            "  Preview cache: {}MB, TTL {}s",
            config.preview_cache_size / (1024 * 1024),
            config.preview_ttl
        );
    } else {
        warn!("  Preview cache: DISABLED - every request hits the provider");
    }
    info!("  Mosaic lookup TTL: {}s", config.mosaic_ttl);

    // validate() guarantees a key is present
    let api_key = config.api_key().unwrap_or_default();
    let client = match PlanetClient::with_config(api_key, config.planet_client_config()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create Planet client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cache = Arc::new(PreviewCache::with_capacity(config.preview_cache_size));
    let preview_service = PreviewService::new(client.clone(), cache)
        .with_ttl(config.preview_ttl())
        .with_caching(config.cache_previews);
    let basemap_service = BasemapService::new(client).with_mosaic_ttl(config.mosaic_ttl());

    let router = create_router(preview_service, basemap_service, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/basemaps/series", addr);
    info!(
        "    curl 'http://{}/preview?mosaic_id=<mosaic>&quad_id=<quad>'",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "basemap_gateway=debug,tower_http=debug"
    } else {
        "basemap_gateway=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
