//! Application entry point.

use std::env;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use solana_privacy_scorer::api::create_router;
use solana_privacy_scorer::app::{
    AppState, DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_LIMIT, ReportService,
};
use solana_privacy_scorer::domain::TransactionSource;
use solana_privacy_scorer::infra::{HeliusIndexer, RegistryManager};

/// Application configuration
struct Config {
    host: String,
    port: u16,
    /// Helius API key (optional - indexer uses mock mode if not set)
    helius_api_key: Option<SecretString>,
    /// Helius API base URL (optional - uses default if not set)
    helius_api_url: Option<String>,
    /// Path to a JSON file of known-entity registry entries (optional)
    registry_path: Option<String>,
    /// Report cache TTL in seconds (default: 3600)
    report_cache_ttl_secs: i64,
    /// Transactions fetched per analysis (default: 100)
    fetch_limit: usize,
}

impl Config {
    fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let helius_api_key = env::var("HELIUS_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from);
        let helius_api_url = env::var("HELIUS_API_URL").ok().filter(|u| !u.is_empty());

        let registry_path = env::var("REGISTRY_PATH").ok().filter(|p| !p.is_empty());

        let report_cache_ttl_secs = env::var("REPORT_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let fetch_limit = env::var("FETCH_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_FETCH_LIMIT);

        Ok(Self {
            host,
            port,
            helius_api_key,
            helius_api_url,
            registry_path,
            report_cache_ttl_secs,
            fetch_limit,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🔍 Solana Privacy Scorer v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    info!("📦 Initializing infrastructure...");

    let indexer = HeliusIndexer::new(
        config.helius_api_key.clone(),
        config.helius_api_url.clone(),
    );
    if config.helius_api_key.is_some() {
        info!("   ✓ Helius indexer created");
    } else {
        warn!("   ⚠ Helius indexer created (MOCK MODE - no HELIUS_API_KEY)");
    }

    let registries = match &config.registry_path {
        Some(path) => {
            let manager = RegistryManager::from_file(std::path::Path::new(path))?;
            info!(
                "   ✓ Registry loaded from {} ({} entries)",
                path,
                manager.len()
            );
            manager
        }
        None => {
            let manager = RegistryManager::with_defaults();
            info!(
                "   ○ No REGISTRY_PATH set, using built-in defaults ({} entries)",
                manager.len()
            );
            manager
        }
    };

    let indexer: Arc<dyn TransactionSource> = Arc::new(indexer);
    let registries = Arc::new(registries);

    let report_service = ReportService::new(Arc::clone(&indexer), Arc::clone(&registries))
        .with_cache_ttl(config.report_cache_ttl_secs)
        .with_fetch_limit(config.fetch_limit);

    let app_state = Arc::new(
        AppState::new(indexer, registries).with_report_service(report_service),
    );
    info!(
        "   ✓ Report service initialized (cache TTL: {}s, fetch limit: {})",
        config.report_cache_ttl_secs, config.fetch_limit
    );

    let router = create_router(app_state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/swagger-ui", addr);
    info!("📄 OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shut down gracefully");
    Ok(())
}
