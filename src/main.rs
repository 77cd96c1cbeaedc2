use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use schedulo_auth::providers::{self, ProviderRegistry};
use schedulo_auth::{api, AppState, Config, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schedulo_auth=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("schedulo-auth v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}:{}", config.host, config.port);

    let mut registry = ProviderRegistry::new();
    providers::register_defaults(&mut registry, &config);
    if registry.count() == 0 {
        warn!("No OAuth providers configured; sign-in is unavailable");
    } else {
        info!("Registered {} OAuth providers", registry.count());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state: SharedState = Arc::new(AppState::new(config, registry)?);

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server ready ✓");
    axum::serve(listener, app).await?;

    Ok(())
}
