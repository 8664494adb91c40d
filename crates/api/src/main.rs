use std::sync::Arc;

use anyhow::Context;

use tracker_api::app::{build_router, services::AppServices};
use tracker_infra::TrackerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TrackerConfig::from_env().context("invalid configuration")?;
    tracker_observability::init(config.log_format);

    let services = Arc::new(AppServices::from_config(&config));
    // Held for the life of the process; dropping it stops the sweep.
    let _progression = match config.sweep_interval {
        Some(interval) => Some(
            services
                .spawn_progression(interval)
                .context("failed to start progression worker")?,
        ),
        None => {
            tracing::info!("order progression sweep disabled");
            None
        }
    };

    let app = build_router(services, config.jwt_secret.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
