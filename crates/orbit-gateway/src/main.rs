//! Orbit gateway binary.
//!
//! - Config from `ORBIT_CONFIG` (default `orbit.yaml`)
//! - Seeds the bootstrap admin if configured
//! - Background purge of expired rate-limit windows
//! - Graceful shutdown on Ctrl-C (readiness flips to draining first)

use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use orbit_gateway::{app_state, config, router};

const CONFIG_ENV: &str = "ORBIT_CONFIG";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "orbit-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> orbit_core::Result<()> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "orbit.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.server.listen.parse().map_err(|e| {
        orbit_core::OrbitError::validation(format!("server.listen must be a valid SocketAddr: {e}"))
    })?;
    let purge_every = Duration::from_millis(cfg.server.rate_limit_purge_interval_ms);

    let state = app_state::AppState::new(cfg)?;
    state.seed_bootstrap_admin().await?;

    let purger = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(purge_every);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            let removed = purger.policy().limiter().purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "expired rate-limit windows purged");
            }
        }
    });

    let app = router::build_router(state.clone());

    tracing::info!(%listen, "orbit-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| orbit_core::OrbitError::Internal(format!("failed to bind {listen}: {e}")))?;

    let draining = state.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        draining.set_draining();
        tracing::info!("shutdown requested, draining");
    })
    .await
    .map_err(|e| orbit_core::OrbitError::Internal(format!("server failed: {e}")))
}
