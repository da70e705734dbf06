use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use firmhub_api::app::{build_app, services};
use firmhub_api::middleware::AuthState;
use firmhub_auth::Hs256JwtService;
use firmhub_infra::AppConfig;
use firmhub_observability::TracingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;

    firmhub_observability::init(&TracingConfig {
        level: config.log_level.clone(),
        json: !config.is_dev(),
    });
    info!(?config, "starting firmhub");

    let auth = config.auth().context("invalid token configuration")?;
    let jwt = Arc::new(Hs256JwtService::from_config(&auth));
    let services = Arc::new(services::build_services(&config, jwt.clone()).await?);
    let app = build_app(services, AuthState { jwt }, config.request_timeout());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
