//! HTTP server lifecycle

use super::{
    middleware::{create_middleware_stack, create_trace_layer, request_logger},
    routes::create_router,
    AppState,
};
use crate::commands::cli::ServeArgs;
use agentbox_core::api::{AppConfig, CliError, Engine};
use axum::middleware;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Command line flags win over the config file.
    pub fn resolve(args: &ServeArgs, cfg: &AppConfig) -> Self {
        Self {
            host: args
                .host
                .clone()
                .unwrap_or_else(|| cfg.http_server.host.clone()),
            port: args.port.unwrap_or(cfg.http_server.port),
        }
    }
}

/// Handle `serve`: start the engine, serve until a shutdown signal, then drain workers.
pub async fn handle_serve(args: ServeArgs, cfg: &AppConfig) -> Result<(), CliError> {
    let server_cfg = ServerConfig::resolve(&args, cfg);

    let engine = Engine::start(cfg).await?;
    info!(
        tasks_dir = %cfg.tasks_root().display(),
        requeued = engine.recovery().requeued.len(),
        interrupted = engine.recovery().interrupted.len(),
        "task engine ready"
    );

    let state = AppState::new(engine.service().clone());

    let served = start_server(server_cfg, state).await;

    info!("waiting for running tasks to finish");
    engine.shutdown().await;

    served.map_err(|e| CliError::Command(e.to_string()))
}

pub async fn start_server(
    config: ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state.clone())
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack())
        .layer(create_trace_layer());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                }
                _ = wait_for_sigterm() => {
                    info!("Received SIGTERM signal");
                }
            }

            info!("Starting graceful shutdown...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot install SIGTERM handler");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cfg = AppConfig::default();
        let args = ServeArgs {
            host: None,
            port: Some(9100),
        };
        let resolved = ServerConfig::resolve(&args, &cfg);
        assert_eq!(resolved.host, cfg.http_server.host);
        assert_eq!(resolved.port, 9100);
    }
}
