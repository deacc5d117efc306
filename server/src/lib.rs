pub mod cli;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use anyhow::{Context, Result};
use common::config::ServerConfig;
use log::{error, info};
use mysql::MysqlManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use state::AppState;

/// HTTP server exposing the backup management API
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    pub fn new(config: ServerConfig, manager: MysqlManager) -> Self {
        Server {
            config,
            state: Arc::new(AppState::new(manager)),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.bind, self.config.port)
    }

    /// Serve until Ctrl+C, then stop accepting and drain in-flight requests
    pub async fn start(self) -> Result<()> {
        let address = self.address();
        let listener = TcpListener::bind(&address)
            .await
            .context(format!("Failed to bind {address}"))?;

        info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, routes::router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
            // Keep serving; the process can still be killed
            std::future::pending::<()>().await;
        }
    }
}
