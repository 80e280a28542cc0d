//! API server lifecycle.
//!
//! Binds loopback only; the surface exists for the UI on the same
//! machine, not the network. Pattern: bind → spawn background task →
//! return a handle with a shutdown channel.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct ApiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl ApiServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shut the server down gracefully and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
        tracing::info!("API server stopped");
    }
}

/// Bind the API server on loopback and serve in a background task.
/// Port 0 picks an ephemeral port (tests).
pub async fn start_api_server(ctx: ApiContext, port: u16) -> std::io::Result<ApiServer> {
    let listener =
        tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await?;
    let addr = listener.local_addr()?;
    let app = api_router(ctx);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let serve = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(e) = serve.await {
            tracing::error!(error = %e, "API server error");
        }
    });

    tracing::info!(%addr, "API server listening");
    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::detector::Lexicon;
    use crate::narration::Narrator;

    fn ctx() -> ApiContext {
        ApiContext::new(Config::default(), Lexicon::empty(), Narrator::Disabled)
    }

    #[tokio::test]
    async fn binds_ephemeral_port_on_loopback() {
        let server = start_api_server(ctx(), 0).await.unwrap();
        let addr = server.addr();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_releases_port() {
        let server = start_api_server(ctx(), 0).await.unwrap();
        let port = server.addr().port();
        server.shutdown().await;

        // The port can be re-bound after a graceful shutdown.
        let listener =
            tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await;
        assert!(listener.is_ok());
    }
}
