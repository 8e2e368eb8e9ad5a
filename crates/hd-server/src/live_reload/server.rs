//! Reload channel server.
//!
//! A standalone WebSocket listener, separate from the asset server, that
//! accepts reload clients and tracks them in a [`ClientRegistry`].

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};

use super::registry::ClientRegistry;
use super::websocket::ws_handler;

/// Bound reload channel listener.
pub struct ReloadServer {
    listener: TcpListener,
    registry: Arc<ClientRegistry>,
}

impl ReloadServer {
    /// Bind the listener. Connections are accepted once serving starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            registry: Arc::new(ClientRegistry::new()),
        })
    }

    /// Address actually bound (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The live client set, shared with notifiers.
    #[must_use]
    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accept reload clients until the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn serve(self) -> io::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept reload clients until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(address = %addr, "Reload channel listening");
        }

        let app = Router::new().fallback(ws_handler).with_state(self.registry);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
