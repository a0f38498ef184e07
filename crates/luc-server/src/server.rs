//! Core server: accepts TCP connections and hands each to its own session task.

use crate::admission::AdmissionController;
use crate::config::ServerConfig;
use crate::relay::SessionRegistry;
use crate::session::{serve_connection, SessionContext};
use luc_core::{LucError, LucResult};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The relay server instance.
pub struct RelayServer {
    listener: TcpListener,
    ctx: Arc<SessionContext>,
}

impl RelayServer {
    /// Bind the listening socket described by `config`.
    pub async fn bind(config: &ServerConfig) -> LucResult<Self> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| LucError::Transport(format!("bind {addr} failed: {e}")))?;

        let admission = AdmissionController::new(config.max_clients, config.wait_interval);
        let ctx = Arc::new(SessionContext::new(admission));

        Ok(Self { listener, ctx })
    }

    /// Address actually bound (useful when the configured port is 0).
    pub fn local_addr(&self) -> LucResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared registry, for inspecting who is online.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.ctx.registry.clone()
    }

    /// Accept connections forever.
    pub async fn run(self) -> LucResult<()> {
        info!(
            addr = %self.local_addr()?,
            max_clients = self.ctx.admission.capacity(),
            "luc-server ready"
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, remote)) => {
                    debug!(remote = %remote, "connection accepted");
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(remote = %remote, error = %e, "failed to set TCP_NODELAY");
                    }
                    tokio::spawn(serve_connection(stream, remote, self.ctx.clone()));
                }
                Err(e) => {
                    error!(error = %e, "TCP accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}
