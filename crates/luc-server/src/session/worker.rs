//! Per-connection session worker.
//!
//! Drives one connection from admission to teardown: wait for a slot,
//! read the identity line, register, then relay every routing request the
//! client sends until the stream ends or fails.

use luc_core::{ClientLine, LucResult};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader, Lines};
use tracing::{debug, info, warn};

use super::outbound::Outbound;
use crate::admission::{AdmissionController, AdmissionPermit};
use crate::relay::{RelayDispatcher, RelayMessage, SessionRegistry};

/// Shared state every session worker is handed at construction.
pub struct SessionContext {
    pub admission: AdmissionController,
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: RelayDispatcher,
}

impl SessionContext {
    pub fn new(admission: AdmissionController) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = RelayDispatcher::new(registry.clone());
        Self {
            admission,
            registry,
            dispatcher,
        }
    }
}

/// An admitted connection.
pub struct Session<R> {
    conn_id: u64,
    remote: SocketAddr,
    /// Empty until the identity line is read, and stays empty if that line
    /// was not a `USER:` declaration.
    identity: String,
    registered: bool,
    lines: Lines<BufReader<R>>,
    outbound: Outbound,
    ctx: Arc<SessionContext>,
    /// Held for the life of the session; released on drop.
    _permit: AdmissionPermit,
}

impl<R> Session<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(
        reader: R,
        outbound: Outbound,
        remote: SocketAddr,
        permit: AdmissionPermit,
        ctx: Arc<SessionContext>,
    ) -> Self {
        Self {
            conn_id: ctx.registry.next_conn_id(),
            remote,
            identity: String::new(),
            registered: false,
            lines: BufReader::new(reader).lines(),
            outbound,
            ctx,
            _permit: permit,
        }
    }

    /// Run until the client disconnects or the connection fails.
    pub async fn run(mut self) {
        match self.identify().await {
            Ok(true) => {
                if let Err(e) = self.read_loop().await {
                    debug!(conn_id = self.conn_id, error = %e, "session read failed");
                }
            }
            Ok(false) => {
                debug!(conn_id = self.conn_id, "connection closed before identity line");
            }
            Err(e) => {
                debug!(conn_id = self.conn_id, error = %e, "failed to read identity line");
            }
        }
        self.terminate().await;
    }

    /// Consume the first line as the identity declaration.
    ///
    /// Returns `false` if the stream ended first.
    async fn identify(&mut self) -> LucResult<bool> {
        let Some(line) = self.lines.next_line().await? else {
            return Ok(false);
        };

        match ClientLine::parse(&line) {
            Some(ClientLine::User(identity)) => {
                if identity.is_empty() {
                    warn!(conn_id = self.conn_id, remote = %self.remote, "empty identity declared");
                }
                self.identity = identity;
                self.ctx
                    .registry
                    .register(self.identity.clone(), self.conn_id, self.outbound.clone())
                    .await;
                self.registered = true;
                info!(
                    identity = %self.identity,
                    conn_id = self.conn_id,
                    remote = %self.remote,
                    "client connected"
                );
            }
            _ => {
                warn!(
                    conn_id = self.conn_id,
                    remote = %self.remote,
                    "first line was not an identity declaration, session will not be reachable"
                );
            }
        }
        Ok(true)
    }

    async fn read_loop(&mut self) -> LucResult<()> {
        while let Some(line) = self.lines.next_line().await? {
            self.handle_line(&line).await;
        }
        Ok(())
    }

    async fn handle_line(&self, line: &str) {
        match ClientLine::parse(line) {
            Some(ClientLine::User(_)) => {
                debug!(identity = %self.identity, "ignoring repeated identity line");
            }
            Some(request) => {
                if let Some(message) = RelayMessage::from_client_line(request) {
                    self.ctx.dispatcher.relay(&self.identity, message).await;
                }
            }
            None => {
                debug!(identity = %self.identity, len = line.len(), "ignoring unrecognised line");
            }
        }
    }

    async fn terminate(self) {
        if self.registered {
            self.ctx
                .registry
                .unregister(&self.identity, self.conn_id)
                .await;
        }
        self.outbound.shutdown().await;
        info!(identity = %self.identity, conn_id = self.conn_id, "client disconnected");
    }
}

/// Serve one accepted connection through admission and its session.
pub async fn serve_connection<S>(stream: S, remote: SocketAddr, ctx: Arc<SessionContext>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let accepted_at = Instant::now();
    let (reader, writer) = tokio::io::split(stream);
    let outbound = Outbound::new(writer);

    let permit = match ctx.admission.admit(&outbound, accepted_at).await {
        Ok(permit) => permit,
        Err(e) => {
            debug!(remote = %remote, error = %e, "client left while waiting for admission");
            return;
        }
    };
    info!(
        remote = %remote,
        waited_secs = accepted_at.elapsed().as_secs(),
        available = ctx.admission.available(),
        "client admitted"
    );

    Session::new(reader, outbound, remote, permit, ctx).run().await;
}
