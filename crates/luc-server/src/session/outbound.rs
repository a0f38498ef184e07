//! Shared write half of a client connection.
//!
//! The owning session writes admission lines through it; other sessions
//! write relayed lines through the clone held in the registry. A mutex
//! keeps concurrent writers from interleaving partial lines.

use luc_core::{LucError, LucResult};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Cloneable handle to a connection's outbound byte stream.
#[derive(Clone)]
pub struct Outbound {
    writer: Arc<Mutex<BoxedWriter>>,
}

impl Outbound {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write one line, appending the newline terminator, and flush.
    pub async fn send_line(&self, line: &str) -> LucResult<()> {
        let mut frame = String::with_capacity(line.len() + 1);
        frame.push_str(line);
        frame.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| LucError::Transport(format!("write failed: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| LucError::Transport(format!("flush failed: {e}")))
    }

    /// Close the write side. Errors are ignored; the peer may already be gone.
    pub async fn shutdown(&self) {
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

impl std::fmt::Debug for Outbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbound").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn lines_are_newline_terminated() {
        let (client, server) = tokio::io::duplex(1024);
        let outbound = Outbound::new(server);
        outbound.send_line("START").await.unwrap();
        outbound.send_line("FROM:alice:hi").await.unwrap();

        let mut lines = BufReader::new(client).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("START"));
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("FROM:alice:hi")
        );
    }

    #[tokio::test]
    async fn write_to_dropped_peer_fails() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        let outbound = Outbound::new(server);
        assert!(outbound.send_line("START").await.is_err());
    }
}
