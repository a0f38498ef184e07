//! The LUC relay client.
//!
//! `RelayClient` handles the connection lifecycle: wait out admission,
//! declare the identity, then send and receive relayed payloads. The two
//! directions can be split apart and driven from separate tasks.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use luc_core::{check_field, check_payload, ClientLine, LucError, LucResult, ServerLine};

use crate::codec::{HexCodec, PayloadCodec};

/// Configuration for connecting to a relay.
#[derive(Clone)]
pub struct ConnectConfig {
    /// Identity to declare once admitted.
    pub identity: String,
    /// Codec applied to every outgoing and incoming payload.
    pub codec: Arc<dyn PayloadCodec>,
}

impl ConnectConfig {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            codec: Arc::new(HexCodec),
        }
    }

    /// Replace the payload codec.
    pub fn with_codec(mut self, codec: Arc<dyn PayloadCodec>) -> Self {
        self.codec = codec;
        self
    }
}

impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// A payload relayed to us, already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text { from: String, body: String },
    File {
        from: String,
        filename: String,
        data: Vec<u8>,
    },
}

/// A connected, admitted, identified relay client.
pub struct RelayClient {
    sender: RelaySender,
    receiver: RelayReceiver,
}

impl RelayClient {
    /// Connect, wait for admission, and declare `config.identity`.
    ///
    /// `on_wait` is called with the elapsed seconds of every `WAIT:` line the
    /// relay sends while all slots are taken.
    pub async fn connect<A, F>(addr: A, config: ConnectConfig, mut on_wait: F) -> LucResult<Self>
    where
        A: ToSocketAddrs,
        F: FnMut(u64),
    {
        check_field("identity", &config.identity)?;

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| LucError::Transport(format!("connect failed: {e}")))?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        loop {
            let line = lines.next_line().await?.ok_or(LucError::Closed)?;
            match ServerLine::parse(&line) {
                Some(ServerLine::Wait(secs)) => {
                    debug!(secs, "relay at capacity, waiting");
                    on_wait(secs);
                }
                Some(ServerLine::Start) => break,
                _ => debug!(line = %line, "ignoring line during admission"),
            }
        }

        let mut sender = RelaySender {
            writer: write_half,
            codec: config.codec.clone(),
        };
        sender
            .write_line(&ClientLine::User(config.identity.clone()))
            .await?;
        info!(identity = %config.identity, "admitted by relay");

        Ok(Self {
            sender,
            receiver: RelayReceiver {
                lines,
                codec: config.codec,
            },
        })
    }

    /// Send a text message to `recipient`.
    pub async fn send_text(&mut self, recipient: &str, body: &str) -> LucResult<()> {
        self.sender.send_text(recipient, body).await
    }

    /// Send a file to `recipient`.
    pub async fn send_file(
        &mut self,
        recipient: &str,
        filename: &str,
        data: &[u8],
    ) -> LucResult<()> {
        self.sender.send_file(recipient, filename, data).await
    }

    /// Wait for the next relayed payload. `None` once the relay closes the connection.
    pub async fn recv(&mut self) -> LucResult<Option<Incoming>> {
        self.receiver.recv().await
    }

    /// Split into independently usable send and receive halves.
    pub fn into_split(self) -> (RelaySender, RelayReceiver) {
        (self.sender, self.receiver)
    }

    /// Close the connection.
    pub async fn disconnect(self) -> LucResult<()> {
        self.sender.close().await
    }
}

/// Write half of a relay connection.
pub struct RelaySender {
    writer: OwnedWriteHalf,
    codec: Arc<dyn PayloadCodec>,
}

impl RelaySender {
    /// Encode `body` and send it to `recipient`.
    pub async fn send_text(&mut self, recipient: &str, body: &str) -> LucResult<()> {
        check_field("recipient", recipient)?;
        let payload = self.codec.encode(body.as_bytes());
        check_payload(&payload)?;
        self.write_line(&ClientLine::To {
            recipient: recipient.to_string(),
            payload,
        })
        .await
    }

    /// Encode `data` and send it to `recipient` as `filename`.
    pub async fn send_file(
        &mut self,
        recipient: &str,
        filename: &str,
        data: &[u8],
    ) -> LucResult<()> {
        check_field("recipient", recipient)?;
        check_field("filename", filename)?;
        let payload = self.codec.encode(data);
        check_payload(&payload)?;
        self.write_line(&ClientLine::File {
            recipient: recipient.to_string(),
            filename: filename.to_string(),
            payload,
        })
        .await?;
        debug!(recipient = %recipient, filename = %filename, bytes = data.len(), "file sent");
        Ok(())
    }

    /// Half-close the connection; the relay ends the session.
    pub async fn close(mut self) -> LucResult<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    async fn write_line(&mut self, line: &ClientLine) -> LucResult<()> {
        let frame = format!("{line}\n");
        self.writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| LucError::Transport(format!("write failed: {e}")))
    }
}

/// Read half of a relay connection.
pub struct RelayReceiver {
    lines: Lines<BufReader<OwnedReadHalf>>,
    codec: Arc<dyn PayloadCodec>,
}

impl RelayReceiver {
    /// Wait for the next relayed payload.
    ///
    /// Lines that cannot be parsed or decoded are skipped with a warning.
    /// Returns `None` once the relay closes the connection.
    pub async fn recv(&mut self) -> LucResult<Option<Incoming>> {
        while let Some(line) = self.lines.next_line().await? {
            match ServerLine::parse(&line) {
                Some(ServerLine::From { sender, payload }) => {
                    match self.decode_text(&payload) {
                        Ok(body) => return Ok(Some(Incoming::Text { from: sender, body })),
                        Err(e) => warn!(from = %sender, error = %e, "dropping undecodable message"),
                    }
                }
                Some(ServerLine::FileFrom {
                    sender,
                    filename,
                    payload,
                }) => match self.codec.decode(&payload) {
                    Ok(data) => {
                        return Ok(Some(Incoming::File {
                            from: sender,
                            filename,
                            data,
                        }))
                    }
                    Err(e) => warn!(
                        from = %sender,
                        filename = %filename,
                        error = %e,
                        "dropping undecodable file"
                    ),
                },
                _ => debug!(line = %line, "ignoring unexpected line"),
            }
        }
        Ok(None)
    }

    fn decode_text(&self, payload: &str) -> LucResult<String> {
        let bytes = self.codec.decode(payload)?;
        String::from_utf8(bytes).map_err(|e| LucError::Codec(format!("message is not UTF-8: {e}")))
    }
}
