//! Relay dispatcher: routes payloads between sessions by identity.
//!
//! Delivery is at-most-once and fire-and-forget. A missing recipient or a
//! failed write is reported to the caller as `false` and never surfaces on
//! the sender's connection.

use super::registry::SessionRegistry;
use luc_core::{ClientLine, ServerLine};
use std::sync::Arc;
use tracing::debug;

/// A payload on its way from one session to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    Text {
        recipient: String,
        payload: String,
    },
    File {
        recipient: String,
        filename: String,
        payload: String,
    },
}

impl RelayMessage {
    /// Convert a routing request from a client. Identity lines are not routable.
    pub fn from_client_line(line: ClientLine) -> Option<Self> {
        match line {
            ClientLine::To { recipient, payload } => Some(Self::Text { recipient, payload }),
            ClientLine::File {
                recipient,
                filename,
                payload,
            } => Some(Self::File {
                recipient,
                filename,
                payload,
            }),
            ClientLine::User(_) => None,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Self::Text { recipient, .. } | Self::File { recipient, .. } => recipient,
        }
    }

    /// The line the recipient receives.
    pub fn into_delivery(self, sender: &str) -> ServerLine {
        match self {
            Self::Text { payload, .. } => ServerLine::From {
                sender: sender.to_string(),
                payload,
            },
            Self::File {
                filename, payload, ..
            } => ServerLine::FileFrom {
                sender: sender.to_string(),
                filename,
                payload,
            },
        }
    }
}

/// Routes relay messages to registered sessions.
pub struct RelayDispatcher {
    registry: Arc<SessionRegistry>,
}

impl RelayDispatcher {
    /// Create a new dispatcher backed by a session registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Forward `message` from `sender` to its recipient.
    ///
    /// Returns `true` only if the reframed line was written to the
    /// recipient's connection.
    pub async fn relay(&self, sender: &str, message: RelayMessage) -> bool {
        let Some(target) = self.registry.lookup(message.recipient()).await else {
            debug!(
                sender = %sender,
                recipient = %message.recipient(),
                "recipient not online, dropping message"
            );
            return false;
        };

        let line = message.into_delivery(sender).to_string();
        match target.outbound.send_line(&line).await {
            Ok(()) => {
                debug!(
                    sender = %sender,
                    recipient = %target.identity,
                    conn_id = target.conn_id,
                    "message relayed"
                );
                true
            }
            Err(e) => {
                debug!(
                    sender = %sender,
                    recipient = %target.identity,
                    conn_id = target.conn_id,
                    error = %e,
                    "relay write failed, dropping message"
                );
                false
            }
        }
    }
}
