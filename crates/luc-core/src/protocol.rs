//! Line framing for the LUC relay protocol.
//!
//! Every message is one newline-terminated UTF-8 line whose fields are
//! separated by `:`. The last field of a line is taken verbatim, so payloads
//! may contain colons; every other field must not.
//!
//! Client → server: `USER:<identity>`, `TO:<recipient>:<payload>`,
//! `FILE:<recipient>:<filename>:<payload>`.
//!
//! Server → client: `WAIT:<elapsedSeconds>`, `START`, `FROM:<sender>:<payload>`,
//! `FILEFROM:<sender>:<filename>:<payload>`.

use std::fmt;

use crate::error::{LucError, LucResult};

pub const USER_PREFIX: &str = "USER:";
pub const TO_PREFIX: &str = "TO:";
pub const FILE_PREFIX: &str = "FILE:";
pub const WAIT_PREFIX: &str = "WAIT:";
pub const START: &str = "START";
pub const FROM_PREFIX: &str = "FROM:";
pub const FILEFROM_PREFIX: &str = "FILEFROM:";

/// A line sent by a client to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine {
    /// Identity declaration. Only meaningful as the first line of a session.
    User(String),
    /// Opaque text payload for `recipient`.
    To { recipient: String, payload: String },
    /// Opaque file payload for `recipient`.
    File {
        recipient: String,
        filename: String,
        payload: String,
    },
}

impl ClientLine {
    /// Parse one inbound line (without its newline).
    ///
    /// Returns `None` for unknown prefixes and for lines with too few fields;
    /// the relay ignores those.
    pub fn parse(line: &str) -> Option<Self> {
        let line = strip_cr(line);
        if let Some(identity) = line.strip_prefix(USER_PREFIX) {
            return Some(Self::User(identity.trim().to_string()));
        }
        if line.starts_with(TO_PREFIX) {
            let mut parts = line.splitn(3, ':').skip(1);
            let recipient = parts.next()?;
            let payload = parts.next()?;
            return Some(Self::To {
                recipient: recipient.to_string(),
                payload: payload.to_string(),
            });
        }
        if line.starts_with(FILE_PREFIX) {
            let mut parts = line.splitn(4, ':').skip(1);
            let recipient = parts.next()?;
            let filename = parts.next()?;
            let payload = parts.next()?;
            return Some(Self::File {
                recipient: recipient.to_string(),
                filename: filename.to_string(),
                payload: payload.to_string(),
            });
        }
        None
    }
}

impl fmt::Display for ClientLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(identity) => write!(f, "{USER_PREFIX}{identity}"),
            Self::To { recipient, payload } => write!(f, "{TO_PREFIX}{recipient}:{payload}"),
            Self::File {
                recipient,
                filename,
                payload,
            } => write!(f, "{FILE_PREFIX}{recipient}:{filename}:{payload}"),
        }
    }
}

/// A line sent by the relay to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Still waiting for a free slot; seconds elapsed since the connection was accepted.
    Wait(u64),
    /// Admitted. The client must now declare its identity.
    Start,
    /// Relayed text payload.
    From { sender: String, payload: String },
    /// Relayed file payload.
    FileFrom {
        sender: String,
        filename: String,
        payload: String,
    },
}

impl ServerLine {
    /// Parse one line received from the relay.
    ///
    /// `WAIT:` accepts whitespace before the number (`WAIT: 3`).
    pub fn parse(line: &str) -> Option<Self> {
        let line = strip_cr(line);
        if let Some(secs) = line.strip_prefix(WAIT_PREFIX) {
            return secs.trim().parse().ok().map(Self::Wait);
        }
        if line.trim() == START {
            return Some(Self::Start);
        }
        if line.starts_with(FILEFROM_PREFIX) {
            let mut parts = line.splitn(4, ':').skip(1);
            let sender = parts.next()?;
            let filename = parts.next()?;
            let payload = parts.next()?;
            return Some(Self::FileFrom {
                sender: sender.to_string(),
                filename: filename.to_string(),
                payload: payload.to_string(),
            });
        }
        if line.starts_with(FROM_PREFIX) {
            let mut parts = line.splitn(3, ':').skip(1);
            let sender = parts.next()?;
            let payload = parts.next()?;
            return Some(Self::From {
                sender: sender.to_string(),
                payload: payload.to_string(),
            });
        }
        None
    }
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait(secs) => write!(f, "{WAIT_PREFIX}{secs}"),
            Self::Start => f.write_str(START),
            Self::From { sender, payload } => write!(f, "{FROM_PREFIX}{sender}:{payload}"),
            Self::FileFrom {
                sender,
                filename,
                payload,
            } => write!(f, "{FILEFROM_PREFIX}{sender}:{filename}:{payload}"),
        }
    }
}

/// Reject values that would break framing when placed in a non-final field.
pub fn check_field(name: &str, value: &str) -> LucResult<()> {
    if value.contains([':', '\n', '\r']) {
        return Err(LucError::Protocol(format!(
            "{name} must not contain ':' or line breaks: {value:?}"
        )));
    }
    Ok(())
}

/// Reject payloads that would break line framing.
pub fn check_payload(payload: &str) -> LucResult<()> {
    if payload.contains(['\n', '\r']) {
        return Err(LucError::Protocol(
            "payload must not contain line breaks".into(),
        ));
    }
    Ok(())
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_identity_is_trimmed() {
        assert_eq!(
            ClientLine::parse("USER:  alice "),
            Some(ClientLine::User("alice".into()))
        );
        assert_eq!(ClientLine::parse("USER:"), Some(ClientLine::User(String::new())));
    }

    #[test]
    fn to_keeps_colons_in_payload() {
        assert_eq!(
            ClientLine::parse("TO:bob:a:b::c"),
            Some(ClientLine::To {
                recipient: "bob".into(),
                payload: "a:b::c".into(),
            })
        );
    }

    #[test]
    fn to_allows_empty_payload() {
        assert_eq!(
            ClientLine::parse("TO:bob:"),
            Some(ClientLine::To {
                recipient: "bob".into(),
                payload: String::new(),
            })
        );
    }

    #[test]
    fn file_splits_on_first_three_colons() {
        assert_eq!(
            ClientLine::parse("FILE:bob:report.pdf:QUJD:REVG"),
            Some(ClientLine::File {
                recipient: "bob".into(),
                filename: "report.pdf".into(),
                payload: "QUJD:REVG".into(),
            })
        );
    }

    #[test]
    fn short_lines_are_rejected() {
        assert_eq!(ClientLine::parse("TO:bob"), None);
        assert_eq!(ClientLine::parse("FILE:bob:report.pdf"), None);
        assert_eq!(ClientLine::parse("FILE:bob"), None);
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        assert_eq!(ClientLine::parse("HELLO:bob:hi"), None);
        assert_eq!(ClientLine::parse(""), None);
        assert_eq!(ClientLine::parse("to:bob:hi"), None);
    }

    #[test]
    fn carriage_return_is_stripped() {
        assert_eq!(
            ClientLine::parse("TO:bob:hi\r"),
            Some(ClientLine::To {
                recipient: "bob".into(),
                payload: "hi".into(),
            })
        );
        assert_eq!(ServerLine::parse("START\r"), Some(ServerLine::Start));
    }

    #[test]
    fn client_line_formats_back_to_wire() {
        let line = ClientLine::File {
            recipient: "bob".into(),
            filename: "a.txt".into(),
            payload: "00ff".into(),
        };
        assert_eq!(line.to_string(), "FILE:bob:a.txt:00ff");
        assert_eq!(ClientLine::parse(&line.to_string()), Some(line));
    }

    #[test]
    fn wait_tolerates_space() {
        assert_eq!(ServerLine::parse("WAIT:4"), Some(ServerLine::Wait(4)));
        assert_eq!(ServerLine::parse("WAIT: 12"), Some(ServerLine::Wait(12)));
        assert_eq!(ServerLine::parse("WAIT:soon"), None);
    }

    #[test]
    fn filefrom_is_not_mistaken_for_from() {
        assert_eq!(
            ServerLine::parse("FILEFROM:alice:report.pdf:BASE64DATA"),
            Some(ServerLine::FileFrom {
                sender: "alice".into(),
                filename: "report.pdf".into(),
                payload: "BASE64DATA".into(),
            })
        );
        assert_eq!(
            ServerLine::parse("FROM:alice:x:y"),
            Some(ServerLine::From {
                sender: "alice".into(),
                payload: "x:y".into(),
            })
        );
    }

    #[test]
    fn server_line_formats() {
        assert_eq!(ServerLine::Wait(0).to_string(), "WAIT:0");
        assert_eq!(ServerLine::Start.to_string(), "START");
        assert_eq!(
            ServerLine::From {
                sender: "alice".into(),
                payload: "XYZ".into()
            }
            .to_string(),
            "FROM:alice:XYZ"
        );
    }

    #[test]
    fn field_checks() {
        assert!(check_field("recipient", "bob").is_ok());
        assert!(check_field("recipient", "b:ob").is_err());
        assert!(check_field("filename", "a\nb").is_err());
        assert!(check_payload("a:b").is_ok());
        assert!(check_payload("a\r\nb").is_err());
    }
}
