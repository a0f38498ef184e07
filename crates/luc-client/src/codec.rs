//! Payload codecs.
//!
//! The relay moves payloads as opaque strings on a single line. Clients
//! encode before sending and decode after receiving; a codec that encrypts
//! gives end-to-end confidentiality without the relay's involvement.

use luc_core::{LucError, LucResult};

/// Turns plaintext bytes into a line-safe token and back.
pub trait PayloadCodec: Send + Sync {
    /// Encode plaintext into a token with no line breaks.
    fn encode(&self, plaintext: &[u8]) -> String;

    /// Decode a token produced by `encode`.
    fn decode(&self, token: &str) -> LucResult<Vec<u8>>;
}

/// Lowercase hex. Line-safe, no secrecy.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexCodec;

impl PayloadCodec for HexCodec {
    fn encode(&self, plaintext: &[u8]) -> String {
        hex::encode(plaintext)
    }

    fn decode(&self, token: &str) -> LucResult<Vec<u8>> {
        hex::decode(token.trim()).map_err(|e| LucError::Codec(format!("invalid hex payload: {e}")))
    }
}
