//! luc-client: Rust client library for the LUC relay.
//!
//! Connects over TCP, waits out the relay's admission queue, declares an
//! identity, and exchanges codec-encoded text and file payloads with other
//! identities.
//!
//! # Quick Start
//!
//! ```no_run
//! use luc_client::{ConnectConfig, Incoming, RelayClient};
//!
//! # async fn example() -> luc_client::LucResult<()> {
//! let mut client = RelayClient::connect("127.0.0.1:12345", ConnectConfig::new("alice"), |secs| {
//!     eprintln!("waiting for a free slot ({secs}s)");
//! })
//! .await?;
//!
//! client.send_text("bob", "hello").await?;
//! if let Some(Incoming::Text { from, body }) = client.recv().await? {
//!     println!("{from}: {body}");
//! }
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;

// Re-export primary public types.
pub use client::{ConnectConfig, Incoming, RelayClient, RelayReceiver, RelaySender};
pub use codec::{HexCodec, PayloadCodec};

// Re-export luc-core error types for convenience.
pub use luc_core::{LucError, LucResult};
