//! luc-server: relay server for the LUC messaging protocol.
//!
//! Accepts TCP connections, admits at most `max_clients` of them at a time
//! (queued clients are sent `WAIT:<seconds>` until a slot frees), binds each
//! admitted connection to the identity it declares, and relays opaque text
//! and file payloads between identities.

pub mod admission;
pub mod config;
pub mod relay;
pub mod server;
pub mod session;

pub use admission::{AdmissionController, AdmissionPermit};
pub use config::ServerConfig;
pub use relay::{RelayDispatcher, RelayMessage, SessionHandle, SessionRegistry};
pub use server::RelayServer;
pub use session::{Outbound, Session, SessionContext};
