//! Session lifecycle: the per-connection worker and its outbound writer.

pub mod outbound;
pub mod worker;

pub use outbound::Outbound;
pub use worker::{serve_connection, Session, SessionContext};
