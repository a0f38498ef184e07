//! luc-core: Shared protocol library for the LUC relay.
//!
//! Provides the colon-delimited line protocol spoken between clients and the
//! relay server, and the error type shared by every crate in the workspace.

pub mod error;
pub mod protocol;

// Re-export commonly used items at crate root.
pub use error::{LucError, LucResult};
pub use protocol::{check_field, check_payload, ClientLine, ServerLine};
