//! Identity-routed relay: session registry and dispatcher.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{RelayDispatcher, RelayMessage};
pub use registry::{SessionHandle, SessionRegistry};
