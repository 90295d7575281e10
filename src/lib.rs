//! Serial Relay Library
//!
//! Bridges a single serial-attached microcontroller to any number of
//! WebSocket clients: device lines are broadcast to every client and client
//! commands are written back to the device.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use domain::error::{RelayError, RelayResult};
pub use domain::config::RelayConfig;
pub use crate::core::{ClientRegistry, CommandOutcome, DeviceLink, Line, LineFramer, LinkState, Relay, SessionId};
pub use infrastructure::ws::RelayServer;
