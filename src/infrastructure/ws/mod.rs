// WebSocket module - Network boundary for relay clients
pub mod protocol;
pub mod server;
pub mod session;

pub use protocol::{ClientEvent, ServerEvent};
pub use server::RelayServer;
