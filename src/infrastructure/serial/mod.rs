// Serial module - Opening and enumerating physical serial ports
pub mod port;

pub use port::{available_ports, open_port, PortSummary};
