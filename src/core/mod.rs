// Core module - Framing, device link, client registry and relay coordinator
pub mod device;
pub mod framing;
pub mod registry;
pub mod relay;

pub use device::{DeviceLink, LinkState};
pub use framing::{encode_line, Line, LineFramer};
pub use registry::{BroadcastReport, ClientRegistry, ClientSession, SessionId, SessionInfo};
pub use relay::{CommandOutcome, Relay, RelayStatus};
