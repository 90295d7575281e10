//! JSON events exchanged over a client WebSocket.
//!
//! ```json
//! {"event":"serial-data","data":"12.5"}
//! {"event":"send-json","data":"LED:ON"}
//! ```

use crate::domain::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};

/// Server -> client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// One line from the device, already trimmed
    #[serde(rename = "serial-data")]
    SerialData(String),
}

/// Client -> server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Text forwarded to the device verbatim; no JSON validation of the payload
    #[serde(rename = "send-json")]
    SendJson(String),
}

impl ServerEvent {
    pub fn to_text(&self) -> RelayResult<String> {
        serde_json::to_string(self).map_err(|e| RelayError::Protocol(e.to_string()))
    }
}

impl ClientEvent {
    pub fn parse(text: &str) -> RelayResult<Self> {
        serde_json::from_str(text).map_err(|e| RelayError::Protocol(e.to_string()))
    }
}
