use crate::domain::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serial relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Network listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Serial device settings
    #[serde(default)]
    pub device: DeviceConfig,
    /// Queue sizes and timeouts
    #[serde(default)]
    pub relay: RelayTuning,
}

/// HTTP / WebSocket listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Serial endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Serial port path
    #[serde(default = "default_device_path")]
    pub path: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default)]
    pub parity: ParityConfig,
    #[serde(default)]
    pub flow_control: FlowControlConfig,
    /// Poll interval of the blocking reader, in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

/// Parity configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParityConfig {
    #[default]
    None,
    Odd,
    Even,
}

/// Flow control configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlConfig {
    #[default]
    None,
    Hardware,
    Software,
}

/// Relay queue sizes and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayTuning {
    /// Per-client outbound queue depth; lines beyond it are dropped for that client
    #[serde(default = "default_client_queue_capacity")]
    pub client_queue_capacity: usize,
    /// Lines buffered between the device reader and the coordinator
    #[serde(default = "default_line_queue_capacity")]
    pub line_queue_capacity: usize,
    /// Commands waiting for the device writer
    #[serde(default = "default_write_queue_capacity")]
    pub write_queue_capacity: usize,
    /// Upper bound for a single `send`, in milliseconds
    #[serde(default = "default_write_timeout")]
    pub write_timeout_ms: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_device_path() -> String {
    if cfg!(windows) {
        "COM4".to_string()
    } else {
        "/dev/ttyACM0".to_string()
    }
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

fn default_read_timeout() -> u64 {
    100
}

fn default_client_queue_capacity() -> usize {
    64
}

fn default_line_queue_capacity() -> usize {
    256
}

fn default_write_queue_capacity() -> usize {
    32
}

fn default_write_timeout() -> u64 {
    2000
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            device: DeviceConfig::default(),
            relay: RelayTuning::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: default_device_path(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: ParityConfig::default(),
            flow_control: FlowControlConfig::default(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

impl Default for RelayTuning {
    fn default() -> Self {
        Self {
            client_queue_capacity: default_client_queue_capacity(),
            line_queue_capacity: default_line_queue_capacity(),
            write_queue_capacity: default_write_queue_capacity(),
            write_timeout_ms: default_write_timeout(),
        }
    }
}

impl ServerConfig {
    /// `bind_address:port` as a listener address string
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl DeviceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl RelayTuning {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl RelayConfig {
    /// Reject values the serial driver or the channels cannot work with
    pub fn validate(&self) -> RelayResult<()> {
        let invalid = |message: String| Err(RelayError::Config { message });

        if self.device.path.trim().is_empty() {
            return invalid("Device path must not be empty".to_string());
        }
        if self.device.baud_rate == 0 {
            return invalid("Baud rate must be greater than zero".to_string());
        }
        if !(5..=8).contains(&self.device.data_bits) {
            return invalid(format!("Invalid data bits: {}", self.device.data_bits));
        }
        if !(1..=2).contains(&self.device.stop_bits) {
            return invalid(format!("Invalid stop bits: {}", self.device.stop_bits));
        }
        if self.device.read_timeout_ms == 0 {
            return invalid("Read timeout must be greater than zero".to_string());
        }
        if self.relay.client_queue_capacity == 0
            || self.relay.line_queue_capacity == 0
            || self.relay.write_queue_capacity == 0
        {
            return invalid("Queue capacities must be greater than zero".to_string());
        }
        if self.relay.write_timeout_ms == 0 {
            return invalid("Write timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}
