use thiserror::Error;

/// Serial relay unified error type
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to open serial device '{path}': {message}")]
    DeviceOpen { path: String, message: String },

    #[error("Device write failed: {message}")]
    DeviceWrite { message: String },

    #[error("Device read failed: {message}")]
    DeviceRead { message: String },

    #[error("Device not open (state: {state})")]
    DeviceNotOpen { state: String },

    #[error("Device operation timed out")]
    Timeout,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type RelayResult<T> = Result<T, RelayError>;
