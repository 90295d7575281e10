use crate::domain::{
    config::{DeviceConfig, FlowControlConfig, ParityConfig},
    error::{RelayError, RelayResult},
};
use serialport::SerialPort;
use std::io::{Read, Write};
use tracing::{debug, info};

/// Independent read and write halves of one serial connection
pub type PortHalves = (Box<dyn Read + Send>, Box<dyn Write + Send>);

/// Open the configured serial endpoint and split it into read/write handles
pub fn open_port(config: &DeviceConfig) -> RelayResult<PortHalves> {
    let open_error = |message: String| RelayError::DeviceOpen {
        path: config.path.clone(),
        message,
    };

    let builder = serialport::new(&config.path, config.baud_rate)
        .data_bits(match config.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            other => return Err(open_error(format!("Invalid data bits: {}", other))),
        })
        .stop_bits(match config.stop_bits {
            1 => serialport::StopBits::One,
            2 => serialport::StopBits::Two,
            other => return Err(open_error(format!("Invalid stop bits: {}", other))),
        })
        .parity(match config.parity {
            ParityConfig::None => serialport::Parity::None,
            ParityConfig::Even => serialport::Parity::Even,
            ParityConfig::Odd => serialport::Parity::Odd,
        })
        .flow_control(match config.flow_control {
            FlowControlConfig::None => serialport::FlowControl::None,
            FlowControlConfig::Software => serialport::FlowControl::Software,
            FlowControlConfig::Hardware => serialport::FlowControl::Hardware,
        })
        .timeout(config.read_timeout());

    let port: Box<dyn SerialPort> = builder.open().map_err(|e| open_error(e.to_string()))?;
    let writer = port
        .try_clone()
        .map_err(|e| open_error(format!("Failed to clone port handle: {}", e)))?;

    info!(path = %config.path, baud_rate = config.baud_rate, "Serial port opened");

    Ok((Box::new(port), Box::new(writer)))
}

/// One row of the `ports` listing
#[derive(Debug, Clone, tabled::Tabled)]
pub struct PortSummary {
    #[tabled(rename = "Port")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

/// Enumerate serial ports known to the OS
pub fn available_ports() -> RelayResult<Vec<PortSummary>> {
    let ports = serialport::available_ports().map_err(|e| RelayError::Config {
        message: format!("Failed to enumerate serial ports: {}", e),
    })?;
    debug!("Found {} serial ports", ports.len());

    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, description) = match port.port_type {
                serialport::SerialPortType::UsbPort(usb) => (
                    "usb".to_string(),
                    format!(
                        "{:04x}:{:04x} {}",
                        usb.vid,
                        usb.pid,
                        usb.product.unwrap_or_default()
                    ),
                ),
                serialport::SerialPortType::PciPort => ("pci".to_string(), String::new()),
                serialport::SerialPortType::BluetoothPort => {
                    ("bluetooth".to_string(), String::new())
                }
                serialport::SerialPortType::Unknown => ("unknown".to_string(), String::new()),
            };
            PortSummary {
                name: port.port_name,
                kind,
                description: description.trim().to_string(),
            }
        })
        .collect())
}
