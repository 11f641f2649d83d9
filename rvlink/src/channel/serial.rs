//! Serial line transport.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

use super::IoChannel;
use crate::Error;

/// Baud rate used by the bridge firmware.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// How long a host waits for a reply before giving up.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// How long a single driver-level read may block before it is retried.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A serial port handle as returned by [`open_serial`].
pub type SerialChannel = IoChannel<Box<dyn SerialPort>>;

/// Serial line settings. Framing is always 8N1 without flow control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    /// Device path or port name, e.g. `/dev/ttyUSB1` or `COM4`.
    pub port: String,
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Reply deadline for host-side commands, in milliseconds.
    pub response_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl SerialConfig {
    /// Default settings for `port`.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Default::default()
        }
    }

    /// The reply deadline as a [`Duration`].
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

fn default_port() -> &'static str {
    if cfg!(windows) {
        "COM4"
    } else {
        "/dev/ttyUSB0"
    }
}

/// Opens a serial port as a blocking [`ByteChannel`](super::ByteChannel).
///
/// The returned channel has no read deadline. Host tools should add one with
/// [`IoChannel::with_read_timeout`].
pub fn open_serial(config: &SerialConfig) -> Result<SerialChannel, Error> {
    tracing::debug!(
        "Opening serial port {} at {} baud",
        config.port,
        config.baud_rate
    );

    let port = serialport::new(&config.port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(POLL_INTERVAL)
        .open()?;

    Ok(IoChannel::new(port))
}

/// A serial port found on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Name to pass to [`SerialConfig::new`].
    pub name: String,
    /// Product string for USB adapters.
    pub description: Option<String>,
}

/// Lists the serial ports the operating system knows about.
pub fn list_ports() -> Result<Vec<PortInfo>, Error> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        // Only report /dev/cu.* on macos, each port also shows up as /dev/tty.*
        .filter(|port| !cfg!(target_os = "macos") || port.port_name.contains("/cu."))
        .map(|port| PortInfo {
            description: match port.port_type {
                SerialPortType::UsbPort(info) => info.product,
                _ => None,
            },
            name: port.port_name,
        })
        .collect())
}
