use anyhow::Context;
use rvlink::channel::serial::{open_serial, SerialChannel, SerialConfig};
use rvlink::BridgeClient;

use crate::util::parse_u64;

/// Which serial port to open and how fast.
///
/// Unset options fall back to the `[serial]` section of the configuration.
#[derive(clap::Parser, Debug, Default)]
pub struct PortOptions {
    /// Serial port connected to the bridge, e.g. `/dev/ttyUSB1` or `COM4`
    #[clap(long, short, help_heading = "SERIAL CONFIGURATION")]
    pub port: Option<String>,

    /// Line speed in baud
    #[clap(long, help_heading = "SERIAL CONFIGURATION")]
    pub baud: Option<u32>,
}

impl PortOptions {
    pub fn resolve(&self, config: &SerialConfig) -> SerialConfig {
        SerialConfig {
            port: self.port.clone().unwrap_or_else(|| config.port.clone()),
            baud_rate: self.baud.unwrap_or(config.baud_rate),
            ..config.clone()
        }
    }
}

/// Options of every command that talks to the bridge as a host.
#[derive(clap::Parser, Debug, Default)]
pub struct SerialOptions {
    #[clap(flatten)]
    pub port: PortOptions,

    /// How long to wait for a reply, in milliseconds
    #[clap(long, value_parser = parse_u64, help_heading = "SERIAL CONFIGURATION")]
    pub timeout_ms: Option<u64>,
}

impl SerialOptions {
    pub fn resolve(&self, config: &SerialConfig) -> SerialConfig {
        SerialConfig {
            response_timeout_ms: self.timeout_ms.unwrap_or(config.response_timeout_ms),
            ..self.port.resolve(config)
        }
    }

    /// Opens the port as a host with a reply deadline.
    pub fn connect(&self, config: &SerialConfig) -> anyhow::Result<BridgeClient<SerialChannel>> {
        let serial = self.resolve(config);
        let channel = open_serial(&serial)
            .with_context(|| format!("Failed to open serial port {}", serial.port))?
            .with_read_timeout(serial.response_timeout());
        Ok(BridgeClient::new(channel))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config() -> SerialConfig {
        SerialConfig {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            response_timeout_ms: 1000,
        }
    }

    #[test]
    fn unset_options_fall_back_to_config() {
        let options = SerialOptions {
            port: PortOptions {
                port: Some("/dev/ttyUSB1".to_string()),
                baud: None,
            },
            timeout_ms: Some(250),
        };

        assert_eq!(
            options.resolve(&config()),
            SerialConfig {
                port: "/dev/ttyUSB1".to_string(),
                baud_rate: 115_200,
                response_timeout_ms: 250,
            }
        );
        assert_eq!(SerialOptions::default().resolve(&config()), config());
    }

    #[test]
    fn port_options_keep_the_configured_timeout() {
        let options = PortOptions {
            port: None,
            baud: Some(9600),
        };

        let resolved = options.resolve(&config());
        assert_eq!(resolved.baud_rate, 9600);
        assert_eq!(resolved.response_timeout_ms, 1000);
    }
}
