use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Data, Env, Format as _, Json, Toml, Yaml};
use figment::Figment;
use rvlink::channel::serial::SerialConfig;
use rvlink::registers::DEFAULT_BASE_ADDRESS;
use rvlink::suite::SuiteConfig;
use rvlink::PulseTiming;
use serde::{Deserialize, Serialize};

/// Settings for the board side of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Physical address of the register window.
    pub register_base: u64,
    /// Device file used to map physical memory.
    pub mem_device: PathBuf,
    /// Time the write strobe stays high, in microseconds.
    pub settle_us: u64,
    /// Time after the strobe falls before the next access, in microseconds.
    pub setup_us: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            register_base: DEFAULT_BASE_ADDRESS,
            mem_device: PathBuf::from("/dev/mem"),
            settle_us: 1,
            setup_us: 1,
        }
    }
}

impl BridgeConfig {
    pub fn timing(&self) -> PulseTiming {
        PulseTiming::new(
            Duration::from_micros(self.settle_us),
            Duration::from_micros(self.setup_us),
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub serial: SerialConfig,
    pub bridge: BridgeConfig,
    pub suite: SuiteConfig,
}

/// Prefix of environment variables overriding the configuration files,
/// e.g. `RVLINK_SERIAL__PORT=/dev/ttyUSB1`.
const ENV_PREFIX: &str = "RVLINK_";

pub fn load_config() -> anyhow::Result<Config> {
    // Paths to search for the configuration file.
    let mut paths = vec![PathBuf::from(".")];
    if let Some(home) = directories::UserDirs::new().map(|user| user.home_dir().to_path_buf()) {
        paths.push(home);
    }

    let config = figment_for(&paths)?
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Defaults merged with the `.rvlink.*` files found in `paths`, earlier paths winning.
fn figment_for(paths: &[PathBuf]) -> anyhow::Result<Figment> {
    // Files to search for, without extension.
    let files = [".rvlink"];

    let default_config = serde_json::to_string_pretty(&Config::default())?;
    let mut figment = Figment::from(Data::<Json>::string(&default_config));
    for path in paths.iter().rev() {
        for file in files {
            figment = merge_files(figment, path, file);
        }
    }
    Ok(figment)
}

fn merge_files(figment: Figment, dir: &Path, file: &str) -> Figment {
    figment
        .merge(Toml::file(dir.join(format!("{file}.toml"))))
        .merge(Json::file(dir.join(format!("{file}.json"))))
        .merge(Yaml::file(dir.join(format!("{file}.yaml"))))
        .merge(Yaml::file(dir.join(format!("{file}.yml"))))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = figment_for(&[dir.path().to_path_buf()])
            .unwrap()
            .extract()
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bridge.register_base, 0x43C0_0000);
    }

    #[test]
    fn files_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".rvlink.toml"),
            r#"
            [serial]
            port = "/dev/ttyUSB1"

            [suite]
            run_delay_ms = 250
            "#,
        )
        .unwrap();

        let config: Config = figment_for(&[dir.path().to_path_buf()])
            .unwrap()
            .extract()
            .unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.suite.run_delay_ms, 250);
        assert_eq!(config.suite.verify_address, 0x2000);
    }

    #[test]
    fn working_directory_wins_over_home() {
        let cwd = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        std::fs::write(cwd.path().join(".rvlink.yaml"), "bridge:\n  settle_us: 5\n").unwrap();
        std::fs::write(
            home.path().join(".rvlink.json"),
            r#"{ "bridge": { "settle_us": 9, "setup_us": 3 } }"#,
        )
        .unwrap();

        let config: Config = figment_for(&[cwd.path().to_path_buf(), home.path().to_path_buf()])
            .unwrap()
            .extract()
            .unwrap();
        assert_eq!(config.bridge.settle_us, 5);
        assert_eq!(config.bridge.setup_us, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".rvlink.toml"), "[serial]\nbaud = 9600\n").unwrap();

        let result: Result<Config, _> = figment_for(&[dir.path().to_path_buf()])
            .unwrap()
            .extract();
        assert!(result.is_err());
    }
}
