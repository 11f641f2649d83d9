use anyhow::bail;

use crate::config::Config;
use crate::util::common_options::SerialOptions;
use crate::util::parse_u32;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    serial: SerialOptions,

    /// The address to read
    #[clap(value_parser = parse_u32)]
    address: u32,

    /// Fail unless the word read back equals this value
    #[clap(long, value_parser = parse_u32)]
    expect: Option<u32>,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut client = self.serial.connect(&config.serial)?;

        let value = client.verify(self.address)?;
        println!("{:#010x}: {value:#010x} ({value})", self.address);

        if let Some(expected) = self.expect {
            if value != expected {
                bail!("Expected {expected:#010x} ({expected}) at {:#010x}", self.address);
            }
        }

        Ok(())
    }
}
