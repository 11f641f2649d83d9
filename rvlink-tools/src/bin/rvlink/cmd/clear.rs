use crate::config::Config;
use crate::util::common_options::SerialOptions;
use crate::util::parse_u32;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    serial: SerialOptions,

    /// First address to clear. Defaults to the suite's program start.
    #[clap(value_parser = parse_u32)]
    start: Option<u32>,

    /// Number of bytes to clear. Defaults to the suite's clear size.
    #[clap(value_parser = parse_u32)]
    length: Option<u32>,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let start = self.start.unwrap_or(config.suite.program_start);
        let length = self.length.unwrap_or(config.suite.clear_bytes);

        let mut client = self.serial.connect(&config.serial)?;
        let words = client.clear_memory(start, length)?;

        println!("Cleared {words} words from {start:#010x}");
        Ok(())
    }
}
