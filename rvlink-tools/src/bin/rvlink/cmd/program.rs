use std::path::PathBuf;

use anyhow::Context;
use rvlink::program::Program;

use crate::config::Config;
use crate::util::common_options::SerialOptions;
use crate::util::parse_u32;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    serial: SerialOptions,

    /// Program file with one hex instruction word per line
    path: PathBuf,

    /// Address of the first word. Defaults to the suite's program start.
    #[clap(long, value_parser = parse_u32)]
    start: Option<u32>,

    /// Bytes to fill with NOPs before loading
    #[clap(long, value_parser = parse_u32)]
    clear: Option<u32>,

    /// Release the core from reset after loading
    #[clap(long)]
    run: bool,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let program = Program::from_file(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if program.is_empty() {
            tracing::warn!("{} holds no instructions", self.path.display());
        }
        let start = self.start.unwrap_or(config.suite.program_start);

        let mut client = self.serial.connect(&config.serial)?;

        client.reset()?;
        if let Some(length) = self.clear {
            client.clear_memory(start, length)?;
        }
        let words = client.load_program(&program, start)?;
        println!("Loaded {words} words at {start:#010x}");

        if self.run {
            client.run()?;
            println!("Core running");
        }

        Ok(())
    }
}
