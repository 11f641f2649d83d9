mod cmd;
mod config;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{load_config, Config};
use crate::util::logging::{setup_logging, LevelFilter};

#[derive(clap::Parser)]
#[clap(
    name = "rvlink",
    about = "Load, run and inspect a RISC-V core behind a serial command bridge",
    version = env!("RVLINK_VERSION"),
    long_version = env!("RVLINK_LONG_VERSION")
)]
struct Cli {
    /// Location for log file
    ///
    /// The file receives every event in JSON format, regardless of `--log-level`.
    #[clap(long, global = true, help_heading = "LOG CONFIGURATION")]
    log_file: Option<PathBuf>,

    /// Log level for terminal output. Falls back to `RUST_LOG`, then WARN.
    #[clap(long, global = true, value_enum, help_heading = "LOG CONFIGURATION")]
    log_level: Option<LevelFilter>,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

impl Cli {
    fn run(self, config: Config) -> Result<()> {
        match self.subcommand {
            Subcommand::Serve(cmd) => cmd.run(&config),
            Subcommand::List(cmd) => cmd.run(),
            Subcommand::Reset(cmd) => cmd.run(&config),
            Subcommand::Run(cmd) => cmd.run(&config),
            Subcommand::Load(cmd) => cmd.run(&config),
            Subcommand::Verify(cmd) => cmd.run(&config),
            Subcommand::Clear(cmd) => cmd.run(&config),
            Subcommand::Program(cmd) => cmd.run(&config),
            Subcommand::TestSuite(cmd) => cmd.run(&config),
        }
    }
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// Serve the bridge protocol on a serial port (runs on the board)
    Serve(cmd::serve::Cmd),
    /// List the serial ports of this machine
    List(cmd::list::Cmd),
    /// Hold the core in reset
    Reset(cmd::reset::Cmd),
    /// Release the core from reset
    Run(cmd::run::Cmd),
    /// Write a single word into the core's memory
    Load(cmd::load::Cmd),
    /// Read back a single word from the core's memory
    Verify(cmd::verify::Cmd),
    /// Fill a memory range with NOP instructions
    Clear(cmd::clear::Cmd),
    /// Load a hex program file
    Program(cmd::program::Cmd),
    /// Run every program of a test suite and compare the results
    TestSuite(cmd::test_suite::Cmd),
}

fn main() -> Result<()> {
    let config = load_config().context("Failed to load configuration.")?;

    let matches = Cli::parse();

    let _logger_guard = setup_logging(matches.log_file.as_deref(), matches.log_level)?;

    matches.run(config)
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "rvlink",
            "verify",
            "0x2000",
            "--log-level",
            "DEBUG",
            "--port",
            "/dev/ttyUSB1",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LevelFilter::Debug));
        assert!(matches!(cli.subcommand, Subcommand::Verify(_)));
    }
}
