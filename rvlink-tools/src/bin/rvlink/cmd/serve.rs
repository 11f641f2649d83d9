use std::path::PathBuf;

use anyhow::Context;
use rvlink::channel::serial::open_serial;
use rvlink::{
    ByteChannel, CommandDispatcher, MmioRegisters, PulseTiming, RegisterInterface, SimulatedCore,
};

use crate::config::{BridgeConfig, Config};
use crate::util::common_options::PortOptions;
use crate::util::parse_u64;

#[derive(clap::Parser)]
pub struct Cmd {
    // The bridge waits for commands indefinitely, so there is no reply timeout.
    #[clap(flatten)]
    serial: PortOptions,

    /// Serve against an in-memory core instead of the register window
    #[clap(long)]
    simulate: bool,

    /// Physical base address of the register window
    #[clap(long, value_parser = parse_u64, conflicts_with = "simulate")]
    base: Option<u64>,

    /// Device file used to map physical memory
    #[clap(long, conflicts_with = "simulate")]
    mem_device: Option<PathBuf>,

    /// Time the write strobe stays high, in microseconds
    #[clap(long, value_parser = parse_u64)]
    settle_us: Option<u64>,

    /// Time after the strobe falls before the next command, in microseconds
    #[clap(long, value_parser = parse_u64)]
    setup_us: Option<u64>,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let bridge = BridgeConfig {
            register_base: self.base.unwrap_or(config.bridge.register_base),
            mem_device: self
                .mem_device
                .unwrap_or_else(|| config.bridge.mem_device.clone()),
            settle_us: self.settle_us.unwrap_or(config.bridge.settle_us),
            setup_us: self.setup_us.unwrap_or(config.bridge.setup_us),
        };

        let serial = self.serial.resolve(&config.serial);
        let channel = open_serial(&serial)
            .with_context(|| format!("Failed to open serial port {}", serial.port))?;

        if self.simulate {
            tracing::warn!("Serving a simulated core, nothing is written to hardware");
            return serve(channel, SimulatedCore::new(), bridge.timing());
        }

        let registers = MmioRegisters::map(&bridge.mem_device, bridge.register_base)
            .with_context(|| {
                format!(
                    "Failed to map the register window at {:#010x} through {}",
                    bridge.register_base,
                    bridge.mem_device.display()
                )
            })?;

        serve(channel, registers, bridge.timing())
    }
}

fn serve<C, R>(channel: C, registers: R, timing: PulseTiming) -> anyhow::Result<()>
where
    C: ByteChannel,
    R: RegisterInterface,
{
    let mut dispatcher = CommandDispatcher::new(channel, registers, timing)
        .context("Failed to hold the core in reset")?;

    match dispatcher.run() {
        Ok(never) => match never {},
        Err(error) => Err(error).context("The serial line failed"),
    }
}
