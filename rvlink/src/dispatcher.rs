use std::convert::Infallible;
use std::time::Duration;

use crate::channel::ByteChannel;
use crate::protocol::{Command, ACK};
use crate::registers::{
    Register, RegisterInterface, CPU_RESET, CPU_RUN, WE_DISABLE, WE_ENABLE,
};
use crate::Error;

/// Shortest strobe width and recovery gap the external logic tolerates.
pub const MIN_PULSE_INTERVAL: Duration = Duration::from_micros(1);

/// Hold times around the Write-Enable strobe of a Load.
///
/// The external logic samples the strobe on its own clock, so both intervals are
/// wall-clock minimums and independent of how fast the host runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTiming {
    settle: Duration,
    setup: Duration,
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self {
            settle: MIN_PULSE_INTERVAL,
            setup: MIN_PULSE_INTERVAL,
        }
    }
}

impl PulseTiming {
    /// Creates a timing with the given strobe width (`settle`) and recovery gap (`setup`).
    ///
    /// Values below [`MIN_PULSE_INTERVAL`] are raised to it.
    pub fn new(settle: Duration, setup: Duration) -> Self {
        let clamp = |name: &str, interval: Duration| {
            if interval < MIN_PULSE_INTERVAL {
                tracing::warn!(
                    "{name} interval {interval:?} is below the minimum, using {MIN_PULSE_INTERVAL:?}"
                );
                MIN_PULSE_INTERVAL
            } else {
                interval
            }
        };

        Self {
            settle: clamp("settle", settle),
            setup: clamp("setup", setup),
        }
    }

    /// How long Write-Enable stays asserted.
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// How long Write-Enable stays deasserted before the block is touched again.
    pub fn setup(&self) -> Duration {
        self.setup
    }
}

/// Reads commands from a [`ByteChannel`] and executes them against a [`RegisterInterface`].
///
/// The dispatcher has a single idle state. Each call to [`step`](Self::step) reads one
/// command byte, reads that command's operands, performs the register accesses and
/// sends the response before returning. Unknown command bytes are dropped without a
/// response.
#[derive(Debug)]
pub struct CommandDispatcher<C, R> {
    channel: C,
    registers: R,
    timing: PulseTiming,
}

impl<C: ByteChannel, R: RegisterInterface> CommandDispatcher<C, R> {
    /// Creates a dispatcher and holds the core in reset.
    pub fn new(channel: C, mut registers: R, timing: PulseTiming) -> Result<Self, Error> {
        registers.write_register(Register::ResetControl, CPU_RESET)?;
        tracing::debug!(
            "Dispatcher ready, settle {:?}, setup {:?}",
            timing.settle,
            timing.setup
        );

        Ok(Self {
            channel,
            registers,
            timing,
        })
    }

    /// The pulse timing used for Load.
    pub fn timing(&self) -> PulseTiming {
        self.timing
    }

    /// Borrows the register interface.
    pub fn registers(&self) -> &R {
        &self.registers
    }

    /// Mutably borrows the register interface.
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.registers
    }

    /// Returns the channel and the register interface.
    pub fn into_parts(self) -> (C, R) {
        (self.channel, self.registers)
    }

    /// Serves commands until the channel fails.
    pub fn run(&mut self) -> Result<Infallible, Error> {
        tracing::info!("Serving bridge commands");
        loop {
            self.step()?;
        }
    }

    /// Processes exactly one command byte.
    ///
    /// Returns the executed command, or `None` if the byte was not a command.
    pub fn step(&mut self) -> Result<Option<Command>, Error> {
        let byte = self.channel.read_byte()?;

        let Some(command) = Command::from_byte(byte) else {
            tracing::trace!("Dropping unknown command byte {byte:#04x}");
            return Ok(None);
        };

        self.execute(command)?;
        Ok(Some(command))
    }

    fn execute(&mut self, command: Command) -> Result<(), Error> {
        match command {
            Command::Reset => {
                tracing::debug!("Reset");
                self.registers
                    .write_register(Register::ResetControl, CPU_RESET)?;
            }
            Command::Run => {
                tracing::debug!("Run");
                self.registers.write_register(Register::ResetControl, CPU_RUN)?;
            }
            Command::Load => {
                let address = self.channel.read_u32()?;
                let data = self.channel.read_u32()?;
                tracing::debug!("Load [{address:#010x}] = {data:#010x}");
                self.load(address, data)?;
            }
            Command::Verify => {
                let address = self.channel.read_u32()?;
                let data = self.verify(address)?;
                tracing::debug!("Verify [{address:#010x}] -> {data:#010x}");
                self.channel.write_u32(data)?;
            }
        }

        if command.acknowledges() {
            self.channel.write_byte(ACK)?;
        }
        Ok(())
    }

    fn load(&mut self, address: u32, data: u32) -> Result<(), Error> {
        self.registers.write_register(Register::AddressBus, address)?;
        self.registers.write_register(Register::DataIn, data)?;

        self.registers
            .write_register(Register::WriteEnable, WE_ENABLE)?;
        std::thread::sleep(self.timing.settle);
        self.registers
            .write_register(Register::WriteEnable, WE_DISABLE)?;
        std::thread::sleep(self.timing.setup);

        Ok(())
    }

    fn verify(&mut self, address: u32) -> Result<u32, Error> {
        self.registers.write_register(Register::AddressBus, address)?;
        Ok(self.registers.read_register(Register::DataOut)?)
    }
}
