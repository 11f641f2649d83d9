use crate::channel::ByteChannel;
use crate::program::{Program, WORD_SIZE};
use crate::protocol::{Command, ACK};
use crate::Error;

/// RISC-V `addi x0, x0, 0`, written over memory that should hold no program.
pub const NOP_INSTRUCTION: u32 = 0x0000_0013;

/// Host side of the bridge protocol.
///
/// Every method sends one or more complete requests and waits for the matching
/// response. Use a channel with a read deadline, otherwise a silent bridge blocks
/// the caller forever.
#[derive(Debug)]
pub struct BridgeClient<C> {
    channel: C,
}

impl<C: ByteChannel> BridgeClient<C> {
    /// Wraps a channel connected to a bridge.
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Returns the channel.
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Holds the core in reset.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.channel.write_byte(Command::Reset.byte())?;
        self.expect_ack(Command::Reset)
    }

    /// Releases the core from reset.
    pub fn run(&mut self) -> Result<(), Error> {
        self.channel.write_byte(Command::Run.byte())?;
        self.expect_ack(Command::Run)
    }

    /// Writes `data` at `address` through the write strobe.
    pub fn load(&mut self, address: u32, data: u32) -> Result<(), Error> {
        tracing::trace!("Load [{address:#010x}] = {data:#010x}");
        self.channel.write_byte(Command::Load.byte())?;
        self.channel.write_u32(address)?;
        self.channel.write_u32(data)?;
        self.expect_ack(Command::Load)
    }

    /// Reads the word the core presents at `address`.
    pub fn verify(&mut self, address: u32) -> Result<u32, Error> {
        self.channel.write_byte(Command::Verify.byte())?;
        self.channel.write_u32(address)?;
        let value = self.channel.read_u32()?;
        tracing::trace!("Verify [{address:#010x}] -> {value:#010x}");
        Ok(value)
    }

    /// Overwrites `length_bytes` of memory from `start` with [`NOP_INSTRUCTION`].
    ///
    /// Clearing keeps instructions of an earlier, longer program from running after
    /// a shorter one. A length that is not a whole number of words is rounded down.
    /// Returns the number of words written.
    pub fn clear_memory(&mut self, start: u32, length_bytes: u32) -> Result<usize, Error> {
        if length_bytes % WORD_SIZE != 0 {
            tracing::warn!(
                "Clear length {length_bytes} is not a multiple of {WORD_SIZE}, rounding down"
            );
        }
        let words = length_bytes / WORD_SIZE;

        tracing::debug!(
            "Clearing {:#010x}..{:#010x}",
            start,
            start.wrapping_add(words * WORD_SIZE)
        );
        for index in 0..words {
            self.load(start.wrapping_add(index * WORD_SIZE), NOP_INSTRUCTION)?;
        }

        Ok(words as usize)
    }

    /// Loads `program` at consecutive word addresses from `start`.
    ///
    /// Returns the number of words loaded.
    pub fn load_program(&mut self, program: &Program, start: u32) -> Result<usize, Error> {
        for (address, word) in program.placed_at(start) {
            self.load(address, word)?;
        }
        tracing::debug!("Loaded {} words at {start:#010x}", program.len());
        Ok(program.len())
    }

    fn expect_ack(&mut self, command: Command) -> Result<(), Error> {
        match self.channel.read_byte()? {
            ACK => Ok(()),
            received => Err(Error::UnexpectedResponse { command, received }),
        }
    }
}
