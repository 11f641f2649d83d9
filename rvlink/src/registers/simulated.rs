//! A software model of the register block and the memory behind it.
//!
//! The model does not execute instructions. It stores every word latched through
//! the write strobe and presents the word at the current address on Data-Out, which
//! is enough to exercise the bridge protocol end to end without hardware.

use std::collections::BTreeMap;
use std::time::Instant;

use super::{Register, RegisterError, RegisterInterface, CPU_RUN, WE_DISABLE};

/// Direction of a recorded register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// The host wrote the field.
    Write,
    /// The host read the field.
    Read,
}

/// One register access, as seen by the simulated peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterAccess {
    /// The accessed field.
    pub register: Register,
    /// Read or write.
    pub kind: AccessKind,
    /// Value written, or value returned by a read.
    pub value: u32,
    /// When the access happened.
    pub at: Instant,
}

/// Simulated register block with word-addressed backing memory.
#[derive(Debug, Default)]
pub struct SimulatedCore {
    reset_control: u32,
    address: u32,
    data_in: u32,
    write_enable: u32,
    memory: BTreeMap<u32, u32>,
    accesses: Option<Vec<RegisterAccess>>,
}

impl SimulatedCore {
    /// An empty core, held in reset, that does not record accesses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every register access from now on, see [`accesses`](Self::accesses).
    pub fn with_access_log(mut self) -> Self {
        self.accesses = Some(Vec::new());
        self
    }

    /// The accesses recorded so far. Empty unless [`with_access_log`](Self::with_access_log) was used.
    pub fn accesses(&self) -> &[RegisterAccess] {
        self.accesses.as_deref().unwrap_or_default()
    }

    /// Forgets the recorded accesses.
    pub fn clear_accesses(&mut self) {
        if let Some(accesses) = self.accesses.as_mut() {
            accesses.clear();
        }
    }

    /// Whether Reset-Control currently lets the core run.
    pub fn is_running(&self) -> bool {
        self.reset_control == CPU_RUN
    }

    /// The last value written to `register`, or the current Data-Out value.
    pub fn register_value(&self, register: Register) -> u32 {
        match register {
            Register::ResetControl => self.reset_control,
            Register::AddressBus => self.address,
            Register::DataIn => self.data_in,
            Register::WriteEnable => self.write_enable,
            Register::DataOut => self.word(self.address),
        }
    }

    /// The word stored at `address`. Unwritten locations read as zero.
    pub fn word(&self, address: u32) -> u32 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    /// Stores `value` at `address` directly, as if the core itself had written it.
    pub fn set_word(&mut self, address: u32, value: u32) {
        self.memory.insert(address, value);
    }

    /// Number of distinct locations that hold a word.
    pub fn populated_words(&self) -> usize {
        self.memory.len()
    }

    fn record(&mut self, register: Register, kind: AccessKind, value: u32) {
        if let Some(accesses) = self.accesses.as_mut() {
            accesses.push(RegisterAccess {
                register,
                kind,
                value,
                at: Instant::now(),
            });
        }
    }
}

impl RegisterInterface for SimulatedCore {
    fn write_register(&mut self, register: Register, value: u32) -> Result<(), RegisterError> {
        match register {
            Register::ResetControl => self.reset_control = value,
            Register::AddressBus => self.address = value,
            Register::DataIn => self.data_in = value,
            Register::WriteEnable => {
                // The peripheral latches on the rising edge of the strobe.
                if self.write_enable == WE_DISABLE && value != WE_DISABLE {
                    tracing::trace!("latch [{:#010x}] = {:#010x}", self.address, self.data_in);
                    self.memory.insert(self.address, self.data_in);
                }
                self.write_enable = value;
            }
            Register::DataOut => return Err(RegisterError::ReadOnly(register)),
        }
        self.record(register, AccessKind::Write, value);
        Ok(())
    }

    fn read_register(&mut self, register: Register) -> Result<u32, RegisterError> {
        if !register.is_readable() {
            return Err(RegisterError::WriteOnly(register));
        }
        let value = self.register_value(register);
        self.record(register, AccessKind::Read, value);
        Ok(value)
    }
}
