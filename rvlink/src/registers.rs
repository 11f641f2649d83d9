//! The peripheral register block that controls the external core.
//!
//! The block is five 32-bit fields at fixed offsets from a base address:
//!
//! | Offset | Field         | Access |
//! |--------|---------------|--------|
//! | 0x00   | Reset-Control | write  |
//! | 0x04   | Address-Bus   | write  |
//! | 0x08   | Data-In       | write  |
//! | 0x0C   | Write-Enable  | write  |
//! | 0x10   | Data-Out      | read   |

#[cfg(feature = "mmio")]
pub mod mmio;
pub mod simulated;

use std::fmt;

/// Physical base address of the register block in the reference hardware design.
pub const DEFAULT_BASE_ADDRESS: u64 = 0x43C0_0000;

/// Size of the register window in bytes.
pub const REGISTER_WINDOW_LEN: usize = 0x14;

/// Reset-Control value that holds the core in reset.
pub const CPU_RESET: u32 = 0x0000_0000;
/// Reset-Control value that lets the core execute.
pub const CPU_RUN: u32 = 0x0000_0001;
/// Write-Enable value that asserts the write strobe.
pub const WE_ENABLE: u32 = 0x0000_0001;
/// Write-Enable value that deasserts the write strobe.
pub const WE_DISABLE: u32 = 0x0000_0000;

/// One field of the register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Holds the core in reset or lets it run.
    ResetControl,
    /// Selects the location for Data-In and Data-Out.
    AddressBus,
    /// Word latched into the addressed location by the write strobe.
    DataIn,
    /// The write strobe.
    WriteEnable,
    /// Word currently presented at the addressed location. Read-only.
    DataOut,
}

impl Register {
    /// All fields in offset order.
    pub const ALL: [Register; 5] = [
        Register::ResetControl,
        Register::AddressBus,
        Register::DataIn,
        Register::WriteEnable,
        Register::DataOut,
    ];

    /// Byte offset from the base of the block.
    pub const fn offset(self) -> usize {
        match self {
            Register::ResetControl => 0x00,
            Register::AddressBus => 0x04,
            Register::DataIn => 0x08,
            Register::WriteEnable => 0x0C,
            Register::DataOut => 0x10,
        }
    }

    /// Whether the host may write this field.
    pub const fn is_writable(self) -> bool {
        !matches!(self, Register::DataOut)
    }

    /// Whether the host may read this field.
    pub const fn is_readable(self) -> bool {
        matches!(self, Register::DataOut)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::ResetControl => "RESET",
            Register::AddressBus => "ADDR",
            Register::DataIn => "DIN",
            Register::WriteEnable => "WE",
            Register::DataOut => "DOUT",
        };
        write!(f, "{name}@{:#04x}", self.offset())
    }
}

/// A register access that the block does not support.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum RegisterError {
    /// Register {0} is read-only.
    ReadOnly(Register),

    /// Register {0} is write-only.
    WriteOnly(Register),

    /// The register window at {base:#010x} could not be mapped: {reason}
    MapFailed {
        /// Physical base address of the window.
        base: u64,
        /// Why the mapping failed.
        reason: String,
    },
}

/// Access to the register block.
///
/// Implementations must perform accesses in program order and must not merge,
/// elide or reorder them, the external logic observes every write.
pub trait RegisterInterface {
    /// Writes `value` to `register`.
    fn write_register(&mut self, register: Register, value: u32) -> Result<(), RegisterError>;

    /// Reads the current value of `register`.
    fn read_register(&mut self, register: Register) -> Result<u32, RegisterError>;
}

impl<R: RegisterInterface + ?Sized> RegisterInterface for &mut R {
    fn write_register(&mut self, register: Register, value: u32) -> Result<(), RegisterError> {
        (**self).write_register(register, value)
    }

    fn read_register(&mut self, register: Register) -> Result<u32, RegisterError> {
        (**self).read_register(register)
    }
}

impl<R: RegisterInterface + ?Sized> RegisterInterface for Box<R> {
    fn write_register(&mut self, register: Register, value: u32) -> Result<(), RegisterError> {
        (**self).write_register(register, value)
    }

    fn read_register(&mut self, register: Register) -> Result<u32, RegisterError> {
        (**self).read_register(register)
    }
}
