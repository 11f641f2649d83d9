//! # Serial command bridge for a memory-mapped RISC-V core
//!
//! rvlink sits between a serial line and a small register block that controls an
//! external sequential-logic core: a reset line, an address bus, a data-in latch with
//! a write strobe, and a read-only data-out register.
//!
//! The bridge side runs a [`CommandDispatcher`] which reads one command byte at a time
//! and turns it into register accesses. The host side talks to it through a
//! [`BridgeClient`].
//!
//! # Examples
//!
//! ## Serving the protocol against a simulated core
//!
//! ```no_run
//! # use rvlink::Error;
//! use rvlink::channel::serial::{open_serial, SerialConfig};
//! use rvlink::{CommandDispatcher, PulseTiming, SimulatedCore};
//!
//! let channel = open_serial(&SerialConfig::new("/dev/ttyPS0"))?;
//! let mut dispatcher = CommandDispatcher::new(channel, SimulatedCore::new(), PulseTiming::default())?;
//!
//! // Only returns once the serial line fails.
//! let error = dispatcher.run().unwrap_err();
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Loading and checking a word from the host
//!
//! ```no_run
//! # use rvlink::Error;
//! use rvlink::channel::serial::{open_serial, SerialConfig};
//! use rvlink::BridgeClient;
//!
//! let mut client = BridgeClient::new(open_serial(&SerialConfig::new("/dev/ttyUSB1"))?);
//!
//! client.reset()?;
//! client.load(0x0000_2000, 8)?;
//! client.run()?;
//!
//! assert_eq!(client.verify(0x0000_2000)?, 8);
//! # Ok::<(), Error>(())
//! ```

#[warn(missing_docs)]
pub mod channel;
#[warn(missing_docs)]
mod client;
#[warn(missing_docs)]
mod dispatcher;
mod error;
pub mod program;
#[warn(missing_docs)]
pub mod protocol;
#[warn(missing_docs)]
pub mod registers;
pub mod suite;
#[cfg(test)]
mod test;

pub use crate::channel::{ByteChannel, IoChannel};
pub use crate::client::{BridgeClient, NOP_INSTRUCTION};
pub use crate::dispatcher::{CommandDispatcher, PulseTiming, MIN_PULSE_INTERVAL};
pub use crate::error::Error;
pub use crate::protocol::Command;
pub use crate::registers::{
    simulated::{AccessKind, RegisterAccess, SimulatedCore},
    Register, RegisterError, RegisterInterface,
};

#[cfg(feature = "mmio")]
pub use crate::registers::mmio::MmioRegisters;
