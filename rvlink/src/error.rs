use std::time::Duration;

use crate::program::ProgramError;
use crate::protocol::Command;
use crate::registers::RegisterError;

/// The error type returned by every fallible rvlink operation.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum Error {
    /// The byte transport failed.
    Transport(#[from] std::io::Error),

    /// The serial port could not be opened or configured.
    #[cfg(feature = "serial")]
    Serial(#[from] serialport::Error),

    /// No response arrived within {0:?}.
    Timeout(Duration),

    /// The bridge answered {command:?} with {received:#04x} instead of an acknowledgment.
    UnexpectedResponse {
        /// The command that was sent.
        command: Command,
        /// The byte that arrived in place of the acknowledgment.
        received: u8,
    },

    /// A register access was rejected.
    Register(#[from] RegisterError),

    /// A program or expected-result file could not be read.
    Program(#[from] ProgramError),

    /// The test suite could not be prepared: {0}
    Suite(String),
}

impl Error {
    /// Returns true if this error means the peer did not answer in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}
