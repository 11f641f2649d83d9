//! Helpers shared by the unit tests.

use std::collections::VecDeque;

use crate::channel::ByteChannel;
use crate::Error;

/// An in-memory channel: bytes to read are queued up front, written bytes are collected.
///
/// Reading past the queued bytes is a transport fault.
#[derive(Debug, Default)]
pub(crate) struct QueueChannel {
    pub(crate) input: VecDeque<u8>,
    pub(crate) output: Vec<u8>,
}

impl QueueChannel {
    pub(crate) fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        }
    }
}

impl ByteChannel for QueueChannel {
    fn read_byte(&mut self) -> Result<u8, Error> {
        self.input
            .pop_front()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.output.push(byte);
        Ok(())
    }
}
