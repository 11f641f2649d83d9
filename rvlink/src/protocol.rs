//! Wire format of the bridge protocol.
//!
//! A request is a single command byte followed by fixed-size little-endian operands:
//!
//! | Command byte | Name   | Request body              | Response               |
//! |--------------|--------|---------------------------|------------------------|
//! | `'S'` (0x53) | Reset  | -                         | [`ACK`]                |
//! | `'R'` (0x52) | Run    | -                         | [`ACK`]                |
//! | `'L'` (0x4C) | Load   | address (4), data (4)     | [`ACK`] after the pulse |
//! | `'V'` (0x56) | Verify | address (4)               | data (4), no ACK       |
//!
//! Any other byte is dropped without a response.

use std::fmt;

/// Acknowledgment byte sent after every state-changing command.
pub const ACK: u8 = b'K';

/// Command byte that holds the core in reset.
pub const CMD_RESET: u8 = b'S';
/// Command byte that releases the core from reset.
pub const CMD_RUN: u8 = b'R';
/// Command byte that writes one word through the write strobe.
pub const CMD_LOAD: u8 = b'L';
/// Command byte that reads one word back through the data-out register.
pub const CMD_VERIFY: u8 = b'V';

/// Size of one operand field on the wire.
pub const OPERAND_LEN: usize = 4;

/// The closed set of commands understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Hold the core in reset.
    Reset,
    /// Release the core from reset.
    Run,
    /// Write a data word at an address, operands: address, data.
    Load,
    /// Read back the word at an address, operand: address.
    Verify,
}

impl Command {
    /// All commands, in wire-byte order of the table above.
    pub const ALL: [Command; 4] = [Command::Reset, Command::Run, Command::Load, Command::Verify];

    /// Decodes a command byte. Unknown bytes yield `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_RESET => Some(Command::Reset),
            CMD_RUN => Some(Command::Run),
            CMD_LOAD => Some(Command::Load),
            CMD_VERIFY => Some(Command::Verify),
            _ => None,
        }
    }

    /// The byte that identifies this command on the wire.
    pub fn byte(self) -> u8 {
        match self {
            Command::Reset => CMD_RESET,
            Command::Run => CMD_RUN,
            Command::Load => CMD_LOAD,
            Command::Verify => CMD_VERIFY,
        }
    }

    /// Number of operand bytes that follow the command byte.
    pub fn operand_len(self) -> usize {
        match self {
            Command::Reset | Command::Run => 0,
            Command::Load => 2 * OPERAND_LEN,
            Command::Verify => OPERAND_LEN,
        }
    }

    /// Whether the bridge answers this command with [`ACK`].
    ///
    /// Verify answers with the data word instead.
    pub fn acknowledges(self) -> bool {
        !matches!(self, Command::Verify)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Reset => "Reset",
            Command::Run => "Run",
            Command::Load => "Load",
            Command::Verify => "Verify",
        };
        write!(f, "{name} ('{}')", self.byte() as char)
    }
}

/// Encodes an operand field, least-significant byte first.
pub fn encode_u32(value: u32) -> [u8; OPERAND_LEN] {
    value.to_le_bytes()
}

/// Decodes an operand field, least-significant byte first.
pub fn decode_u32(bytes: [u8; OPERAND_LEN]) -> u32 {
    u32::from_le_bytes(bytes)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case(b'S', Some(Command::Reset); "reset")]
    #[test_case(b'R', Some(Command::Run); "run")]
    #[test_case(b'L', Some(Command::Load); "load")]
    #[test_case(b'V', Some(Command::Verify); "verify")]
    #[test_case(b'K', None; "ack byte is not a command")]
    #[test_case(b's', None; "lowercase reset")]
    #[test_case(0x00, None; "nul")]
    #[test_case(0xFF, None; "all ones")]
    fn decode_command_byte(byte: u8, expected: Option<Command>) {
        assert_eq!(Command::from_byte(byte), expected);
    }

    #[test]
    fn command_bytes_roundtrip() {
        for command in Command::ALL {
            assert_eq!(Command::from_byte(command.byte()), Some(command));
        }
    }

    #[test]
    fn operand_lengths() {
        assert_eq!(Command::Reset.operand_len(), 0);
        assert_eq!(Command::Run.operand_len(), 0);
        assert_eq!(Command::Load.operand_len(), 8);
        assert_eq!(Command::Verify.operand_len(), 4);
    }

    #[test]
    fn only_verify_skips_the_ack() {
        let silent: Vec<_> = Command::ALL
            .into_iter()
            .filter(|c| !c.acknowledges())
            .collect();
        assert_eq!(silent, vec![Command::Verify]);
    }

    #[test]
    fn operand_field_is_little_endian() {
        assert_eq!(encode_u32(0x0000_2000), [0x00, 0x20, 0x00, 0x00]);
        assert_eq!(encode_u32(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(decode_u32([0x08, 0x00, 0x00, 0x00]), 8);
    }

    #[test]
    fn operand_field_roundtrip_edges() {
        for value in [0, 1, 0xFF, 0x100, 0x8000_0000, 0xDEAD_BEEF, u32::MAX] {
            assert_eq!(decode_u32(encode_u32(value)), value);
        }
    }
}
