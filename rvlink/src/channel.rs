//! Blocking byte transport underneath the command protocol.
//!
//! A [`ByteChannel`] knows nothing about commands. It moves single bytes and
//! little-endian 32-bit operand fields, and it blocks until the transport can
//! satisfy the request.

#[cfg(feature = "serial")]
pub mod serial;

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use crate::protocol::{decode_u32, encode_u32, OPERAND_LEN};
use crate::Error;

/// A full-duplex, in-order byte stream.
pub trait ByteChannel {
    /// Blocks until one byte is available and returns it.
    fn read_byte(&mut self) -> Result<u8, Error>;

    /// Blocks until the transport has accepted `byte`.
    fn write_byte(&mut self, byte: u8) -> Result<(), Error>;

    /// Reads one operand field: four bytes, least-significant first.
    ///
    /// Either all four bytes are consumed or the call fails.
    fn read_u32(&mut self) -> Result<u32, Error> {
        let mut bytes = [0u8; OPERAND_LEN];
        for byte in bytes.iter_mut() {
            *byte = self.read_byte()?;
        }
        Ok(decode_u32(bytes))
    }

    /// Writes one operand field: four bytes, least-significant first.
    fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        for byte in encode_u32(value) {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for &mut C {
    fn read_byte(&mut self) -> Result<u8, Error> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        (**self).write_byte(byte)
    }

    fn read_u32(&mut self) -> Result<u32, Error> {
        (**self).read_u32()
    }

    fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        (**self).write_u32(value)
    }
}

/// A [`ByteChannel`] over any [`Read`] + [`Write`] stream.
///
/// Reads that time out, would block or are interrupted are retried, so without a
/// deadline [`read_byte`](ByteChannel::read_byte) waits forever. The end of the
/// stream is reported as a transport error.
#[derive(Debug)]
pub struct IoChannel<T> {
    inner: T,
    read_timeout: Option<Duration>,
}

impl<T: Read + Write> IoChannel<T> {
    /// Wraps `inner` without a read deadline.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            read_timeout: None,
        }
    }

    /// Fails reads with [`Error::Timeout`] once `timeout` has passed without a byte.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// The read deadline, if any.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Borrows the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrows the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn is_retryable(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

impl<T: Read + Write> ByteChannel for IoChannel<T> {
    fn read_byte(&mut self) -> Result<u8, Error> {
        let start = Instant::now();
        let mut byte = [0u8; 1];

        loop {
            match self.inner.read(&mut byte) {
                Ok(1) => return Ok(byte[0]),
                Ok(_) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
                Err(e) if is_retryable(&e) => {
                    if e.kind() == io::ErrorKind::WouldBlock {
                        std::thread::yield_now();
                    }
                }
                Err(e) => return Err(e.into()),
            }

            if let Some(timeout) = self.read_timeout {
                if start.elapsed() >= timeout {
                    return Err(Error::Timeout(timeout));
                }
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        loop {
            match self.inner.write_all(&[byte]) {
                Ok(()) => break,
                Err(e) if is_retryable(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::{ByteChannel, IoChannel};
    use crate::Error;

    /// Replays scripted read results and collects writes.
    #[derive(Default)]
    struct ScriptedStream {
        reads: VecDeque<io::Result<u8>>,
        written: Vec<u8>,
        stall_forever: bool,
    }

    impl ScriptedStream {
        fn with_bytes(bytes: &[u8]) -> Self {
            Self {
                reads: bytes.iter().copied().map(Ok).collect(),
                ..Default::default()
            }
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(byte)) => {
                    buf[0] = byte;
                    Ok(1)
                }
                Some(Err(e)) => Err(e),
                None if self.stall_forever => Err(io::ErrorKind::TimedOut.into()),
                None => Ok(0),
            }
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn read_u32_assembles_little_endian() {
        let mut channel = IoChannel::new(ScriptedStream::with_bytes(&[0x78, 0x56, 0x34, 0x12]));
        assert_eq!(channel.read_u32().unwrap(), 0x1234_5678);
    }

    #[test]
    fn read_u32_consumes_exactly_four_bytes() {
        let mut channel =
            IoChannel::new(ScriptedStream::with_bytes(&[0x00, 0x20, 0x00, 0x00, b'V']));
        assert_eq!(channel.read_u32().unwrap(), 0x2000);
        assert_eq!(channel.read_byte().unwrap(), b'V');
    }

    #[test]
    fn write_u32_emits_least_significant_byte_first() {
        let mut channel = IoChannel::new(ScriptedStream::default());
        channel.write_u32(0xDEAD_BEEF).unwrap();
        assert_eq!(channel.get_ref().written, vec![0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn transient_errors_are_retried() {
        let mut stream = ScriptedStream::default();
        stream.reads.push_back(Err(io::ErrorKind::TimedOut.into()));
        stream.reads.push_back(Err(io::ErrorKind::Interrupted.into()));
        stream.reads.push_back(Err(io::ErrorKind::WouldBlock.into()));
        stream.reads.push_back(Ok(b'K'));

        let mut channel = IoChannel::new(stream);
        assert_eq!(channel.read_byte().unwrap(), b'K');
    }

    #[test]
    fn end_of_stream_is_a_transport_fault() {
        let mut channel = IoChannel::new(ScriptedStream::with_bytes(&[0x01, 0x02]));
        let error = channel.read_u32().unwrap_err();
        assert!(
            matches!(error, Error::Transport(ref e) if e.kind() == io::ErrorKind::UnexpectedEof),
            "unexpected error {error:?}"
        );
    }

    #[test]
    fn hard_errors_are_not_retried() {
        let mut stream = ScriptedStream::default();
        stream
            .reads
            .push_back(Err(io::ErrorKind::BrokenPipe.into()));
        stream.reads.push_back(Ok(b'K'));

        let mut channel = IoChannel::new(stream);
        assert!(matches!(channel.read_byte(), Err(Error::Transport(_))));
    }

    #[test]
    fn read_deadline_expires() {
        let stream = ScriptedStream {
            stall_forever: true,
            ..Default::default()
        };
        let timeout = Duration::from_millis(5);
        let mut channel = IoChannel::new(stream).with_read_timeout(timeout);

        match channel.read_byte() {
            Err(Error::Timeout(t)) => assert_eq!(t, timeout),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }

    #[test]
    fn borrowed_channel_forwards() {
        fn echo_word<C: ByteChannel>(mut channel: C) -> u32 {
            let word = channel.read_u32().unwrap();
            channel.write_byte(b'K').unwrap();
            word
        }

        let mut channel = IoChannel::new(ScriptedStream::with_bytes(&[0x08, 0, 0, 0]));
        assert_eq!(echo_word(&mut channel), 8);
        assert_eq!(channel.get_ref().written, vec![b'K']);
    }
}
