use std::io::{ErrorKind, Read};

use crate::assembler::LineAssembler;
use crate::codec::{decode_frame, Frame};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads whole decoded frames off any `Read` stream.
///
/// Partial reads are absorbed by the line assembler, so callers only ever
/// see complete frames.
pub struct FrameReader<T> {
    inner: T,
    assembler: LineAssembler,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            assembler: LineAssembler::new(),
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached. Any
    /// bytes of a trailing partial line are discarded at that point.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(line) = self.assembler.next_line() {
                return Ok(decode_frame(&line));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.assembler.push(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
