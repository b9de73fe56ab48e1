use bytes::BytesMut;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Accumulates raw byte chunks and yields complete newline-terminated lines.
///
/// A single push may complete zero, one, or many lines; a line may span any
/// number of pushes. A trailing partial line is retained across pushes and
/// discarded when the assembler is dropped — a truncated line at stream end
/// is not a valid frame.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: BytesMut,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append a chunk of raw bytes read from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete line, without its terminator.
    ///
    /// Non-UTF-8 bytes are replaced rather than rejected; the decode layer
    /// degrades malformed text to raw frames anyway.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|&b| b == b'\n')?;
        let line = self.buf.split_to(end + 1);
        Some(String::from_utf8_lossy(&line[..end]).into_owned())
    }

    /// Bytes held back waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
