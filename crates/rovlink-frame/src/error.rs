/// Errors that can occur while moving frames over a stream.
///
/// Decoding itself never fails — malformed lines degrade to raw frames —
/// so the only failure modes here are transport-side.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred on the underlying stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached end-of-file.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
