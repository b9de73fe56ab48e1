use std::time::Duration;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] rovlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] rovlink_frame::FrameError),

    /// The server rejected the connect request.
    #[error("connection rejected: {0}")]
    HandshakeRejected(String),

    /// The server answered the handshake with something other than an
    /// accept or reject.
    #[error("unexpected handshake reply: {0}")]
    UnexpectedReply(String),

    /// A time-bounded operation did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The session is not in a state that allows the operation.
    #[error("session is not connected")]
    NotConnected,

    /// The command requires the admin role.
    #[error("command {0} requires the admin role")]
    NotAuthorized(&'static str),

    /// The remote side closed the connection.
    #[error("disconnected: {0}")]
    Disconnected(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
