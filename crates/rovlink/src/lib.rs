//! Client-side session engine for remote vehicle telemetry.
//!
//! rovlink connects to a telemetry server over two transports — a reliable
//! TCP control channel and a best-effort UDP telemetry channel — performs
//! the text handshake, and hands decoded events to a single consumer.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP/UDP socket wrappers, no protocol knowledge
//! - [`frame`] — line-delimited framing, codec, stream assembly
//! - [`session`] — classification, channels, and session orchestration

/// Re-export transport types.
pub mod transport {
    pub use rovlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rovlink_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use rovlink_session::*;
}
