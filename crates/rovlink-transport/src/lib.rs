//! Socket transports for the rovlink session engine.
//!
//! Two transports, one per half of the wire protocol:
//! - [`ControlStream`] — reliable, ordered TCP carrying the handshake,
//!   commands, and acknowledgements
//! - [`TelemetrySocket`] — best-effort UDP carrying periodic vehicle
//!   state updates

pub mod error;
pub mod tcp;
pub mod udp;

pub use error::{Result, TransportError};
pub use tcp::ControlStream;
pub use udp::TelemetrySocket;
