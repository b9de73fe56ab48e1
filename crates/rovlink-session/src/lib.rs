//! Dual-transport session engine for the rovlink telemetry protocol.
//!
//! A session runs one reliable control channel (TCP: handshake, commands,
//! acknowledgements) and one best-effort telemetry channel (UDP: periodic
//! vehicle state). Each live transport gets a dedicated receiver thread
//! that classifies inbound frames and enqueues [`Event`]s; the consumer
//! drains the queue with [`Session::poll_events`] and never blocks on
//! network I/O.

pub mod classify;
pub mod command;
pub mod control;
pub mod error;
pub mod event;
pub mod queue;
pub mod session;
pub mod telemetry;

pub use classify::classify;
pub use command::{Command, Role};
pub use control::{ControlChannel, PendingControl};
pub use error::{Result, SessionError};
pub use event::{Direction, Event, Link, TelemetryUpdate, VehicleState};
pub use queue::{event_queue, EventQueue, EventSink};
pub use session::{Session, SessionConfig, SessionState};
pub use telemetry::TelemetryChannel;
