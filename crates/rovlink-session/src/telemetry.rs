use std::thread::{self, JoinHandle};

use tracing::debug;

use rovlink_frame::decode_frame;
use rovlink_transport::TelemetrySocket;

use crate::classify::classify;
use crate::error::Result;
use crate::event::{Event, Link};
use crate::queue::EventSink;

/// Datagram receive buffer; generously above the server's message size.
const DATAGRAM_BUFFER: usize = 4 * 1024;

/// The best-effort half of a session: receives telemetry datagrams.
///
/// No handshake and no framing — one datagram is one frame. Datagrams may
/// be lost or arrive out of order; each update stands alone and only
/// carries the fields it carries.
pub struct TelemetryChannel {
    socket: TelemetrySocket,
    receiver: Option<JoinHandle<()>>,
}

impl TelemetryChannel {
    /// Bind the local datagram port. Done before the handshake so the
    /// `CONN` payload can advertise where telemetry should be addressed.
    pub fn bind() -> Result<Self> {
        Ok(Self {
            socket: TelemetrySocket::bind()?,
            receiver: None,
        })
    }

    /// Local port the server will send datagrams to.
    pub fn local_port(&self) -> u16 {
        self.socket.local_port()
    }

    /// Start the receive loop: one datagram, one frame, one event.
    pub fn start(&mut self, sink: EventSink) -> Result<()> {
        if self.receiver.is_some() {
            return Ok(());
        }
        let socket = self.socket.try_clone()?;
        self.receiver = Some(thread::spawn(move || receive_loop(socket, sink)));
        Ok(())
    }

    /// Force the receiver out of its blocked read and wait for it to
    /// exit. Safe to call more than once.
    pub fn close(&mut self) {
        self.socket.shutdown();
        if let Some(receiver) = self.receiver.take() {
            let _ = receiver.join();
        }
    }
}

impl Drop for TelemetryChannel {
    fn drop(&mut self) {
        self.close();
    }
}

fn receive_loop(socket: TelemetrySocket, sink: EventSink) {
    let mut buf = [0u8; DATAGRAM_BUFFER];
    loop {
        // A zero-length read or an error both mean the socket was shut
        // down; neither is an application failure.
        let read = match socket.recv(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let text = String::from_utf8_lossy(&buf[..read]);
        if !sink.push(classify(decode_frame(&text))) {
            break;
        }
    }
    debug!("telemetry receiver exited");
    let _ = sink.push(Event::LinkClosed(Link::Telemetry));
}
