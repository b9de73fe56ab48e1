use std::io::ErrorKind;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use rovlink_frame::{Frame, FrameError, FrameReader, FrameWriter};
use rovlink_transport::ControlStream;

use crate::classify::classify;
use crate::error::{Result, SessionError};
use crate::event::{Event, Link};
use crate::queue::EventSink;

/// Default bound on the initial TCP connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(6);

/// Default bound on the wait for the handshake reply.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// A control connection that is open but not yet authenticated.
///
/// Produced by [`ControlChannel::open`]; consumed by
/// [`handshake`](Self::handshake), which either yields a ready channel or
/// fails without ever starting a receiver loop.
pub struct PendingControl {
    stream: ControlStream,
}

impl PendingControl {
    /// Run the `CONN`/`CACK` exchange.
    ///
    /// The wait for the reply is the only bounded read on this stream; the
    /// bound is cleared before the channel is handed back, so the
    /// steady-state receiver blocks indefinitely as it should.
    pub fn handshake(self, conn_payload: &str, timeout: Duration) -> Result<ControlChannel> {
        let reader_stream = self.stream.try_clone()?;
        let mut writer = FrameWriter::new(self.stream);
        let mut reader = FrameReader::new(reader_stream);

        writer.send("CONN", conn_payload)?;

        reader.get_ref().set_read_timeout(Some(timeout))?;
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => {
                return Err(SessionError::Disconnected(
                    "connection closed during handshake".to_string(),
                ))
            }
            Err(FrameError::Io(err))
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                return Err(SessionError::Timeout(timeout))
            }
            Err(err) => return Err(err.into()),
        };

        let client_id = match classify(frame) {
            Event::Accepted { client_id } => client_id,
            Event::Error { detail } => return Err(SessionError::HandshakeRejected(detail)),
            other => return Err(SessionError::UnexpectedReply(format!("{other:?}"))),
        };
        reader.get_ref().set_read_timeout(None)?;

        debug!(client_id = %client_id, "control channel ready");
        Ok(ControlChannel {
            writer,
            reader: Some(reader),
            client_id,
            receiver: None,
        })
    }
}

/// The reliable half of a session: sends commands, receives classified
/// frames on a dedicated thread.
pub struct ControlChannel {
    writer: FrameWriter<ControlStream>,
    reader: Option<FrameReader<ControlStream>>,
    client_id: String,
    receiver: Option<JoinHandle<()>>,
}

impl ControlChannel {
    /// Open the reliable transport with a bounded connect timeout.
    pub fn open(host: &str, port: u16, timeout: Duration) -> Result<PendingControl> {
        let stream = ControlStream::connect(host, port, timeout)?;
        Ok(PendingControl { stream })
    }

    /// Server-assigned identifier from the handshake.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Start the receiver loop. The loop owns the read half of the stream
    /// and communicates only through the sink.
    pub fn start(&mut self, sink: EventSink) {
        if let Some(reader) = self.reader.take() {
            self.receiver = Some(thread::spawn(move || receive_loop(reader, sink)));
        }
    }

    /// Encode and write one frame.
    pub fn send(&mut self, verb: &str, data: &str) -> Result<()> {
        self.writer.send(verb, data)?;
        Ok(())
    }

    /// Best-effort goodbye, then force the receiver out of its blocked
    /// read and wait for it to exit. Safe to call more than once.
    pub fn close(&mut self) {
        let _ = self.writer.send("DISC", "");
        let _ = self.writer.get_ref().shutdown();
        if let Some(receiver) = self.receiver.take() {
            let _ = receiver.join();
        }
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        self.close();
    }
}

fn receive_loop(mut reader: FrameReader<ControlStream>, sink: EventSink) {
    loop {
        match reader.read_frame() {
            Ok(frame) => {
                if !sink.push(classify(frame)) {
                    break;
                }
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(FrameError::Io(err)) if is_connection_loss(&err) => break,
            Err(FrameError::Io(err)) => {
                // Non-fatal read errors surface as diagnostics, not crashes.
                let diagnostic = Event::Raw(Frame::raw(format!("control read error: {err}")));
                if !sink.push(diagnostic) {
                    break;
                }
            }
        }
    }
    debug!("control receiver exited");
    let _ = sink.push(Event::LinkClosed(Link::Control));
}

fn is_connection_loss(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
    )
}
