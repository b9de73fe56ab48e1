use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::command::{Command, Role};
use crate::control::{
    ControlChannel, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HANDSHAKE_TIMEOUT,
};
use crate::error::{Result, SessionError};
use crate::event::{Event, Link};
use crate::queue::{event_queue, EventQueue, DEFAULT_QUEUE_CAPACITY};
use crate::telemetry::TelemetryChannel;

/// Lifecycle states of the session's control machine.
///
/// `Connecting` and `Handshaking` are transient inside [`Session::connect`];
/// the failure transitions surface as the error return instead of a session
/// value, so a live session only ever reports `Ready` or `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Connecting,
    Handshaking,
    Ready,
    Closed,
    Failed,
}

/// Everything needed to establish a session.
#[derive(Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub role: Role,
    /// Shared secret, required for [`Role::Admin`].
    pub password: Option<String>,
    pub connect_timeout: Duration,
    pub handshake_timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5555,
            role: Role::Observer,
            password: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("SessionConfig");
        dbg.field("host", &self.host)
            .field("port", &self.port)
            .field("role", &self.role)
            .field("connect_timeout", &self.connect_timeout)
            .field("handshake_timeout", &self.handshake_timeout)
            .field("queue_capacity", &self.queue_capacity);
        // The shared secret is credential material; keep it out of logs.
        if let Some(password) = &self.password {
            dbg.field(
                "password",
                &format_args!("<redacted:{} bytes>", password.len()),
            );
        } else {
            dbg.field("password", &Option::<String>::None);
        }
        dbg.finish()
    }
}

/// One live connection to a telemetry server.
///
/// Owned by the consumer thread. The two receiver threads only ever enqueue
/// events; every state field here is touched synchronously by the consumer
/// through these methods, so there is exactly one writer.
pub struct Session {
    state: SessionState,
    role: Role,
    client_id: String,
    control: Option<ControlChannel>,
    telemetry: Option<TelemetryChannel>,
    queue: EventQueue,
}

impl Session {
    /// Connect and authenticate, then start both receiver loops.
    ///
    /// The telemetry socket is bound before the handshake so its port can
    /// be advertised in the `CONN` payload; if the bind fails the session
    /// proceeds control-only and advertises port 0, the server's cue that
    /// no datagrams are wanted.
    pub fn connect(config: SessionConfig) -> Result<Self> {
        let (sink, queue) = event_queue(config.queue_capacity);

        let telemetry = match TelemetryChannel::bind() {
            Ok(channel) => Some(channel),
            Err(err) => {
                warn!(error = %err, "telemetry bind failed; continuing control-only");
                None
            }
        };
        let udp_port = telemetry.as_ref().map_or(0, TelemetryChannel::local_port);
        let payload = conn_payload(config.role, config.password.as_deref(), udp_port);

        debug!(state = ?SessionState::Connecting, host = %config.host, port = config.port);
        let pending = ControlChannel::open(&config.host, config.port, config.connect_timeout)
            .map_err(|err| fail(err, "connect"))?;

        debug!(state = ?SessionState::Handshaking, role = ?config.role, udp_port);
        let mut control = pending
            .handshake(&payload, config.handshake_timeout)
            .map_err(|err| fail(err, "handshake"))?;

        let client_id = control.client_id().to_string();
        control.start(sink.clone());
        let telemetry = telemetry.and_then(|mut channel| match channel.start(sink) {
            Ok(()) => Some(channel),
            Err(err) => {
                warn!(error = %err, "telemetry receiver failed to start; continuing control-only");
                None
            }
        });

        info!(client_id = %client_id, role = ?config.role, "session ready");
        Ok(Self {
            state: SessionState::Ready,
            role: config.role,
            client_id,
            control: Some(control),
            telemetry,
            queue,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Server-assigned identifier from the handshake.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Whether the telemetry receive loop is running.
    pub fn has_telemetry(&self) -> bool {
        self.telemetry.is_some()
    }

    /// Send one command over the control channel.
    ///
    /// Every command in the vocabulary is privileged, so a non-admin
    /// session is rejected here, before anything reaches the wire.
    pub fn send_command(&mut self, command: Command) -> Result<()> {
        if self.state != SessionState::Ready {
            return Err(SessionError::NotConnected);
        }
        if self.role != Role::Admin {
            return Err(SessionError::NotAuthorized(command.verb()));
        }
        let control = self.control.as_mut().ok_or(SessionError::NotConnected)?;
        debug!(verb = command.verb(), "sending command");
        control.send(command.verb(), "")
    }

    /// Non-blocking drain of everything currently queued.
    ///
    /// Receiver-loop termination arrives here as a [`Event::LinkClosed`],
    /// which is also where the control channel's closure is folded into the
    /// session state — on this thread, like every other state change.
    pub fn poll_events(&mut self) -> Vec<Event> {
        let events = self.queue.drain();
        if events
            .iter()
            .any(|event| matches!(event, Event::LinkClosed(Link::Control)))
        {
            debug!(state = ?SessionState::Closed, "control link closed by peer");
            self.state = SessionState::Closed;
        }
        events
    }

    /// Tear down both channels. Idempotent; teardown failures are
    /// swallowed so a disconnect always completes.
    pub fn disconnect(&mut self) {
        if let Some(mut control) = self.control.take() {
            control.close();
        }
        if let Some(mut telemetry) = self.telemetry.take() {
            telemetry.close();
        }
        if self.state != SessionState::Closed {
            info!("session closed");
            self.state = SessionState::Closed;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn fail(err: SessionError, step: &str) -> SessionError {
    warn!(state = ?SessionState::Failed, step, error = %err, "connect failed");
    err
}

/// Build the `CONN` payload. The grammar is a byte-for-byte contract with
/// the server: `ADMIN:{password}:{udp_port}` or `OBSERVER:{udp_port}`.
fn conn_payload(role: Role, password: Option<&str>, udp_port: u16) -> String {
    match role {
        Role::Admin => format!("ADMIN:{}:{}", password.unwrap_or(""), udp_port),
        Role::Observer => format!("OBSERVER:{udp_port}"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream, UdpSocket};
    use std::thread;
    use std::time::Instant;

    use crate::event::{Direction, VehicleState};

    use super::*;

    struct FakeServer {
        port: u16,
        handle: thread::JoinHandle<Vec<String>>,
    }

    /// Accept one client, answer its handshake, then run `script` with the
    /// stream and every line received so far. Returns all received lines.
    fn fake_server<F>(reply: &'static str, script: F) -> FakeServer
    where
        F: FnOnce(&mut TcpStream, &mut BufReader<TcpStream>, &mut Vec<String>) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut lines = BufReader::new(stream.try_clone().unwrap());
            let mut received = Vec::new();

            let mut conn = String::new();
            lines.read_line(&mut conn).unwrap();
            received.push(conn);
            stream.write_all(reply.as_bytes()).unwrap();

            script(&mut stream, &mut lines, &mut received);
            received
        });
        FakeServer { port, handle }
    }

    fn read_next(lines: &mut BufReader<TcpStream>, received: &mut Vec<String>) {
        let mut line = String::new();
        if lines.read_line(&mut line).unwrap_or(0) > 0 {
            received.push(line);
        }
    }

    fn config(port: u16, role: Role, password: Option<&str>) -> SessionConfig {
        SessionConfig {
            port,
            role,
            password: password.map(str::to_string),
            connect_timeout: Duration::from_secs(2),
            handshake_timeout: Duration::from_secs(2),
            ..SessionConfig::default()
        }
    }

    fn poll_until<F>(session: &mut Session, pred: F) -> Vec<Event>
    where
        F: Fn(&Event) -> bool,
    {
        let mut events = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline && !events.iter().any(&pred) {
            events.extend(session.poll_events());
            thread::sleep(Duration::from_millis(10));
        }
        events
    }

    /// Pull the advertised UDP port back out of a CONN line.
    fn advertised_udp_port(conn_line: &str) -> u16 {
        let payload = conn_line.trim().rsplit('|').next().unwrap();
        payload.rsplit(':').next().unwrap().parse().unwrap()
    }

    #[test]
    fn observer_connect_streams_telemetry() {
        let server = fake_server("CACK|0004|C001\n", |_stream, lines, received| {
            // Stay up until the client disconnects.
            read_next(lines, received);
        });

        let mut session =
            Session::connect(config(server.port, Role::Observer, None)).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.client_id(), "C001");
        assert!(session.has_telemetry());

        // Feed one datagram to the advertised port, as the server would.
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender
            .send_to(
                b"TELE|0041|SPEED:0.0|BATTERY:100|TEMP:25.0|DIR:NORTH\n",
                ("127.0.0.1", session_udp_port(&session)),
            )
            .unwrap();

        let events = poll_until(&mut session, |e| matches!(e, Event::Telemetry(_)));
        let mut state = VehicleState::default();
        for event in &events {
            if let Event::Telemetry(update) = event {
                state.apply(update);
            }
        }
        assert_eq!(state.speed, "0");
        assert_eq!(state.battery, "100");
        assert_eq!(state.temperature, "25");
        assert_eq!(state.direction, Direction::North);

        session.disconnect();
        let received = server.handle.join().unwrap();
        let conn = received[0].trim();
        assert!(conn.starts_with("CONN|"));
        assert!(conn.ends_with(&format!("OBSERVER:{}", advertised_udp_port(conn))));
    }

    #[test]
    fn admin_conn_payload_carries_password_and_port() {
        let server = fake_server("CACK|0004|C002\n", |_stream, lines, received| {
            read_next(lines, received);
        });

        let mut session =
            Session::connect(config(server.port, Role::Admin, Some("admin123"))).unwrap();
        let udp_port = session_udp_port(&session);
        session.disconnect();

        let received = server.handle.join().unwrap();
        let conn = received[0].trim();
        let payload = format!("ADMIN:admin123:{udp_port}");
        assert_eq!(conn, format!("CONN|{:04}|{payload}", payload.len()));
    }

    #[test]
    fn handshake_rejection_fails_connect_and_starts_nothing() {
        let server = fake_server("CERR|0007|BADAUTH\n", |_stream, lines, received| {
            // If a receiver loop had started, a DISC would land here; EOF
            // from the client dropping the socket is the expected outcome.
            read_next(lines, received);
        });

        let result = Session::connect(config(server.port, Role::Observer, None));
        assert!(
            matches!(result, Err(SessionError::HandshakeRejected(ref detail)) if detail == "BADAUTH")
        );

        let received = server.handle.join().unwrap();
        assert_eq!(received.len(), 1, "nothing written after the rejected CONN");
    }

    #[test]
    fn observer_commands_are_rejected_locally() {
        let server = fake_server("CACK|0004|C003\n", |_stream, lines, received| {
            read_next(lines, received);
        });

        let mut session =
            Session::connect(config(server.port, Role::Observer, None)).unwrap();
        let err = session.send_command(Command::SpeedUp).unwrap_err();
        assert!(matches!(err, SessionError::NotAuthorized("SPUP")));

        session.disconnect();
        let received = server.handle.join().unwrap();
        // Only CONN and the disconnect goodbye ever hit the wire.
        assert_eq!(received.len(), 2);
        assert_eq!(received[1], "DISC|0000|\n");
    }

    #[test]
    fn admin_command_reaches_server_and_ack_comes_back() {
        let server = fake_server("CACK|0004|C004\n", |stream, lines, received| {
            read_next(lines, received);
            stream.write_all(b"CMOK|0008|EXECUTED\n").unwrap();
            read_next(lines, received);
        });

        let mut session =
            Session::connect(config(server.port, Role::Admin, Some("admin123"))).unwrap();
        session.send_command(Command::SpeedUp).unwrap();

        let events = poll_until(&mut session, |e| matches!(e, Event::Ack { .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Ack { detail } if detail == "EXECUTED")));

        session.disconnect();
        let received = server.handle.join().unwrap();
        assert_eq!(received[1], "SPUP|0000|\n");
    }

    #[test]
    fn remote_eof_closes_the_session_at_the_next_poll() {
        let server = fake_server("CACK|0004|C005\n", |_stream, _lines, _received| {
            // Return immediately; the stream drops and the client sees EOF.
        });

        let mut session =
            Session::connect(config(server.port, Role::Observer, None)).unwrap();
        server.handle.join().unwrap();

        poll_until(&mut session, |e| {
            matches!(e, Event::LinkClosed(Link::Control))
        });
        assert_eq!(session.state(), SessionState::Closed);

        let err = session.send_command(Command::SpeedUp).unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let server = fake_server("CACK|0004|C006\n", |_stream, lines, received| {
            read_next(lines, received);
        });

        let mut session =
            Session::connect(config(server.port, Role::Observer, None)).unwrap();
        session.disconnect();
        session.disconnect();
        assert_eq!(session.state(), SessionState::Closed);

        server.handle.join().unwrap();
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let config = SessionConfig {
            password: Some("super-secret".to_string()),
            ..SessionConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted:12 bytes>"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn conn_payload_grammar() {
        assert_eq!(conn_payload(Role::Observer, None, 5001), "OBSERVER:5001");
        assert_eq!(
            conn_payload(Role::Admin, Some("admin123"), 6001),
            "ADMIN:admin123:6001"
        );
        assert_eq!(conn_payload(Role::Observer, Some("ignored"), 0), "OBSERVER:0");
        assert_eq!(conn_payload(Role::Admin, None, 0), "ADMIN::0");
    }

    fn session_udp_port(session: &Session) -> u16 {
        session
            .telemetry
            .as_ref()
            .map(TelemetryChannel::local_port)
            .expect("telemetry channel should be bound")
    }
}
