use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use rovlink_session::{Command, Event, Link, Role, Session};

use crate::cmd::{parse_duration, RosterArgs};
use crate::exit::{
    session_error, CliError, CliResult, DATA_INVALID, FAILURE, PERMISSION_DENIED, SUCCESS, TIMEOUT,
};
use crate::output::{print_roster, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One row of the server's roster reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub addr: String,
    pub role: String,
    pub udp_port: u16,
}

pub fn run(args: RosterArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let config = args
        .connect
        .session_config(Role::Admin, Some(args.password))?;

    let mut session =
        Session::connect(config).map_err(|err| session_error("connect failed", err))?;
    session
        .send_command(Command::ListClients)
        .map_err(|err| session_error("send failed", err))?;

    let outcome = wait_for_roster(&mut session, wait_timeout, format);
    session.disconnect();
    outcome
}

fn wait_for_roster(
    session: &mut Session,
    wait_timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let deadline = Instant::now() + wait_timeout;

    while Instant::now() < deadline {
        for event in session.poll_events() {
            match &event {
                Event::Raw(frame) if frame.verb == "LIST" => {
                    let (count, entries) =
                        parse_roster(&frame.raw_payload).ok_or_else(|| {
                            CliError::new(
                                DATA_INVALID,
                                format!("unparseable roster reply: {}", frame.raw_payload),
                            )
                        })?;
                    print_roster(count, &entries, format);
                    return Ok(SUCCESS);
                }
                Event::Error { detail } => {
                    return Err(CliError::new(
                        PERMISSION_DENIED,
                        format!("roster request rejected: {detail}"),
                    ));
                }
                Event::LinkClosed(Link::Control) => {
                    return Err(CliError::new(FAILURE, "connection closed before the roster"));
                }
                _ => {}
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    Err(CliError::new(TIMEOUT, "no roster reply before the timeout"))
}

/// Parse a roster payload: the client count, then one
/// `ip:port:ROLE:UDP=port` entry per pipe-separated field.
pub fn parse_roster(payload: &str) -> Option<(usize, Vec<RosterEntry>)> {
    let mut parts = payload.split('|');
    let count = parts.next()?.trim().parse().ok()?;
    let entries = parts.map(parse_entry).collect::<Option<Vec<_>>>()?;
    Some((count, entries))
}

fn parse_entry(part: &str) -> Option<RosterEntry> {
    let mut pieces = part.trim().split(':');
    let ip = pieces.next()?;
    let port = pieces.next()?;
    let role = pieces.next()?;
    let udp_port = pieces.next()?.strip_prefix("UDP=")?.parse().ok()?;
    Some(RosterEntry {
        addr: format!("{ip}:{port}"),
        role: role.to_string(),
        udp_port,
    })
}
