use std::thread;
use std::time::{Duration, Instant};

use rovlink_session::{Command, Event, Link, Role, Session, VehicleState};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{session_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_event, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let command: Command = args
        .command
        .parse()
        .map_err(|err: String| CliError::new(USAGE, err))?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let config = args
        .connect
        .session_config(Role::Admin, Some(args.password))?;

    let mut session =
        Session::connect(config).map_err(|err| session_error("connect failed", err))?;
    session
        .send_command(command)
        .map_err(|err| session_error("send failed", err))?;

    let outcome = wait_for_reply(&mut session, wait_timeout, format);
    session.disconnect();
    outcome
}

/// Wait for the command's ack or error, letting telemetry interleave.
fn wait_for_reply(
    session: &mut Session,
    wait_timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let vehicle = VehicleState::default();
    let deadline = Instant::now() + wait_timeout;

    while Instant::now() < deadline {
        for event in session.poll_events() {
            match &event {
                Event::Ack { .. } => {
                    print_event(&event, &vehicle, format);
                    return Ok(SUCCESS);
                }
                Event::Error { .. } => {
                    print_event(&event, &vehicle, format);
                    return Ok(FAILURE);
                }
                Event::LinkClosed(Link::Control) => {
                    return Err(CliError::new(
                        FAILURE,
                        "connection closed before the acknowledgement",
                    ));
                }
                // Telemetry and raw frames may interleave with the reply.
                _ => {}
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    Err(CliError::new(
        TIMEOUT,
        "no acknowledgement before the timeout",
    ))
}
