use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rovlink_session::{Event, Link, Role, Session, VehicleState};

use crate::cmd::{parse_duration, WatchArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_event, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let role = if args.admin { Role::Admin } else { Role::Observer };
    let interval = parse_duration(&args.interval)?;
    let config = args.connect.session_config(role, args.password)?;

    let mut session =
        Session::connect(config).map_err(|err| session_error("connect failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut vehicle = VehicleState::default();
    let mut printed = 0usize;

    'outer: while running.load(Ordering::SeqCst) {
        for event in session.poll_events() {
            if let Event::Telemetry(update) = &event {
                vehicle.apply(update);
            }
            print_event(&event, &vehicle, format);
            printed = printed.saturating_add(1);

            if matches!(event, Event::LinkClosed(Link::Control)) {
                break 'outer;
            }
            if let Some(count) = args.count {
                if printed >= count {
                    break 'outer;
                }
            }
        }
        thread::sleep(interval);
    }

    session.disconnect();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
