//! Connect as an observer and print every decoded event.
//!
//! Usage: `cargo run --example observer -- [host] [port]`

use std::thread;
use std::time::Duration;

use rovlink::session::{Event, Link, Session, SessionConfig};

fn main() {
    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = std::env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(5555);

    let config = SessionConfig {
        host,
        port,
        ..SessionConfig::default()
    };

    let mut session = match Session::connect(config) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("connect failed: {err}");
            std::process::exit(1);
        }
    };
    println!("connected as {}", session.client_id());

    'outer: loop {
        for event in session.poll_events() {
            println!("{event:?}");
            if matches!(event, Event::LinkClosed(Link::Control)) {
                break 'outer;
            }
        }
        thread::sleep(Duration::from_millis(200));
    }

    session.disconnect();
}
