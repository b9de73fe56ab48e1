use std::time::Duration;

use clap::{Args, Subcommand};

use rovlink_session::{Role, SessionConfig};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod roster;
pub mod send;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect and stream decoded events.
    Watch(WatchArgs),
    /// Issue one motion command and wait for the acknowledgement.
    Send(SendArgs),
    /// Request the connected-client roster.
    Roster(RosterArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Roster(args) => roster::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Server host.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Server control port.
    #[arg(long, short = 'p', default_value = "5555")]
    pub port: u16,
    /// Connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "6s")]
    pub timeout: String,
}

impl ConnectArgs {
    pub fn session_config(&self, role: Role, password: Option<String>) -> CliResult<SessionConfig> {
        Ok(SessionConfig {
            host: self.host.clone(),
            port: self.port,
            role,
            password,
            connect_timeout: parse_duration(&self.timeout)?,
            ..SessionConfig::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Connect as admin instead of observer.
    #[arg(long, requires = "password")]
    pub admin: bool,
    /// Admin password.
    #[arg(long)]
    pub password: Option<String>,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Delay between event-queue polls (e.g. 200ms).
    #[arg(long, default_value = "200ms")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Command verb: SPUP, SPDN, TNLF, TNRT or LIST.
    pub command: String,
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Admin password.
    #[arg(long)]
    pub password: String,
    /// Maximum time to wait for the acknowledgement.
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct RosterArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Admin password.
    #[arg(long)]
    pub password: String,
    /// Maximum time to wait for the roster reply.
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
