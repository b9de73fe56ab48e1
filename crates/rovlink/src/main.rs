mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "rovlink", version, about = "Vehicle telemetry session CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_subcommand() {
        let cli = Cli::try_parse_from([
            "rovlink", "watch", "--host", "10.0.0.7", "--port", "6000", "--count", "5",
        ])
        .expect("watch args should parse");

        assert!(matches!(cli.command, Command::Watch(_)));
    }

    #[test]
    fn watch_admin_requires_password() {
        let err = Cli::try_parse_from(["rovlink", "watch", "--admin"])
            .expect_err("admin without password should fail");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );

        Cli::try_parse_from(["rovlink", "watch", "--admin", "--password", "admin123"])
            .expect("admin with password should parse");
    }

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "rovlink",
            "send",
            "SPUP",
            "--password",
            "admin123",
            "--wait-timeout",
            "2s",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send command");
        };
        assert_eq!(args.command, "SPUP");
    }

    #[test]
    fn parses_roster_subcommand() {
        let cli = Cli::try_parse_from(["rovlink", "roster", "--password", "admin123"])
            .expect("roster args should parse");
        assert!(matches!(cli.command, Command::Roster(_)));
    }

    #[test]
    fn global_format_flag_applies_after_subcommand() {
        let cli = Cli::try_parse_from(["rovlink", "version", "--format", "json"])
            .expect("global flag should parse");
        assert!(matches!(cli.command, Command::Version(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
