use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use rovlink_session::{Event, VehicleState};

use crate::cmd::roster::RosterEntry;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    event: &'a Event,
    vehicle: &'a VehicleState,
}

/// Print one decoded event alongside the folded vehicle state.
pub fn print_event(event: &Event, vehicle: &VehicleState, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EventOutput { event, vehicle };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "DETAIL", "SPEED", "BATTERY", "TEMP", "DIR"])
                .add_row(vec![
                    kind(event).to_string(),
                    detail(event),
                    vehicle.speed.clone(),
                    vehicle.battery.clone(),
                    vehicle.temperature.clone(),
                    vehicle.direction.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} {} | speed={} battery={} temp={} dir={}",
                kind(event),
                detail(event),
                vehicle.speed,
                vehicle.battery,
                vehicle.temperature,
                vehicle.direction
            );
        }
        OutputFormat::Raw => {
            println!("{}", detail(event));
        }
    }
}

#[derive(Serialize)]
struct RosterOutput<'a> {
    count: usize,
    entries: &'a [RosterEntry],
}

/// Print the connected-client roster.
pub fn print_roster(count: usize, entries: &[RosterEntry], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = RosterOutput { count, entries };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "ROLE", "UDP PORT"]);
            for entry in entries {
                table.add_row(vec![
                    entry.addr.clone(),
                    entry.role.clone(),
                    entry.udp_port.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("{count} connected");
            for entry in entries {
                println!("{} {} udp={}", entry.addr, entry.role, entry.udp_port);
            }
        }
    }
}

fn kind(event: &Event) -> &'static str {
    match event {
        Event::Telemetry(_) => "telemetry",
        Event::Accepted { .. } => "accepted",
        Event::Ack { .. } => "ack",
        Event::Error { .. } => "error",
        Event::Raw(_) => "raw",
        Event::LinkClosed(_) => "link-closed",
    }
}

fn detail(event: &Event) -> String {
    match event {
        Event::Telemetry(update) => {
            let mut parts = Vec::new();
            if let Some(ts) = &update.timestamp {
                parts.push(format!("ts={ts}"));
            }
            parts.join(" ")
        }
        Event::Accepted { client_id } => client_id.clone(),
        Event::Ack { detail } | Event::Error { detail } => detail.clone(),
        Event::Raw(frame) => {
            if frame.raw_payload.is_empty() {
                frame.verb.clone()
            } else {
                format!("{} {}", frame.verb, frame.raw_payload)
            }
        }
        Event::LinkClosed(link) => format!("{link:?}").to_lowercase(),
    }
}
