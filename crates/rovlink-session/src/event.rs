use serde::Serialize;

use rovlink_frame::Frame;

/// Which transport a receiver loop was draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Link {
    Control,
    Telemetry,
}

/// Vehicle heading as reported in telemetry `DIR` fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Left,
    Right,
    Forward,
    #[default]
    Unknown,
}

impl Direction {
    /// Parse a wire direction token. Unrecognized text maps to `Unknown`.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "NORTH" => Self::North,
            "SOUTH" => Self::South,
            "EAST" => Self::East,
            "WEST" => Self::West,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "FORWARD" => Self::Forward,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::North => "NORTH",
            Self::South => "SOUTH",
            Self::East => "EAST",
            Self::West => "WEST",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Forward => "FORWARD",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// One telemetry update. Every field is optional — a partial update only
/// carries the fields present on the wire, and each is last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryUpdate {
    pub speed: Option<String>,
    pub battery: Option<String>,
    pub temperature: Option<String>,
    pub direction: Option<Direction>,
    pub timestamp: Option<String>,
}

/// A classified inbound message, as handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    /// Periodic vehicle state update.
    Telemetry(TelemetryUpdate),
    /// The server accepted the connect request and assigned an identifier.
    Accepted { client_id: String },
    /// Command or disconnect acknowledgement.
    Ack { detail: String },
    /// Connect rejection or command error.
    Error { detail: String },
    /// Anything that matched no known verb, kept for diagnostic display.
    Raw(Frame),
    /// A receiver loop exited; carries which transport closed.
    LinkClosed(Link),
}

/// Latest known vehicle state, folded from telemetry updates.
///
/// Datagrams may be lost or partial; fields keep their previous value until
/// an update carries a replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleState {
    pub speed: String,
    pub battery: String,
    pub temperature: String,
    pub direction: Direction,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            speed: "0".to_string(),
            battery: "0".to_string(),
            temperature: "0".to_string(),
            direction: Direction::Unknown,
        }
    }
}

impl VehicleState {
    /// Fold one update into the accumulated state, field by field.
    pub fn apply(&mut self, update: &TelemetryUpdate) {
        if let Some(speed) = &update.speed {
            self.speed = speed.clone();
        }
        if let Some(battery) = &update.battery {
            self.battery = battery.clone();
        }
        if let Some(temperature) = &update.temperature {
            self.temperature = temperature.clone();
        }
        if let Some(direction) = update.direction {
            self.direction = direction;
        }
    }
}
