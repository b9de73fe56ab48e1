use rovlink_frame::Frame;

use crate::event::{Direction, Event, TelemetryUpdate};

/// Interpret a decoded frame as a typed event.
///
/// Telemetry frames pull out the known fields; acknowledgement verbs carry
/// their payload as detail text; anything else becomes a raw event so no
/// inbound line is ever dropped silently.
pub fn classify(frame: Frame) -> Event {
    match frame.verb.as_str() {
        "TELEMETRY" => Event::Telemetry(TelemetryUpdate {
            speed: frame.field("SPEED").map(normalize_number),
            battery: frame.field("BATTERY").map(normalize_number),
            temperature: frame.field("TEMP").map(normalize_number),
            direction: frame.field("DIR").map(Direction::parse),
            timestamp: frame.field("TS").map(str::to_string),
        }),
        "CACK" => Event::Accepted {
            client_id: frame.raw_payload,
        },
        "CMOK" | "DACK" => Event::Ack {
            detail: frame.raw_payload,
        },
        "CERR" | "CMER" => Event::Error {
            detail: frame.raw_payload,
        },
        _ => Event::Raw(frame),
    }
}

/// Re-render an integral numeric field without its fractional part
/// (`"10.0"` becomes `"10"`). Non-integral values and text that does not
/// parse as a number pass through unchanged.
fn normalize_number(text: &str) -> String {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => format!("{}", value as i64),
        _ => text.to_string(),
    }
}
