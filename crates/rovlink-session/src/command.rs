use std::str::FromStr;

use serde::Serialize;

/// Role requested at connect time.
///
/// Observers receive telemetry only; admins may also drive the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Role {
    #[default]
    Observer,
    Admin,
}

/// The command vocabulary the server accepts after the handshake.
///
/// Every one of these requires the admin role; the server answers
/// `CMER|NO_PERMISSION` otherwise, and the session rejects them locally
/// before any bytes reach the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Command {
    SpeedUp,
    SlowDown,
    TurnLeft,
    TurnRight,
    ListClients,
}

impl Command {
    /// The wire verb for this command. None of them carry a payload.
    pub fn verb(self) -> &'static str {
        match self {
            Self::SpeedUp => "SPUP",
            Self::SlowDown => "SPDN",
            Self::TurnLeft => "TNLF",
            Self::TurnRight => "TNRT",
            Self::ListClients => "LIST",
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SPUP" => Ok(Self::SpeedUp),
            "SPDN" => Ok(Self::SlowDown),
            "TNLF" => Ok(Self::TurnLeft),
            "TNRT" => Ok(Self::TurnRight),
            "LIST" => Ok(Self::ListClients),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_roundtrip_through_from_str() {
        for command in [
            Command::SpeedUp,
            Command::SlowDown,
            Command::TurnLeft,
            Command::TurnRight,
            Command::ListClients,
        ] {
            assert_eq!(command.verb().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("spup".parse::<Command>().unwrap(), Command::SpeedUp);
        assert_eq!(" list ".parse::<Command>().unwrap(), Command::ListClients);
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!("WARP".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }
}
