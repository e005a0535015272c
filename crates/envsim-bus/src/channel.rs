//! Named bus channels and their direction relative to the simulator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the simulator consumes or produces a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One of the four channels the simulator uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// A sensor was created elsewhere in the system
    SensorCreated,
    /// A sensor's active flag changed elsewhere in the system
    SensorStatusChange,
    /// Generated readings
    SensorReading,
    /// Simulator lifecycle events (active / inactive / error)
    SensorStatus,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::SensorCreated,
        Channel::SensorStatusChange,
        Channel::SensorReading,
        Channel::SensorStatus,
    ];

    /// Wire name of the channel
    pub fn name(&self) -> &'static str {
        match self {
            Channel::SensorCreated => "sensor-created",
            Channel::SensorStatusChange => "sensor-status-change",
            Channel::SensorReading => "sensor-reading",
            Channel::SensorStatus => "sensor-status",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Channel::SensorCreated | Channel::SensorStatusChange => Direction::Inbound,
            Channel::SensorReading | Channel::SensorStatus => Direction::Outbound,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown channel: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(Channel::SensorCreated.to_string(), "sensor-created");
        assert_eq!(Channel::SensorStatusChange.to_string(), "sensor-status-change");
        assert_eq!(Channel::SensorReading.to_string(), "sensor-reading");
        assert_eq!(Channel::SensorStatus.to_string(), "sensor-status");
    }

    #[test]
    fn test_parse_round_trips_every_channel() {
        for channel in Channel::ALL {
            assert_eq!(channel.name().parse::<Channel>(), Ok(channel));
        }
        assert!("sensor-deleted".parse::<Channel>().is_err());
    }

    #[test]
    fn test_directions() {
        assert_eq!(Channel::SensorCreated.direction(), Direction::Inbound);
        assert_eq!(Channel::SensorStatusChange.direction(), Direction::Inbound);
        assert_eq!(Channel::SensorReading.direction(), Direction::Outbound);
        assert_eq!(Channel::SensorStatus.direction(), Direction::Outbound);
    }
}
