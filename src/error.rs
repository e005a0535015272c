/*!
 * Error types for envsim
 */

use envsim_bus::BusError;
use envsim_core_sim::ParseSensorTypeError;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, SimError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_RUNTIME: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum SimError {
    /// Invalid or unreadable configuration
    Config(String),

    /// I/O error
    Io(io::Error),

    /// Message bus failure
    Bus(BusError),

    /// Sensor directory could not be queried or returned garbage
    Directory(String),

    /// Payload or config encoding error
    Serialization(String),

    /// Sensor type string that maps to no profile
    UnknownSensorType(String),

    /// Generic error with message
    Other(String),
}

impl SimError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SimError::Config(_) | SimError::UnknownSensorType(_) => EXIT_FATAL,
            _ => EXIT_RUNTIME,
        }
    }

    /// Check if this error is fatal (should not retry)
    pub fn is_fatal(&self) -> bool {
        match self {
            SimError::Config(_) => true,
            SimError::UnknownSensorType(_) => true,
            SimError::Serialization(_) => true,

            SimError::Io(_) => false,
            SimError::Bus(_) => false,
            SimError::Directory(_) => false,
            SimError::Other(_) => false,
        }
    }

    /// Check if this error is transient (temporary, worth retrying)
    pub fn is_transient(&self) -> bool {
        match self {
            SimError::Bus(err) => err.is_transient(),
            SimError::Directory(_) => true,
            SimError::Io(io_err) => {
                use io::ErrorKind::*;
                matches!(
                    io_err.kind(),
                    ConnectionRefused | ConnectionReset | ConnectionAborted | TimedOut | Interrupted
                )
            }
            _ => false,
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SimError::Io(err) => write!(f, "I/O error: {}", err),
            SimError::Bus(err) => write!(f, "Bus error: {}", err),
            SimError::Directory(msg) => write!(f, "Sensor directory error: {}", msg),
            SimError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            SimError::UnknownSensorType(raw) => write!(f, "Unknown sensor type: {}", raw),
            SimError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(err) => Some(err),
            SimError::Bus(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> Self {
        SimError::Io(err)
    }
}

impl From<BusError> for SimError {
    fn from(err: BusError) -> Self {
        SimError::Bus(err)
    }
}

impl From<ParseSensorTypeError> for SimError {
    fn from(err: ParseSensorTypeError) -> Self {
        SimError::UnknownSensorType(err.0)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for SimError {
    fn from(err: toml::de::Error) -> Self {
        SimError::Config(format!("TOML parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(SimError::Config("bad".to_string()).is_fatal());
        assert!(SimError::UnknownSensorType("PRESSURE".to_string()).is_fatal());
        assert!(!SimError::Directory("timeout".to_string()).is_fatal());
        assert!(!SimError::Io(io::Error::other("test")).is_fatal());
    }

    #[test]
    fn test_transient_errors() {
        assert!(SimError::Bus(BusError::Unreachable("down".to_string())).is_transient());
        assert!(SimError::Directory("503".to_string()).is_transient());
        assert!(!SimError::Config("x".to_string()).is_transient());
        assert!(SimError::Io(io::Error::from(io::ErrorKind::TimedOut)).is_transient());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SimError::Config("x".to_string()).exit_code(), EXIT_FATAL);
        assert_eq!(SimError::Other("x".to_string()).exit_code(), EXIT_RUNTIME);
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: SimError = "PRESSURE".parse::<envsim_core_sim::SensorType>().unwrap_err().into();
        assert_eq!(err.to_string(), "Unknown sensor type: PRESSURE");
    }
}
