//! Command-line configuration values.

use std::str::FromStr;

use thiserror::Error;

/// Errors in configuration values given on the command line or through the
/// environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown log level '{0}', expected one of: trace, debug, info, warn, error, off")]
    UnknownLogLevel(String),
}

/// Log level for the `tracing` subscriber.
///
/// Defaults to `Warn` so that rendering output is not mixed with engine
/// diagnostics unless asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Off,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "off" | "none" => Ok(Self::Off),
            _ => Err(ConfigError::UnknownLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// The `EnvFilter` directive for this level.
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!("DEBUG".parse(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse(), Ok(LogLevel::Warn));
        assert_eq!("off".parse(), Ok(LogLevel::Off));
    }

    #[test]
    fn rejects_unknown_levels() {
        let err = "loud".parse::<LogLevel>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown log level 'loud', expected one of: trace, debug, info, warn, error, off"
        );
    }

    #[test]
    fn default_is_warn() {
        assert_eq!(LogLevel::default().as_filter_str(), "warn");
    }
}
