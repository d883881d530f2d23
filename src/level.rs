// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log severities recognized by the configuration surface.
//!
//! Levels are ordered: a logger configured at [`Level::Warning`] passes
//! warning, error and critical records and drops the rest. The extra
//! [`Level::None`] variant sorts above everything and is the configured way
//! to silence a logger entirely (the configuration surface accepts it under
//! the name `NONE`).

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    /// Passes nothing. Only meaningful as a threshold, never as a record level.
    None,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::None => "NONE",
        }
    }

    /// The closest `log` crate severity, used when a record crosses the
    /// facade bridge in either direction.
    pub fn to_log_level(self) -> log::Level {
        match self {
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
            Level::Warning => log::Level::Warn,
            Level::Error | Level::Critical | Level::None => log::Level::Error,
        }
    }

    pub fn from_log_level(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warning,
            log::Level::Error => Level::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" => Ok(Level::Critical),
            "NONE" => Ok(Level::None),
            _ => Err(ConfigError::InvalidValue {
                key: "level".into(),
                reason: format!("unknown level `{s}`"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!("Info".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("ERROR".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("critical".parse::<Level>().unwrap(), Level::Critical);
        assert_eq!("none".parse::<Level>().unwrap(), Level::None);
    }

    #[test]
    fn rejects_junk() {
        assert!("verbose".parse::<Level>().is_err());
        assert!("".parse::<Level>().is_err());
    }

    #[test]
    fn ordering_matches_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Critical < Level::None);
    }

    #[test]
    fn log_level_round_trip_is_lossy_but_ordered() {
        assert_eq!(Level::from_log_level(log::Level::Warn), Level::Warning);
        assert_eq!(Level::Critical.to_log_level(), log::Level::Error);
    }
}
