// SPDX-License-Identifier: MIT OR Apache-2.0

//! The log record.
//!
//! A record is built at the logging call site and handed, by reference, to
//! every handler the topology routes it to. Records carry the emitting
//! logger's qualname (dispatch walks its dotted ancestors), the severity,
//! the rendered message, a timestamp taken at construction, and optionally
//! the error that was being reported, complete with its captured call
//! chain. Error payloads are transient: they live for one emission and are
//! dropped with the record.

use chrono::{DateTime, Local};

use crate::level::Level;
use crate::trace::CallChain;

/// An error attached to a record for trace rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// The error's type name, e.g. `io::Error`.
    pub kind: String,
    /// The stringified error value.
    pub summary: String,
    /// Captured frames, outermost call first.
    pub chain: CallChain,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, summary: impl Into<String>, chain: CallChain) -> Self {
        ErrorInfo {
            kind: kind.into(),
            summary: summary.into(),
            chain,
        }
    }

    /// Captures the current call chain for `error`.
    pub fn from_error<E: std::error::Error>(error: &E) -> Self {
        ErrorInfo {
            kind: short_type_name(std::any::type_name::<E>()),
            summary: error.to_string(),
            chain: crate::trace::capture(),
        }
    }

    /// The closing line of a rendered trace: type name plus value.
    pub fn summary_line(&self) -> String {
        if self.summary.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.summary)
        }
    }
}

/// Shortens `std::io::error::Error` to `io::Error`: the nearest module
/// segment keeps same-named error types apart without the full path noise.
/// Segments named `error` are skipped, they are the private modules crates
/// conventionally hide their error type in and carry no information.
fn short_type_name(full: &str) -> String {
    let mut segments = full.rsplit("::");
    let name = segments.next().unwrap_or(full);
    match segments.find(|segment| *segment != "error") {
        Some(module) => format!("{module}::{name}"),
        None => name.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub qualname: String,
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Local>,
    pub error: Option<ErrorInfo>,
}

impl Record {
    pub fn new(qualname: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Record {
            qualname: qualname.into(),
            level,
            message: message.into(),
            timestamp: Local::now(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::StackFrame;

    #[test]
    fn summary_line_joins_kind_and_value() {
        let info = ErrorInfo::new("ValueError", "bad input", vec![]);
        assert_eq!(info.summary_line(), "ValueError: bad input");
    }

    #[test]
    fn summary_line_omits_the_colon_for_bare_kinds() {
        let info = ErrorInfo::new("Interrupted", "", vec![]);
        assert_eq!(info.summary_line(), "Interrupted");
    }

    #[test]
    fn from_error_uses_display_and_a_short_type_name() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let info = ErrorInfo::from_error(&err);
        assert_eq!(info.kind, "io::Error");
        assert_eq!(info.summary, "disk on fire");
    }

    #[test]
    fn short_type_name_skips_private_error_modules() {
        assert_eq!(short_type_name("std::io::error::Error"), "io::Error");
        assert_eq!(short_type_name("toml::de::Error"), "de::Error");
        assert_eq!(short_type_name("mycrate::Error"), "mycrate::Error");
        assert_eq!(short_type_name("Error"), "Error");
        assert_eq!(short_type_name("error::Error"), "Error");
    }

    #[test]
    fn records_carry_their_payload() {
        let record = Record::new("nagare.application.demo", Level::Error, "boom").with_error(
            ErrorInfo::new("E", "v", vec![StackFrame::new("a.rs", 1, "f", "")]),
        );
        assert_eq!(record.level, Level::Error);
        assert_eq!(record.error.as_ref().unwrap().chain.len(), 1);
    }
}
