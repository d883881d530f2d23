// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message formatting.
//!
//! A formatter turns a record into one line of text according to a pattern
//! with `{field}` placeholders. The recognized fields are `{asctime}`,
//! `{name}`, `{levelname}` and `{message}`; anything else in the pattern is
//! emitted literally, so an unrecognized placeholder shows up in the output
//! where an operator can spot the typo.

use crate::record::Record;

/// Pattern used when no `formatter` section configures one.
pub const DEFAULT_FORMAT: &str = "{asctime} - {name} - {levelname} - {message}";

/// Timestamp rendering for `{asctime}`.
const ASCTIME: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    pattern: String,
}

impl Formatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Formatter {
            pattern: pattern.into(),
        }
    }

    pub fn format(&self, record: &Record) -> String {
        self.pattern
            .replace("{asctime}", &record.timestamp.format(ASCTIME).to_string())
            .replace("{name}", &record.qualname)
            .replace("{levelname}", record.level.as_str())
            .replace("{message}", &record.message)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::new(DEFAULT_FORMAT)
    }
}
