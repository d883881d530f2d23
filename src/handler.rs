// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record sinks.
//!
//! [`Handler`] is the seam between the dispatch registry and the outside
//! world. The stock implementations cover the class registry the
//! configuration surface accepts: `stream` (stderr/stdout) and `file`. The
//! in-memory handler exists for tests and capture scenarios, mirroring the
//! way the registry's own tests assert on output.
//!
//! Emission is best effort everywhere: a handler that cannot write drops
//! the record silently, a logging failure must never take the hosting
//! application down with it. Each handler serializes its own writes so a
//! multi-line emission is never interleaved with another thread's.

use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{IsTerminal, Write};

use parking_lot::Mutex;

use crate::colorize::plain_trace_lines;
use crate::error::ConfigError;
use crate::formatter::Formatter;
use crate::level::Level;
use crate::record::Record;

pub trait Handler: Debug + Send + Sync {
    /// Writes the record. Must not panic and must not propagate failures.
    fn emit(&self, record: &Record);

    /// Flushes any buffered output. The application may imminently exit.
    fn flush(&self);
}

/// Output stream selection for `stream`-class handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamTarget {
    #[default]
    Stderr,
    Stdout,
}

impl StreamTarget {
    /// Whether the stream is attached to an interactive terminal.
    pub fn is_interactive(&self) -> bool {
        match self {
            StreamTarget::Stderr => std::io::stderr().is_terminal(),
            StreamTarget::Stdout => std::io::stdout().is_terminal(),
        }
    }

    pub(crate) fn write_lines(&self, lines: &[String]) {
        let write_to = |w: &mut dyn Write| {
            for line in lines {
                if writeln!(w, "{line}").is_err() {
                    return;
                }
            }
            let _ = w.flush();
        };
        match self {
            StreamTarget::Stderr => write_to(&mut std::io::stderr().lock()),
            StreamTarget::Stdout => write_to(&mut std::io::stdout().lock()),
        }
    }
}

/// Formats records and writes them to stderr or stdout.
///
/// Records carrying an error payload get the raw trace appended inline,
/// uncolored; the colorizing handler takes over that job where configured.
#[derive(Debug)]
pub struct StreamHandler {
    target: StreamTarget,
    formatter: Formatter,
    level: Option<Level>,
    write_lock: Mutex<()>,
}

impl StreamHandler {
    pub fn new(target: StreamTarget, formatter: Formatter, level: Option<Level>) -> Self {
        StreamHandler {
            target,
            formatter,
            level,
            write_lock: Mutex::new(()),
        }
    }

    pub fn target(&self) -> StreamTarget {
        self.target
    }
}

impl Handler for StreamHandler {
    fn emit(&self, record: &Record) {
        if below_threshold(self.level, record) {
            return;
        }
        let mut lines = vec![self.formatter.format(record)];
        if let Some(error) = &record.error {
            lines.extend(plain_trace_lines(error));
        }
        let _guard = self.write_lock.lock();
        self.target.write_lines(&lines);
    }

    fn flush(&self) {
        match self.target {
            StreamTarget::Stderr => {
                let _ = std::io::stderr().flush();
            }
            StreamTarget::Stdout => {
                let _ = std::io::stdout().flush();
            }
        }
    }
}

/// Appends formatted records to a file.
///
/// The file opens when the topology is built, so an unwritable path is a
/// configuration error surfaced at startup, not a silently dead log.
#[derive(Debug)]
pub struct FileHandler {
    path: String,
    file: Mutex<File>,
    formatter: Formatter,
    level: Option<Level>,
}

impl FileHandler {
    pub fn open(
        path: &str,
        append: bool,
        formatter: Formatter,
        level: Option<Level>,
    ) -> Result<Self, ConfigError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|source| ConfigError::OpenLogFile {
                path: path.to_string(),
                source,
            })?;
        Ok(FileHandler {
            path: path.to_string(),
            file: Mutex::new(file),
            formatter,
            level,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Handler for FileHandler {
    fn emit(&self, record: &Record) {
        if below_threshold(self.level, record) {
            return;
        }
        let mut lines = vec![self.formatter.format(record)];
        if let Some(error) = &record.error {
            lines.extend(plain_trace_lines(error));
        }
        let mut file = self.file.lock();
        for line in lines {
            if writeln!(file, "{line}").is_err() {
                return;
            }
        }
        let _ = file.flush();
    }

    fn flush(&self) {
        let _ = self.file.lock().flush();
    }
}

/// Captures formatted lines in memory.
#[derive(Debug, Default)]
pub struct MemoryHandler {
    formatter: Formatter,
    lines: Mutex<Vec<String>>,
}

impl MemoryHandler {
    pub fn new() -> Self {
        MemoryHandler::default()
    }

    pub fn with_formatter(formatter: Formatter) -> Self {
        MemoryHandler {
            formatter,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Returns and clears everything captured so far.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    /// True when any captured line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

impl Handler for MemoryHandler {
    fn emit(&self, record: &Record) {
        let mut lines = vec![self.formatter.format(record)];
        if let Some(error) = &record.error {
            lines.extend(plain_trace_lines(error));
        }
        self.lines.lock().extend(lines);
    }

    fn flush(&self) {}
}

fn below_threshold(threshold: Option<Level>, record: &Record) -> bool {
    threshold.is_some_and(|min| record.level < min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ErrorInfo;
    use crate::trace::StackFrame;
    use std::io::Read;

    fn record(level: Level, message: &str) -> Record {
        Record::new("nagare.application.demo", level, message)
    }

    #[test]
    fn memory_handler_captures_and_drains() {
        let handler = MemoryHandler::with_formatter(Formatter::new("{levelname} {message}"));
        handler.emit(&record(Level::Info, "first"));
        handler.emit(&record(Level::Error, "second"));
        assert!(handler.contains("ERROR second"));
        let lines = handler.drain();
        assert_eq!(lines, vec!["INFO first", "ERROR second"]);
        assert!(handler.drain().is_empty());
    }

    #[test]
    fn memory_handler_appends_raw_trace_inline() {
        let handler = MemoryHandler::with_formatter(Formatter::new("{message}"));
        let rec = record(Level::Error, "boom").with_error(ErrorInfo::new(
            "ValueError",
            "bad",
            vec![StackFrame::new("/a/b.rs", 3, "f", "call()")],
        ));
        handler.emit(&rec);
        assert!(handler.contains("Traceback"));
        assert!(handler.contains("ValueError: bad"));
    }

    #[test]
    fn file_handler_writes_and_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let handler = FileHandler::open(
            path.to_str().unwrap(),
            true,
            Formatter::new("{levelname}: {message}"),
            None,
        )
        .unwrap();
        handler.emit(&record(Level::Warning, "low disk"));
        handler.flush();

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "WARNING: low disk\n");
    }

    #[test]
    fn file_handler_open_failure_is_a_config_error() {
        let err = FileHandler::open("/definitely/not/a/dir/x.log", true, Formatter::default(), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::OpenLogFile { .. }));
    }

    #[test]
    fn handler_level_filters_records() {
        let handler = MemoryHandler::new();
        // MemoryHandler has no threshold; exercise the helper directly
        assert!(below_threshold(Some(Level::Error), &record(Level::Info, "m")));
        assert!(!below_threshold(Some(Level::Error), &record(Level::Critical, "m")));
        assert!(!below_threshold(None, &record(Level::Debug, "m")));
        handler.emit(&record(Level::Debug, "kept"));
        assert!(handler.contains("kept"));
    }
}
