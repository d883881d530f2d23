// SPDX-License-Identifier: MIT OR Apache-2.0

//! Colorized stack-trace emission.
//!
//! [`ColorizingHandler`] is the sink the topology builder attaches to the
//! root logger and the exceptions namespace when a coloring theme is
//! active. For a record with an attached error on an interactive stream it
//! replaces the inline trace with a three-part emission: the message line,
//! a traceback header, and the simplified, colorized frames plus the error
//! summary, ordered by the `reverse` flag. Everything is written in one
//! locked sequence and flushed, so concurrent emitters on the same stream
//! cannot interleave the triple.
//!
//! Whenever colorizing is not applicable (non-interactive stream, coloring
//! globally disabled, plain theme, no error payload) the handler degrades
//! to the plain emission path. Degrading is the failure mode too: a broken
//! trace must never prevent the message from appearing.

use std::io::Write;

use parking_lot::Mutex;

use crate::formatter::Formatter;
use crate::handler::{Handler, StreamTarget};
use crate::record::{ErrorInfo, Record};
use crate::theme::{FrameCategory, ResolvedColors};
use crate::trace::{simplify, StackFrame};

/// Uncolored, unsimplified trace block appended inline by plain handlers.
pub(crate) fn plain_trace_lines(error: &ErrorInfo) -> Vec<String> {
    let mut lines = vec!["Traceback (most recent call last):".to_string()];
    for frame in &error.chain {
        lines.push(format!(
            "  File \"{}\", line {}, in {}",
            frame.filename, frame.lineno, frame.function
        ));
        if !frame.snippet.is_empty() {
            lines.push(format!("    {}", frame.snippet));
        }
    }
    lines.push(error.summary_line());
    lines
}

/// Simplifier and rendering parameters, straight from the `exceptions`
/// configuration section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStyle {
    /// Hide frames before the dispatch boundary.
    pub simplified: bool,
    /// Verbose per-field labels (`File "x", line N, in f`) instead of the
    /// compact single-line form.
    pub conservative: bool,
    /// Most-recent-call-first ordering, summary directly under the header.
    pub reverse: bool,
    /// Column-align the compact form's fields.
    pub align: bool,
    /// Trailing path segments to keep; `0` keeps full paths.
    pub keep_path: usize,
    /// Function name marking the request-handling boundary.
    pub boundary: String,
}

impl Default for TraceStyle {
    fn default() -> Self {
        TraceStyle {
            simplified: true,
            conservative: false,
            reverse: false,
            align: true,
            keep_path: 0,
            boundary: crate::trace::DEFAULT_BOUNDARY.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ColorizingHandler {
    colors: ResolvedColors,
    style: TraceStyle,
    target: StreamTarget,
    formatter: Formatter,
    /// Overrides terminal detection; embedders that pipe a pty know better.
    interactive: Option<bool>,
    write_lock: Mutex<()>,
}

impl ColorizingHandler {
    pub fn new(
        colors: ResolvedColors,
        style: TraceStyle,
        target: StreamTarget,
        formatter: Formatter,
    ) -> Self {
        ColorizingHandler {
            colors,
            style,
            target,
            formatter,
            interactive: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    fn is_interactive(&self) -> bool {
        self.interactive
            .unwrap_or_else(|| self.target.is_interactive())
    }

    fn colorizing_applies(&self, record: &Record) -> bool {
        record.error.is_some()
            && self.is_interactive()
            && !self.colors.is_plain()
            && colored::control::SHOULD_COLORIZE.should_colorize()
    }

    /// The full colorized emission for a record with an error payload:
    /// message line, header, then summary and frames per `reverse`.
    /// Trailing whitespace is stripped from every line.
    pub fn render(&self, record: &Record, error: &ErrorInfo) -> Vec<String> {
        let level_color = record.level.as_str().to_ascii_lowercase();

        let mut lines = Vec::new();
        lines.push(self.colors.paint(&level_color, &self.formatter.format(record)));

        let header = if self.style.reverse {
            "Traceback (most recent call first):"
        } else {
            "Traceback (most recent call last):"
        };
        lines.push(self.colors.paint(FrameCategory::Backtrace.as_str(), header));

        let mut frames = simplify(
            &error.chain,
            self.style.simplified,
            self.style.keep_path,
            &self.style.boundary,
        );
        if self.style.reverse {
            lines.push(self.colors.paint(&level_color, &error.summary_line()));
            frames.reverse();
            lines.extend(self.frame_lines(&frames));
        } else {
            lines.extend(self.frame_lines(&frames));
            lines.push(self.colors.paint(&level_color, &error.summary_line()));
        }

        lines.iter().map(|l| l.trim_end().to_string()).collect()
    }

    fn frame_lines(&self, frames: &[StackFrame]) -> Vec<String> {
        if self.style.conservative {
            return frames.iter().flat_map(|f| self.verbose_frame(f)).collect();
        }

        // compact: "file:line in function  snippet", optionally aligned
        let (location_width, context_width) = if self.style.align {
            (
                frames
                    .iter()
                    .map(|f| f.filename.len() + 1 + digits(f.lineno))
                    .max()
                    .unwrap_or(0),
                frames.iter().map(|f| f.function.len()).max().unwrap_or(0),
            )
        } else {
            (0, 0)
        };

        frames
            .iter()
            .map(|frame| {
                let location_len = frame.filename.len() + 1 + digits(frame.lineno);
                let location = format!(
                    "{}:{}",
                    self.colors.paint(FrameCategory::Module.as_str(), &frame.filename),
                    self.colors
                        .paint(FrameCategory::Line.as_str(), &frame.lineno.to_string()),
                );
                let location_pad = " ".repeat(location_width.saturating_sub(location_len));
                let context_pad = " ".repeat(context_width.saturating_sub(frame.function.len()));
                format!(
                    "  {location}{location_pad} in {}{context_pad}  {}",
                    self.colors
                        .paint(FrameCategory::Context.as_str(), &frame.function),
                    self.colors.paint(FrameCategory::Call.as_str(), &frame.snippet),
                )
            })
            .collect()
    }

    fn verbose_frame(&self, frame: &StackFrame) -> Vec<String> {
        let mut lines = vec![format!(
            "  File \"{}\", line {}, in {}",
            self.colors.paint(FrameCategory::Module.as_str(), &frame.filename),
            self.colors
                .paint(FrameCategory::Line.as_str(), &frame.lineno.to_string()),
            self.colors
                .paint(FrameCategory::Context.as_str(), &frame.function),
        )];
        if !frame.snippet.is_empty() {
            lines.push(format!(
                "    {}",
                self.colors.paint(FrameCategory::Call.as_str(), &frame.snippet)
            ));
        }
        lines
    }
}

fn digits(n: u32) -> usize {
    n.to_string().len()
}

impl Handler for ColorizingHandler {
    fn emit(&self, record: &Record) {
        let lines = match (&record.error, self.colorizing_applies(record)) {
            (Some(error), true) => self.render(record, error),
            (Some(error), false) => {
                let mut lines = vec![self.formatter.format(record)];
                lines.extend(plain_trace_lines(error));
                lines
            }
            (None, _) => vec![self.formatter.format(record)],
        };
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
