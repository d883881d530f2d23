// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call chains and their simplification.
//!
//! A [`CallChain`] is the ordered sequence of stack frames captured when an
//! error was raised, outermost call first. Chains are transient: one is
//! built per emitted record and discarded after rendering.
//!
//! Simplification hides the hosting framework's dispatch machinery: when a
//! frame for the configured boundary function appears in the chain,
//! everything before its deepest occurrence is dropped so the visible
//! trace starts where control entered user code.

use std::backtrace::Backtrace;

/// One captured stack frame.
///
/// `filename` is truncated to a configured number of trailing path segments
/// by [`simplify`]; until then it holds the full path. `snippet` is the
/// source line at the call site when the capture mechanism knows it, empty
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub filename: String,
    pub lineno: u32,
    pub function: String,
    pub snippet: String,
}

impl StackFrame {
    pub fn new(
        filename: impl Into<String>,
        lineno: u32,
        function: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        StackFrame {
            filename: filename.into(),
            lineno,
            function: function.into(),
            snippet: snippet.into(),
        }
    }
}

/// Ordered frames, outermost call first.
pub type CallChain = Vec<StackFrame>;

/// Default boundary function name, overridable via `exceptions.boundary`.
pub const DEFAULT_BOUNDARY: &str = "handle_request";

/// True when `function` names the boundary, ignoring any leading module
/// path and a trailing symbol hash.
fn is_boundary(function: &str, boundary: &str) -> bool {
    if function == boundary {
        return true;
    }
    let mut tail = function;
    if let Some(last) = function.rsplit("::").next() {
        // std symbols end in a hash segment like `::h1f0a9b3c2d4e5f60`
        if function.len() > last.len() + 2
            && last.len() == 17
            && last.starts_with('h')
            && last[1..].chars().all(|c| c.is_ascii_hexdigit())
        {
            tail = &function[..function.len() - last.len() - 2];
        }
    }
    tail.rsplit("::").next() == Some(boundary)
}

/// Keeps the last `keep` path segments of `filename`; `0` keeps everything.
fn truncate_path(filename: &str, keep: usize) -> String {
    if keep == 0 {
        return filename.to_string();
    }
    let segments: Vec<&str> = filename
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return filename.to_string();
    }
    let start = segments.len().saturating_sub(keep);
    segments[start..].join("/")
}

/// Produces the frames to render for `chain`.
///
/// With `simplified` set, frames before the deepest boundary frame are
/// discarded (the whole chain is kept when no boundary frame exists). Each
/// retained frame's path is truncated to the last `keep_path` segments.
/// Output preserves chain order; callers reverse it themselves when they
/// want most-recent-first. An empty chain yields an empty sequence.
pub fn simplify(
    chain: &[StackFrame],
    simplified: bool,
    keep_path: usize,
    boundary: &str,
) -> Vec<StackFrame> {
    let start = if simplified {
        chain
            .iter()
            .rposition(|frame| is_boundary(&frame.function, boundary))
            .unwrap_or(0)
    } else {
        0
    };

    chain[start..]
        .iter()
        .map(|frame| StackFrame {
            filename: truncate_path(&frame.filename, keep_path),
            ..frame.clone()
        })
        .collect()
}

/// Captures the current call chain, outermost call first.
///
/// Best effort: frames the platform cannot symbolicate are skipped, and
/// snippets are unavailable from a runtime capture.
pub fn capture() -> CallChain {
    parse_backtrace(&Backtrace::force_capture().to_string())
}

/// Parses the display output of [`std::backtrace::Backtrace`].
///
/// The format is one `N: symbol` line per frame, optionally followed by an
/// `at path:line:column` location line. Std prints frames innermost first;
/// the returned chain is reordered to outermost first. Frames with no
/// location line are dropped, they are runtime internals with nothing to
/// show an operator.
pub fn parse_backtrace(text: &str) -> CallChain {
    let mut frames = Vec::new();
    let mut pending: Option<(String, Option<(String, u32)>)> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some((index, symbol)) = trimmed.split_once(": ") {
            if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
                if let Some((function, Some((filename, lineno)))) = pending.take() {
                    frames.push(StackFrame::new(filename, lineno, function, ""));
                }
                pending = Some((symbol.trim().to_string(), None));
                continue;
            }
        }
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some((_, loc)) = pending.as_mut() {
                if loc.is_none() {
                    // path:line or path:line:column
                    let mut parts = location.rsplitn(3, ':');
                    let last = parts.next();
                    let middle = parts.next();
                    let head = parts.next();
                    *loc = match (head, middle, last) {
                        (Some(path), Some(line_no), Some(_col)) => {
                            line_no.parse().ok().map(|n| (path.to_string(), n))
                        }
                        (None, Some(path), Some(line_no)) => {
                            line_no.parse().ok().map(|n| (path.to_string(), n))
                        }
                        _ => None,
                    };
                }
            }
        }
    }
    if let Some((function, Some((filename, lineno)))) = pending {
        frames.push(StackFrame::new(filename, lineno, function, ""));
    }

    frames.reverse();
    frames
}
