// SPDX-License-Identifier: MIT OR Apache-2.0

//! Color themes and their resolution to concrete escape sequences.
//!
//! A theme maps message categories (the five severities) and stack-frame
//! categories (backtrace/line/module/context/call) to ordered lists of color
//! token names. Resolution happens once at configuration time: each token
//! list collapses into a single concatenated ANSI escape string, and the
//! result is held for the life of the process.
//!
//! Token names reference a fixed table (standard and bright foreground
//! colors, `on_*` backgrounds, a few attributes). Matching is
//! case-insensitive and tolerant of `-` vs `_`; unknown tokens contribute
//! nothing, so a theme written entirely with unknown tokens degrades to no
//! coloring rather than failing.

use std::collections::BTreeMap;
use std::sync::Once;

use serde::Deserialize;

use crate::level::Level;

/// Escape sequence that returns the terminal to its default rendition.
pub const RESET: &str = "\x1b[0m";

/// Parts of a rendered stack frame that can be colored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameCategory {
    /// The whole trace block (header line included).
    Backtrace,
    /// The line number field.
    Line,
    /// The file / module field.
    Module,
    /// The enclosing function field.
    Context,
    /// The source snippet field.
    Call,
}

impl FrameCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameCategory::Backtrace => "backtrace",
            FrameCategory::Line => "line",
            FrameCategory::Module => "module",
            FrameCategory::Context => "context",
            FrameCategory::Call => "call",
        }
    }
}

/// A named theme: category name → ordered color token list.
///
/// Deserialized directly from a `styles.<name>` configuration table, e.g.
///
/// ```toml
/// [styles.solar]
/// error = ["bright-red", "bold"]
/// line = ["yellow"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColorTheme(pub BTreeMap<String, Vec<String>>);

impl ColorTheme {
    fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        ColorTheme(
            pairs
                .iter()
                .map(|(cat, tokens)| {
                    (
                        cat.to_string(),
                        tokens.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

/// Escape sequences resolved from a theme, one per category.
///
/// Categories absent from the source theme resolve to the empty string,
/// which renders text unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColors {
    by_category: BTreeMap<String, String>,
}

impl ResolvedColors {
    pub fn get(&self, category: &str) -> &str {
        self.by_category.get(category).map_or("", String::as_str)
    }

    pub fn level(&self, level: Level) -> &str {
        self.get(&level.as_str().to_ascii_lowercase())
    }

    pub fn frame(&self, category: FrameCategory) -> &str {
        self.get(category.as_str())
    }

    /// True when no category carries any escape sequence, i.e. the theme
    /// resolved to `nocolors` behavior.
    pub fn is_plain(&self) -> bool {
        self.by_category.values().all(String::is_empty)
    }

    /// Wraps `text` in the category's escape sequence plus a reset, or
    /// returns it unchanged when the category is uncolored.
    pub fn paint(&self, category: &str, text: &str) -> String {
        let escape = self.get(category);
        if escape.is_empty() || text.is_empty() {
            text.to_string()
        } else {
            format!("{escape}{text}{RESET}")
        }
    }
}

/// The three built-in themes, keyed by name.
pub fn builtin_themes() -> BTreeMap<String, ColorTheme> {
    let mut themes = BTreeMap::new();
    themes.insert("nocolors".to_string(), ColorTheme::default());
    themes.insert(
        "light".to_string(),
        ColorTheme::from_pairs(&[
            ("debug", &["cyan"]),
            ("info", &["green"]),
            ("warning", &["yellow"]),
            ("error", &["red"]),
            ("critical", &["red", "bold"]),
            ("backtrace", &[]),
            ("line", &["yellow"]),
            ("module", &["cyan"]),
            ("context", &["bold"]),
            ("call", &["blue"]),
        ]),
    );
    themes.insert(
        "dark".to_string(),
        ColorTheme::from_pairs(&[
            ("debug", &["bright_cyan"]),
            ("info", &["bright_green"]),
            ("warning", &["bright_yellow"]),
            ("error", &["bright_red"]),
            ("critical", &["bright_white", "on_red"]),
            ("backtrace", &[]),
            ("line", &["bright_yellow"]),
            ("module", &["bright_cyan"]),
            ("context", &["bold"]),
            ("call", &["bright_blue"]),
        ]),
    );
    themes
}

/// Escape code for one color token, or `""` for names outside the table.
fn token_code(token: &str) -> &'static str {
    match token.to_ascii_lowercase().replace('-', "_").as_str() {
        "black" => "\x1b[30m",
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        "white" => "\x1b[37m",
        "bright_black" => "\x1b[90m",
        "bright_red" => "\x1b[91m",
        "bright_green" => "\x1b[92m",
        "bright_yellow" => "\x1b[93m",
        "bright_blue" => "\x1b[94m",
        "bright_magenta" => "\x1b[95m",
        "bright_cyan" => "\x1b[96m",
        "bright_white" => "\x1b[97m",
        "on_black" => "\x1b[40m",
        "on_red" => "\x1b[41m",
        "on_green" => "\x1b[42m",
        "on_yellow" => "\x1b[43m",
        "on_blue" => "\x1b[44m",
        "on_magenta" => "\x1b[45m",
        "on_cyan" => "\x1b[46m",
        "on_white" => "\x1b[47m",
        "bold" => "\x1b[1m",
        "dim" => "\x1b[2m",
        "italic" => "\x1b[3m",
        "underline" => "\x1b[4m",
        _ => "",
    }
}

static ANSI_SETUP: Once = Once::new();

/// Enables ANSI rendering where the platform needs explicit activation.
/// Runs at most once per process no matter how often resolution happens.
fn enable_ansi_support() {
    ANSI_SETUP.call_once(|| {
        #[cfg(windows)]
        {
            let _ = colored::control::set_virtual_terminal(true);
        }
    });
}

/// Materializes the escape sequences for `theme_name`.
///
/// User themes shadow built-ins of the same name; a name found in neither
/// falls back to `nocolors`. This lookup never fails.
pub fn resolve_colors(
    theme_name: &str,
    user_themes: &BTreeMap<String, ColorTheme>,
    builtins: &BTreeMap<String, ColorTheme>,
) -> ResolvedColors {
    enable_ansi_support();

    let theme = user_themes
        .get(theme_name)
        .or_else(|| builtins.get(theme_name))
        .cloned()
        .unwrap_or_default();

    let by_category = theme
        .0
        .iter()
        .map(|(category, tokens)| {
            let escape: String = tokens.iter().map(|t| token_code(t)).collect();
            (category.to_ascii_lowercase(), escape)
        })
        .collect();

    ResolvedColors { by_category }
}
