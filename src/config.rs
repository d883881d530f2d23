// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration surface.
//!
//! The hosting framework validates and hands over one configuration tree
//! per process. The well-known tables (`logger`, `handler`, `formatter`,
//! `exceptions`, `styles`) deserialize into the typed defaults below;
//! every other table is an extra section, and [`partition_sections`] splits
//! those by name prefix into logger / handler / formatter definitions the
//! way the section names promise (`logger_access` defines logger `access`).
//!
//! Two legacy spellings survive from older configuration files and are
//! coerced during deserialization: `propagate = "1"`/`"0"` strings, and
//! `handlers` given as one comma-delimited string instead of a list.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::colorize::TraceStyle;
use crate::error::ConfigError;
use crate::formatter::DEFAULT_FORMAT;
use crate::level::Level;
use crate::theme::ColorTheme;
use crate::trace::DEFAULT_BOUNDARY;

/// Handler constructor registry. Configuration refers to these by name;
/// anything else is rejected before installation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerClass {
    Stream,
    File,
}

impl FromStr for HandlerClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stream" => Ok(HandlerClass::Stream),
            "file" => Ok(HandlerClass::File),
            other => Err(ConfigError::UnknownHandlerClass(other.to_string())),
        }
    }
}

/// The whole logging configuration tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Active color theme name; anything unknown resolves to `nocolors`.
    pub style: String,
    /// User-defined themes, shadowing built-ins of the same name.
    pub styles: BTreeMap<String, ColorTheme>,
    /// Defaults for the synthetic application logger.
    pub logger: DefaultLoggerConfig,
    /// Defaults for the application logger's handler.
    pub handler: DefaultHandlerConfig,
    /// Default message pattern.
    pub formatter: DefaultFormatterConfig,
    /// Stack-trace simplifier / colorizing handler parameters.
    pub exceptions: ExceptionsConfig,
    /// `logger_*` / `handler_*` / `formatter_*` tables, untyped until
    /// partitioned.
    #[serde(flatten)]
    pub sections: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultLoggerConfig {
    pub level: String,
    #[serde(deserialize_with = "de_propagate")]
    pub propagate: bool,
}

impl Default for DefaultLoggerConfig {
    fn default() -> Self {
        // the application logger owns its own handler; propagating to root
        // would print everything twice
        DefaultLoggerConfig {
            level: "INFO".to_string(),
            propagate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultHandlerConfig {
    /// Filled with `stream` by the builder when unset.
    pub class: Option<String>,
    /// `stderr` (the default) or `stdout`.
    pub stream: Option<String>,
    pub filename: Option<String>,
    pub append: Option<bool>,
    #[serde(deserialize_with = "de_level_opt")]
    pub level: Option<Level>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultFormatterConfig {
    pub format: String,
}

impl Default for DefaultFormatterConfig {
    fn default() -> Self {
        DefaultFormatterConfig {
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExceptionsConfig {
    pub simplified: bool,
    pub conservative: bool,
    pub reverse: bool,
    pub align: bool,
    pub keep_path: usize,
    /// Function name of the hosting framework's request-dispatch boundary.
    pub boundary: String,
}

impl Default for ExceptionsConfig {
    fn default() -> Self {
        ExceptionsConfig {
            simplified: true,
            conservative: false,
            reverse: false,
            align: true,
            keep_path: 0,
            boundary: DEFAULT_BOUNDARY.to_string(),
        }
    }
}

impl From<&ExceptionsConfig> for TraceStyle {
    fn from(cfg: &ExceptionsConfig) -> Self {
        TraceStyle {
            simplified: cfg.simplified,
            conservative: cfg.conservative,
            reverse: cfg.reverse,
            align: cfg.align,
            keep_path: cfg.keep_path,
            boundary: cfg.boundary.clone(),
        }
    }
}

/// One `logger_<name>` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerSection {
    /// Possibly relative (leading dot) or the literal `root`.
    pub qualname: String,
    #[serde(default, deserialize_with = "de_level_opt")]
    pub level: Option<Level>,
    #[serde(default = "default_true", deserialize_with = "de_propagate")]
    pub propagate: bool,
    #[serde(default, deserialize_with = "de_handlers")]
    pub handlers: Vec<String>,
}

/// One `handler_<name>` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerSection {
    pub class: String,
    #[serde(default)]
    pub formatter: Option<String>,
    #[serde(default, deserialize_with = "de_level_opt")]
    pub level: Option<Level>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default = "default_true")]
    pub append: bool,
}

/// One `formatter_<name>` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatterSection {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn de_propagate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    struct Flag;

    impl de::Visitor<'_> for Flag {
        type Value = bool;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a boolean, or the legacy strings \"1\"/\"0\"")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                other => Err(E::custom(format!("invalid propagate flag `{other}`"))),
            }
        }
    }

    deserializer.deserialize_any(Flag)
}

fn de_handlers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    struct Handlers;

    impl<'de> de::Visitor<'de> for Handlers {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a list of handler names, or one comma-delimited string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut names = Vec::new();
            while let Some(name) = seq.next_element::<String>()? {
                names.push(name);
            }
            Ok(names)
        }
    }

    deserializer.deserialize_any(Handlers)
}

fn de_level_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Level>, D::Error> {
    let name: Option<String> = Option::deserialize(deserializer)?;
    name.map(|s| Level::from_str(&s).map_err(de::Error::custom))
        .transpose()
}

/// Extra sections, partitioned by prefix and keyed by the stripped name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraSections {
    pub loggers: BTreeMap<String, LoggerSection>,
    pub handlers: BTreeMap<String, HandlerSection>,
    pub formatters: BTreeMap<String, FormatterSection>,
}

/// Splits `sections` into logger / handler / formatter definitions.
///
/// Tables with none of the three prefixes belong to other plugins sharing
/// the configuration file and are ignored. A table that carries a known
/// prefix but does not deserialize is a configuration error naming the
/// offending section.
pub fn partition_sections(
    sections: &BTreeMap<String, toml::Value>,
) -> Result<ExtraSections, ConfigError> {
    let mut extra = ExtraSections::default();

    for (name, value) in sections {
        if let Some(key) = name.strip_prefix("logger_") {
            extra.loggers.insert(key.to_string(), typed(name, value)?);
        } else if let Some(key) = name.strip_prefix("handler_") {
            extra.handlers.insert(key.to_string(), typed(name, value)?);
        } else if let Some(key) = name.strip_prefix("formatter_") {
            extra.formatters.insert(key.to_string(), typed(name, value)?);
        }
    }

    Ok(extra)
}

fn typed<T: serde::de::DeserializeOwned>(
    section: &str,
    value: &toml::Value,
) -> Result<T, ConfigError> {
    value
        .clone()
        .try_into()
        .map_err(|source| ConfigError::Section {
            section: section.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> LoggingConfig {
        toml::from_str(text).expect("config should parse")
    }

    #[test]
    fn empty_config_gets_the_documented_defaults() {
        let config = parse("");
        assert_eq!(config.style, "");
        assert_eq!(config.logger.level, "INFO");
        assert!(!config.logger.propagate);
        assert_eq!(config.formatter.format, DEFAULT_FORMAT);
        assert!(config.exceptions.simplified);
        assert_eq!(config.exceptions.boundary, DEFAULT_BOUNDARY);
        assert_eq!(config.exceptions.keep_path, 0);
    }

    #[test]
    fn styles_deserialize_into_themes() {
        let config = parse(
            r#"
            style = "solar"

            [styles.solar]
            error = ["bright-red", "bold"]
            line = ["yellow"]
            "#,
        );
        assert_eq!(config.style, "solar");
        let theme = &config.styles["solar"];
        assert_eq!(theme.0["error"], vec!["bright-red", "bold"]);
    }

    #[test]
    fn extra_sections_partition_by_prefix() {
        let config = parse(
            r#"
            [logger_access]
            qualname = ".access"
            level = "DEBUG"

            [handler_access]
            class = "file"
            filename = "/var/log/access.log"

            [formatter_brief]
            format = "{message}"

            [unrelated_plugin]
            whatever = true
            "#,
        );
        let extra = partition_sections(&config.sections).unwrap();
        assert_eq!(extra.loggers.len(), 1);
        assert_eq!(extra.handlers.len(), 1);
        assert_eq!(extra.formatters.len(), 1);
        assert_eq!(extra.loggers["access"].qualname, ".access");
        assert_eq!(extra.loggers["access"].level, Some(Level::Debug));
        assert_eq!(extra.handlers["access"].class, "file");
        assert_eq!(extra.formatters["brief"].format, "{message}");
    }

    #[test]
    fn legacy_propagate_strings_coerce() {
        let config = parse(
            r#"
            [logger_a]
            qualname = ".a"
            propagate = "0"

            [logger_b]
            qualname = ".b"
            propagate = "1"

            [logger_c]
            qualname = ".c"
            "#,
        );
        let extra = partition_sections(&config.sections).unwrap();
        assert!(!extra.loggers["a"].propagate);
        assert!(extra.loggers["b"].propagate);
        // sections default to propagating
        assert!(extra.loggers["c"].propagate);
    }

    #[test]
    fn comma_delimited_handlers_split() {
        let config = parse(
            r#"
            [logger_a]
            qualname = ".a"
            handlers = "console, file"

            [logger_b]
            qualname = ".b"
            handlers = ["console", "file"]
            "#,
        );
        let extra = partition_sections(&config.sections).unwrap();
        assert_eq!(extra.loggers["a"].handlers, vec!["console", "file"]);
        assert_eq!(extra.loggers["b"].handlers, vec!["console", "file"]);
    }

    #[test]
    fn malformed_section_names_the_culprit() {
        let config = parse(
            r#"
            [logger_broken]
            level = "DEBUG"
            "#,
        );
        // qualname is required
        let err = partition_sections(&config.sections).unwrap_err();
        assert!(err.to_string().contains("logger_broken"));
    }

    #[test]
    fn bad_level_is_rejected_at_parse_time() {
        let config = parse(
            r#"
            [logger_a]
            qualname = ".a"
            level = "LOUD"
            "#,
        );
        assert!(partition_sections(&config.sections).is_err());
    }

    #[test]
    fn handler_class_registry() {
        assert_eq!("stream".parse::<HandlerClass>().unwrap(), HandlerClass::Stream);
        assert_eq!("file".parse::<HandlerClass>().unwrap(), HandlerClass::File);
        assert!(matches!(
            "logging.StreamHandler".parse::<HandlerClass>(),
            Err(ConfigError::UnknownHandlerClass(_))
        ));
    }
}
