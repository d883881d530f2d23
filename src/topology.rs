// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building and installing the logging topology.
//!
//! [`build_and_install`] is the one externally invoked entry point, called
//! exactly once per process during startup. It merges the defaulted
//! configuration with the partitioned `logger_*`/`handler_*`/`formatter_*`
//! sections into a [`Topology`], synthesizes the application logger and the
//! root where configuration left them out, checks referential integrity,
//! constructs every live handler, and only then swaps the finished registry
//! in. Any error along the way aborts the whole installation; there is no
//! partially configured state to clean up.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::colorize::{ColorizingHandler, TraceStyle};
use crate::config::{
    partition_sections, HandlerClass, HandlerSection, LoggerSection, LoggingConfig,
};
use crate::error::ConfigError;
use crate::formatter::Formatter;
use crate::handler::{FileHandler, Handler, StreamHandler, StreamTarget};
use crate::level::Level;
use crate::qualname;
use crate::registry::{self, LoggerNode, Registry, FALLBACK_LEVEL};
use crate::theme::{builtin_themes, resolve_colors, ResolvedColors};

/// One named logger in the resolved topology. Qualnames are absolute here;
/// resolution against the application namespace already happened.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerSpec {
    pub qualname: String,
    pub level: Option<Level>,
    pub propagate: bool,
    pub handlers: Vec<String>,
}

/// Constructor selector for a live handler. Configuration can only name
/// `Stream` and `File`; `Colorize` is synthesized by the builder for the
/// root and exceptions defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Stream,
    File,
    Colorize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSpec {
    pub kind: HandlerKind,
    pub formatter: Option<String>,
    pub level: Option<Level>,
    pub stream: StreamTarget,
    pub filename: Option<String>,
    pub append: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatterSpec {
    pub format: String,
}

/// The fully resolved configuration: every referenced name is expected to
/// exist, which [`Topology::validate`] enforces before anything is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    pub loggers: BTreeMap<String, LoggerSpec>,
    pub handlers: BTreeMap<String, HandlerSpec>,
    pub formatters: BTreeMap<String, FormatterSpec>,
}

impl Topology {
    /// Merges `config` into a topology for `app_name`, synthesizing the
    /// application logger, the root logger and the exceptions namespace
    /// exactly as installation would. Pure with respect to process state.
    pub fn from_config(app_name: &str, config: &LoggingConfig) -> Result<Self, ConfigError> {
        let app_logger = qualname::app_logger_name(app_name);
        let colors = resolve_colors(&config.style, &config.styles, &builtin_themes());

        let extra = partition_sections(&config.sections)?;

        let mut topology = Topology::default();

        for section in extra.loggers.values() {
            let spec = logger_spec(&app_logger, section);
            topology.loggers.insert(spec.qualname.clone(), spec);
        }
        for (name, section) in &extra.handlers {
            topology
                .handlers
                .insert(name.clone(), handler_spec(section)?);
        }
        for (name, section) in &extra.formatters {
            topology.formatters.insert(
                name.clone(),
                FormatterSpec {
                    format: section.format.clone(),
                },
            );
        }

        topology.synthesize_app_logger(&app_logger, config)?;
        topology.synthesize_root(&colors);
        topology.synthesize_exceptions_logger(&app_logger, &colors);
        topology.validate()?;
        Ok(topology)
    }

    /// The application logger and its own stderr handler/formatter, unless
    /// a `logger_*` section already resolved to the application's qualname.
    fn synthesize_app_logger(
        &mut self,
        app_logger: &str,
        config: &LoggingConfig,
    ) -> Result<(), ConfigError> {
        if self.loggers.contains_key(app_logger) {
            return Ok(());
        }

        let level = config
            .logger
            .level
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "logger.level".to_string(),
                reason: format!("unknown level `{}`", config.logger.level),
            })?;

        let class = match &config.handler.class {
            Some(name) => name.parse::<HandlerClass>()?,
            None => HandlerClass::Stream,
        };
        let handler = HandlerSpec {
            kind: match class {
                HandlerClass::Stream => HandlerKind::Stream,
                HandlerClass::File => HandlerKind::File,
            },
            formatter: Some(app_logger.to_string()),
            level: config.handler.level,
            stream: parse_stream(config.handler.stream.as_deref())?,
            filename: config.handler.filename.clone(),
            append: config.handler.append.unwrap_or(true),
        };

        self.loggers.insert(
            app_logger.to_string(),
            LoggerSpec {
                qualname: app_logger.to_string(),
                level: Some(level),
                propagate: config.logger.propagate,
                handlers: vec![app_logger.to_string()],
            },
        );
        self.handlers.insert(app_logger.to_string(), handler);
        self.formatters.insert(
            app_logger.to_string(),
            FormatterSpec {
                format: config.formatter.format.clone(),
            },
        );
        Ok(())
    }

    /// A default root: warnings and above to stderr, colorized when the
    /// active theme actually colors.
    fn synthesize_root(&mut self, colors: &ResolvedColors) {
        if self.loggers.contains_key("") {
            return;
        }
        let kind = if colors.is_plain() {
            HandlerKind::Stream
        } else {
            HandlerKind::Colorize
        };
        self.handlers.entry("root".to_string()).or_insert(HandlerSpec {
            kind,
            formatter: None,
            level: None,
            stream: StreamTarget::Stderr,
            filename: None,
            append: true,
        });
        self.loggers.insert(
            String::new(),
            LoggerSpec {
                qualname: String::new(),
                level: Some(FALLBACK_LEVEL),
                propagate: false,
                handlers: vec!["root".to_string()],
            },
        );
    }

    /// The dedicated exceptions namespace gets a colorizing sink when
    /// coloring is active and nothing is attached there yet.
    fn synthesize_exceptions_logger(&mut self, app_logger: &str, colors: &ResolvedColors) {
        if colors.is_plain() {
            return;
        }
        let name = format!("{app_logger}.exceptions");
        let has_sink = self
            .loggers
            .get(&name)
            .is_some_and(|spec| !spec.handlers.is_empty());
        if has_sink {
            return;
        }
        self.handlers
            .entry("exceptions".to_string())
            .or_insert(HandlerSpec {
                kind: HandlerKind::Colorize,
                formatter: None,
                level: None,
                stream: StreamTarget::Stderr,
                filename: None,
                append: true,
            });
        self.loggers.insert(
            name.clone(),
            LoggerSpec {
                qualname: name,
                level: None,
                propagate: false,
                handlers: vec!["exceptions".to_string()],
            },
        );
    }

    /// Referential integrity: every handler a logger names and every
    /// formatter a handler names must exist; the root must exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        debug_assert!(self.loggers.contains_key(""));
        for spec in self.loggers.values() {
            for handler in &spec.handlers {
                if !self.handlers.contains_key(handler) {
                    return Err(ConfigError::UndefinedHandler {
                        logger: spec.qualname.clone(),
                        handler: handler.clone(),
                    });
                }
            }
        }
        for (name, spec) in &self.handlers {
            if let Some(formatter) = &spec.formatter {
                if !self.formatters.contains_key(formatter) {
                    return Err(ConfigError::UndefinedFormatter {
                        handler: name.clone(),
                        formatter: formatter.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Constructs every live handler and wires the registry nodes.
    pub fn build_registry(
        &self,
        colors: &ResolvedColors,
        style: &TraceStyle,
    ) -> Result<Registry, ConfigError> {
        self.validate()?;
        let mut live: BTreeMap<String, Arc<dyn Handler>> = BTreeMap::new();
        for (name, spec) in &self.handlers {
            let formatter = match &spec.formatter {
                Some(fname) => Formatter::new(&self.formatters[fname].format),
                None => Formatter::default(),
            };
            let handler: Arc<dyn Handler> = match spec.kind {
                HandlerKind::Stream => {
                    Arc::new(StreamHandler::new(spec.stream, formatter, spec.level))
                }
                HandlerKind::File => {
                    let filename =
                        spec.filename
                            .as_deref()
                            .ok_or_else(|| ConfigError::InvalidValue {
                                key: format!("handler_{name}.filename"),
                                reason: "file handlers need a filename".to_string(),
                            })?;
                    Arc::new(FileHandler::open(
                        filename,
                        spec.append,
                        formatter,
                        spec.level,
                    )?)
                }
                HandlerKind::Colorize => Arc::new(ColorizingHandler::new(
                    colors.clone(),
                    style.clone(),
                    spec.stream,
                    formatter,
                )),
            };
            live.insert(name.clone(), handler);
        }

        let mut nodes = BTreeMap::new();
        for (name, spec) in &self.loggers {
            nodes.insert(
                name.clone(),
                LoggerNode {
                    level: spec.level,
                    propagate: spec.propagate,
                    handlers: spec.handlers.iter().map(|h| live[h].clone()).collect(),
                },
            );
        }
        Ok(Registry::new(nodes))
    }
}

fn logger_spec(app_logger: &str, section: &LoggerSection) -> LoggerSpec {
    LoggerSpec {
        qualname: qualname::resolve(app_logger, &section.qualname),
        level: section.level,
        propagate: section.propagate,
        handlers: section.handlers.clone(),
    }
}

fn handler_spec(section: &HandlerSection) -> Result<HandlerSpec, ConfigError> {
    let class = section.class.parse::<HandlerClass>()?;
    Ok(HandlerSpec {
        kind: match class {
            HandlerClass::Stream => HandlerKind::Stream,
            HandlerClass::File => HandlerKind::File,
        },
        formatter: section.formatter.clone(),
        level: section.level,
        stream: parse_stream(section.stream.as_deref())?,
        filename: section.filename.clone(),
        append: section.append,
    })
}

fn parse_stream(stream: Option<&str>) -> Result<StreamTarget, ConfigError> {
    match stream {
        None | Some("stderr") | Some("ext://sys.stderr") => Ok(StreamTarget::Stderr),
        Some("stdout") | Some("ext://sys.stdout") => Ok(StreamTarget::Stdout),
        Some(other) => Err(ConfigError::InvalidValue {
            key: "stream".to_string(),
            reason: format!("expected `stderr` or `stdout`, got `{other}`"),
        }),
    }
}

/// Builds the topology for `app_name` from `config` and installs it: live
/// handlers are constructed, the registry replaces the process default,
/// the `log` facade is claimed, and the active application namespace is
/// recorded for the facade. Errors abort before anything is installed.
pub fn build_and_install(app_name: &str, config: &LoggingConfig) -> Result<(), ConfigError> {
    let app_logger = qualname::app_logger_name(app_name);
    let colors = resolve_colors(&config.style, &config.styles, &builtin_themes());
    let style = TraceStyle::from(&config.exceptions);

    let topology = Topology::from_config(app_name, config)?;
    let registry = topology.build_registry(&colors, &style)?;

    registry::install(Arc::new(registry))?;
    crate::facade::set_app_logger_name(&app_logger);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::DEFAULT_FORMAT;

    fn config(text: &str) -> LoggingConfig {
        toml::from_str(text).expect("config should parse")
    }

    const APP: &str = "nagare.application.demo";

    #[test]
    fn default_config_synthesizes_app_and_root() {
        let topology = Topology::from_config("demo", &config("")).unwrap();

        let app = &topology.loggers[APP];
        assert_eq!(app.level, Some(Level::Info));
        assert!(!app.propagate);
        assert_eq!(app.handlers, vec![APP.to_string()]);

        let handler = &topology.handlers[APP];
        assert_eq!(handler.kind, HandlerKind::Stream);
        assert_eq!(handler.stream, StreamTarget::Stderr);
        assert_eq!(handler.formatter.as_deref(), Some(APP));
        assert_eq!(topology.formatters[APP].format, DEFAULT_FORMAT);

        let root = &topology.loggers[""];
        assert_eq!(root.level, Some(Level::Warning));
        assert_eq!(root.handlers, vec!["root".to_string()]);
        // nocolors: a plain stream handler serves the root
        assert_eq!(topology.handlers["root"].kind, HandlerKind::Stream);
    }

    #[test]
    fn coloring_theme_switches_root_to_the_colorizing_handler() {
        let topology = Topology::from_config("demo", &config(r#"style = "light""#)).unwrap();
        assert_eq!(topology.handlers["root"].kind, HandlerKind::Colorize);
        // and the exceptions namespace appears with its own sink
        let exceptions = &topology.loggers["nagare.application.demo.exceptions"];
        assert!(!exceptions.propagate);
        assert_eq!(
            topology.handlers["exceptions"].kind,
            HandlerKind::Colorize
        );
    }

    #[test]
    fn nocolors_leaves_the_exceptions_namespace_alone() {
        let topology = Topology::from_config("demo", &config("")).unwrap();
        assert!(!topology
            .loggers
            .contains_key("nagare.application.demo.exceptions"));
    }

    #[test]
    fn relative_qualnames_resolve_against_the_app_logger() {
        let topology = Topology::from_config(
            "demo",
            &config(
                r#"
                [logger_jobs]
                qualname = ".jobs"
                level = "DEBUG"
                "#,
            ),
        )
        .unwrap();
        let jobs = &topology.loggers["nagare.application.demo.jobs"];
        assert_eq!(jobs.level, Some(Level::Debug));
        assert!(jobs.propagate);
    }

    #[test]
    fn a_section_resolving_to_the_app_logger_suppresses_synthesis() {
        let topology = Topology::from_config(
            "demo",
            &config(
                r#"
                [logger_app]
                qualname = "."
                level = "ERROR"
                "#,
            ),
        )
        .unwrap();
        let app = &topology.loggers[APP];
        assert_eq!(app.level, Some(Level::Error));
        // no synthesized handler trio in that case
        assert!(app.handlers.is_empty());
        assert!(!topology.handlers.contains_key(APP));
    }

    #[test]
    fn root_section_suppresses_root_synthesis() {
        let topology = Topology::from_config(
            "demo",
            &config(
                r#"
                [logger_root]
                qualname = "root"
                level = "CRITICAL"
                "#,
            ),
        )
        .unwrap();
        assert_eq!(topology.loggers[""].level, Some(Level::Critical));
        assert!(!topology.handlers.contains_key("root"));
    }

    #[test]
    fn dangling_handler_reference_fails_validation() {
        let err = Topology::from_config(
            "demo",
            &config(
                r#"
                [logger_a]
                qualname = ".a"
                handlers = "missing"
                "#,
            ),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedHandler { .. }));
    }

    #[test]
    fn dangling_formatter_reference_fails_validation() {
        let err = Topology::from_config(
            "demo",
            &config(
                r#"
                [handler_console]
                class = "stream"
                formatter = "missing"
                "#,
            ),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedFormatter { .. }));
    }

    #[test]
    fn unknown_handler_class_aborts_the_build() {
        let err = Topology::from_config(
            "demo",
            &config(
                r#"
                [handler_console]
                class = "logging.StreamHandler"
                "#,
            ),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownHandlerClass(_)));
    }

    #[test]
    fn bad_default_level_aborts_the_build() {
        let err = Topology::from_config("demo", &config(r#"logger = { level = "LOUD" }"#))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn file_handler_without_filename_fails_at_build_time() {
        let topology = Topology::from_config(
            "demo",
            &config(
                r#"
                [logger_a]
                qualname = ".a"
                handlers = "disk"

                [handler_disk]
                class = "file"
                "#,
            ),
        )
        .unwrap();
        let colors = resolve_colors("nocolors", &Default::default(), &builtin_themes());
        let err = topology
            .build_registry(&colors, &TraceStyle::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn built_registry_routes_through_configured_levels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.log");
        let topology = Topology::from_config(
            "demo",
            &config(&format!(
                r#"
                [logger_disk]
                qualname = ".disk"
                level = "DEBUG"
                propagate = "0"
                handlers = "disk"

                [handler_disk]
                class = "file"
                filename = "{}"
                formatter = "brief"

                [formatter_brief]
                format = "{{levelname}} {{message}}"
                "#,
                path.display()
            )),
        )
        .unwrap();
        let colors = resolve_colors("nocolors", &Default::default(), &builtin_themes());
        let registry = topology
            .build_registry(&colors, &TraceStyle::default())
            .unwrap();

        registry.dispatch(&crate::record::Record::new(
            "nagare.application.demo.disk",
            Level::Debug,
            "spun down",
        ));
        registry.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "DEBUG spun down\n");
    }

    #[test]
    fn stream_names_parse_including_legacy_spellings() {
        assert_eq!(parse_stream(None).unwrap(), StreamTarget::Stderr);
        assert_eq!(parse_stream(Some("stdout")).unwrap(), StreamTarget::Stdout);
        assert_eq!(
            parse_stream(Some("ext://sys.stderr")).unwrap(),
            StreamTarget::Stderr
        );
        assert!(parse_stream(Some("ext://fd/7")).is_err());
    }
}
