// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration errors.
//!
//! Every failure mode here is fatal at startup: the topology builder aborts
//! the whole installation on the first error, so an operator sees the
//! problem before the application starts serving. Nothing is ever partially
//! registered.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A handler section named a class outside the fixed class registry.
    #[error("unknown handler class `{0}` (expected `stream` or `file`)")]
    UnknownHandlerClass(String),

    /// A logger listed a handler name with no `handler_<name>` section.
    #[error("logger `{logger}` references undefined handler `{handler}`")]
    UndefinedHandler { logger: String, handler: String },

    /// A handler named a formatter with no `formatter_<name>` section.
    #[error("handler `{handler}` references undefined formatter `{formatter}`")]
    UndefinedFormatter { handler: String, formatter: String },

    /// An option value failed semantic validation.
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    /// A `logger_*`/`handler_*`/`formatter_*` section did not deserialize.
    #[error("malformed section `{section}`: {source}")]
    Section {
        section: String,
        #[source]
        source: toml::de::Error,
    },

    /// A file handler's target could not be opened at build time.
    #[error("cannot open log file `{path}`: {source}")]
    OpenLogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `build_and_install` ran twice in the same process.
    #[error("logging topology is already installed")]
    AlreadyInstalled,
}
