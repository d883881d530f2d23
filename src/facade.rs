// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logging entry points the hosting application calls.
//!
//! Everything here routes through the installed registry. Logger names may
//! be relative: a leading dot resolves against the active application
//! namespace, which [`crate::topology::build_and_install`] assigns exactly
//! once at startup. Before installation (or in processes that never
//! configure logging) the relative namespace falls back to the bare
//! `nagare.application` prefix and records land on the default stderr
//! registry, so early or unconfigured logging still appears.
//!
//! ```
//! nagare_logging::info("starting up");
//! nagare_logging::log_to(".jobs", nagare_logging::Level::Debug, "queue drained");
//! ```

use std::sync::OnceLock;

use crate::level::Level;
use crate::qualname;
use crate::record::{ErrorInfo, Record};
use crate::registry::global_registry;

static APP_LOGGER_NAME: OnceLock<String> = OnceLock::new();

/// Records the active application logger name. Single assignment: later
/// calls are ignored, the first installation wins.
pub(crate) fn set_app_logger_name(name: &str) {
    let _ = APP_LOGGER_NAME.set(name.to_string());
}

/// The active application logger namespace.
pub fn app_logger_name() -> &'static str {
    APP_LOGGER_NAME
        .get()
        .map_or(qualname::APP_NAMESPACE, String::as_str)
}

/// Resolves a possibly relative logger name against the active namespace.
pub fn resolve_name(name: &str) -> String {
    qualname::resolve(app_logger_name(), name)
}

fn emit(name: &str, level: Level, message: String) {
    global_registry().dispatch(&Record::new(resolve_name(name), level, message));
}

/// Logs to the named (possibly relative) logger.
pub fn log_to(name: &str, level: Level, message: impl Into<String>) {
    emit(name, level, message.into());
}

/// Logs to the application logger.
pub fn log(level: Level, message: impl Into<String>) {
    emit(".", level, message.into());
}

pub fn debug(message: impl Into<String>) {
    log(Level::Debug, message);
}

pub fn info(message: impl Into<String>) {
    log(Level::Info, message);
}

pub fn warning(message: impl Into<String>) {
    log(Level::Warning, message);
}

pub fn error(message: impl Into<String>) {
    log(Level::Error, message);
}

pub fn critical(message: impl Into<String>) {
    log(Level::Critical, message);
}

/// Reports `error` with its captured call chain on the exceptions
/// namespace, where the colorizing handler renders it when one is
/// installed.
pub fn exception<E: std::error::Error>(message: impl Into<String>, error: &E) {
    let record = Record::new(resolve_name(".exceptions"), Level::Error, message.into())
        .with_error(ErrorInfo::from_error(error));
    global_registry().dispatch(&record);
}
