// SPDX-License-Identifier: MIT OR Apache-2.0

//! The live logging registry.
//!
//! A [`Registry`] is the installed form of a topology: a map from logger
//! qualname to its level threshold, propagation flag and handlers. Dispatch
//! is hierarchical, python-logging style: a record emitted for
//! `a.b.c` walks `a.b.c`, `a.b`, `a`, `""`, handing the record to every
//! configured node's handlers until a node switches propagation off. The
//! effective threshold is the nearest ancestor's explicit level, the root's
//! level as a last resort.
//!
//! # Process-wide slot
//!
//! One registry is active per process. The slot initializes lazily with a
//! stderr-only default so logging works before (or without) configuration,
//! and is replaced exactly once by [`install`]. Installation also claims
//! the `log` crate's global logger, so `log::info!` from third-party
//! crates flows through the same topology; claiming it twice is how a
//! double installation is detected and refused.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::ConfigError;
use crate::formatter::Formatter;
use crate::handler::{Handler, StreamHandler, StreamTarget};
use crate::level::Level;
use crate::record::Record;

/// Threshold applied when neither the logger nor any ancestor sets one.
pub const FALLBACK_LEVEL: Level = Level::Warning;

#[derive(Debug)]
pub struct LoggerNode {
    pub level: Option<Level>,
    pub propagate: bool,
    pub handlers: Vec<Arc<dyn Handler>>,
}

#[derive(Debug)]
pub struct Registry {
    nodes: BTreeMap<String, LoggerNode>,
}

/// Yields `qualname`, then each dotted ancestor, ending with the root `""`.
pub(crate) fn ancestors(qualname: &str) -> impl Iterator<Item = &str> {
    let mut current = Some(qualname);
    std::iter::from_fn(move || {
        let name = current?;
        current = if name.is_empty() {
            None
        } else {
            Some(name.rsplit_once('.').map_or("", |(head, _)| head))
        };
        Some(name)
    })
}

impl Registry {
    pub fn new(nodes: BTreeMap<String, LoggerNode>) -> Self {
        Registry { nodes }
    }

    /// The uninstalled fallback: warnings and above to stderr.
    fn stderr_default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            String::new(),
            LoggerNode {
                level: Some(FALLBACK_LEVEL),
                propagate: false,
                handlers: vec![Arc::new(StreamHandler::new(
                    StreamTarget::Stderr,
                    Formatter::default(),
                    None,
                ))],
            },
        );
        Registry { nodes }
    }

    pub fn node(&self, qualname: &str) -> Option<&LoggerNode> {
        self.nodes.get(qualname)
    }

    /// The threshold governing records emitted under `qualname`.
    pub fn effective_level(&self, qualname: &str) -> Level {
        ancestors(qualname)
            .find_map(|name| self.nodes.get(name).and_then(|node| node.level))
            .unwrap_or(FALLBACK_LEVEL)
    }

    pub fn enabled(&self, qualname: &str, level: Level) -> bool {
        level < Level::None && level >= self.effective_level(qualname)
    }

    /// Routes the record to every handler its logger hierarchy reaches.
    pub fn dispatch(&self, record: &Record) {
        if !self.enabled(&record.qualname, record.level) {
            return;
        }
        for name in ancestors(&record.qualname) {
            if let Some(node) = self.nodes.get(name) {
                for handler in &node.handlers {
                    handler.emit(record);
                }
                if !node.propagate {
                    break;
                }
            }
        }
    }

    pub fn flush(&self) {
        for node in self.nodes.values() {
            for handler in &node.handlers {
                handler.flush();
            }
        }
    }

    /// The coarse ceiling handed to `log::set_max_level`, so disabled
    /// levels are rejected before they reach the bridge.
    pub fn max_level_filter(&self) -> log::LevelFilter {
        let lowest = self
            .nodes
            .values()
            .filter_map(|node| node.level)
            .min()
            .unwrap_or(FALLBACK_LEVEL);
        match lowest {
            Level::Debug => log::LevelFilter::Debug,
            Level::Info => log::LevelFilter::Info,
            Level::Warning => log::LevelFilter::Warn,
            Level::Error | Level::Critical => log::LevelFilter::Error,
            Level::None => log::LevelFilter::Off,
        }
    }
}

static REGISTRY: OnceLock<RwLock<Arc<Registry>>> = OnceLock::new();

fn registry_slot() -> &'static RwLock<Arc<Registry>> {
    REGISTRY.get_or_init(|| RwLock::new(Arc::new(Registry::stderr_default())))
}

/// The currently active registry. Never empty: before installation this is
/// the stderr-only default.
pub fn global_registry() -> Arc<Registry> {
    registry_slot().read().clone()
}

/// Replaces the process registry and claims the `log` facade. Called once,
/// by the topology builder, at startup.
pub(crate) fn install(registry: Arc<Registry>) -> Result<(), ConfigError> {
    log::set_boxed_logger(Box::new(LogBridge)).map_err(|_| ConfigError::AlreadyInstalled)?;
    log::set_max_level(registry.max_level_filter());
    *registry_slot().write() = registry;
    Ok(())
}

/// Routes `log` crate records into the active registry. The record's
/// target is its qualname, so `log::info!(target: "sqlx.query", ...)` and
/// plain module-path targets slot into the dotted hierarchy unchanged.
struct LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        global_registry().enabled(metadata.target(), Level::from_log_level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from_log_level(record.level());
        let registry = global_registry();
        if !registry.enabled(record.target(), level) {
            return;
        }
        registry.dispatch(&Record::new(
            record.target(),
            level,
            record.args().to_string(),
        ));
    }

    fn flush(&self) {
        global_registry().flush();
    }
}
