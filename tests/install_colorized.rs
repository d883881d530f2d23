// SPDX-License-Identifier: MIT OR Apache-2.0

//! Installation of a coloring theme: the exceptions logger and the
//! colorizing root handler come into existence, and the exception facade
//! routes through them without disturbing anything.

use nagare_logging::topology::HandlerKind;
use nagare_logging::{build_and_install, registry, Level, LoggingConfig, Topology};

const APP: &str = "nagare.application.demo";

#[derive(Debug, thiserror::Error)]
#[error("connection refused by {peer}")]
struct ConnectError {
    peer: String,
}

#[test]
fn light_theme_installs_the_exceptions_pipeline() {
    let config: LoggingConfig =
        toml::from_str(r#"style = "light""#).expect("config should parse");

    // Shape first: the root handler switches to the colorizing class and
    // a dedicated exceptions sink appears next to the application logger.
    let topology = Topology::from_config("demo", &config).expect("topology should build");
    assert_eq!(topology.handlers["root"].kind, HandlerKind::Colorize);
    assert_eq!(topology.handlers["exceptions"].kind, HandlerKind::Colorize);
    let exceptions = &topology.loggers[&format!("{APP}.exceptions")];
    assert_eq!(exceptions.handlers, vec!["exceptions".to_string()]);

    build_and_install("demo", &config).expect("install should succeed");

    let installed = registry::global_registry();
    let node = installed
        .node(&format!("{APP}.exceptions"))
        .expect("exceptions logger should exist");
    assert_eq!(node.handlers.len(), 1);
    assert_eq!(installed.effective_level(&format!("{APP}.exceptions")), Level::Info);

    // Reporting an error must never panic, whatever the terminal looks
    // like. Output goes to stderr, uncolored when not interactive.
    let err = ConnectError {
        peer: "10.0.0.7:5432".into(),
    };
    nagare_logging::exception("proxy request failed", &err);
    installed.flush();
}
