// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# nagare-logging

nagare-logging turns the declarative logging sections of an application's
configuration into a live logging topology: named loggers, the handlers
they write through, the formatters those handlers render with, and an
optional colorized stack-trace renderer for reported errors.

# The problem

A hosting framework loads applications as plugins and hands each plugin its
slice of one configuration file. The logging slice looks like this:

```toml
style = "dark"

[logger]
level = "INFO"

[exceptions]
simplified = true
keep_path = 2

[logger_access]
qualname = ".access"
level = "DEBUG"
handlers = "access"

[handler_access]
class = "file"
filename = "/var/log/demo/access.log"
formatter = "brief"

[formatter_brief]
format = "{asctime} {message}"
```

Turning that into something coherent is less trivial than it looks: names
may be relative to an application namespace that only exists at runtime,
handler and formatter references cross sections, half the entities are
defaulted rather than written down, and the whole thing must install
atomically so a typo in one section cannot leave a half-built registry
behind.

# The shape

[`topology::build_and_install`] is the single entry point, called once per
process at startup:

1. the configuration deserializes into [`config::LoggingConfig`] and the
   `logger_*`/`handler_*`/`formatter_*` sections are partitioned,
2. logger qualnames resolve against `nagare.application.<app_name>`
   ([`qualname`]),
3. the active color theme resolves to concrete escape sequences
   ([`theme`]),
4. the application logger, the root and the exceptions namespace are
   synthesized where configuration left them out,
5. every live handler is constructed, and the finished [`registry::Registry`]
   is installed process-wide, also claiming the `log` crate's global logger
   so third-party crates' records flow through the same topology.

Afterwards the application logs through the facade functions re-exported at
the crate root:

```
nagare_logging::info("worker pool ready");
```

and reports errors with their captured call chain:

```
let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
nagare_logging::exception("request failed", &err);
```

When a coloring theme is active and the stream is an interactive terminal,
reported errors render as a simplified traceback: frames before the
framework's dispatch boundary are hidden, paths are shortened, and each
frame field is colorized per the theme ([`colorize`]).

# Failure philosophy

Configuration errors are fatal at startup and abort the whole installation.
Emission failures after startup are swallowed: a logger that cannot write,
or a trace that cannot be rendered, degrades silently rather than taking
the application down.
*/

mod colorize;
pub mod config;
mod error;
mod facade;
mod formatter;
mod handler;
mod level;
pub mod qualname;
mod record;
pub mod registry;
pub mod theme;
pub mod topology;
pub mod trace;

pub use colorize::{ColorizingHandler, TraceStyle};
pub use config::LoggingConfig;
pub use error::ConfigError;
pub use facade::{
    app_logger_name, critical, debug, error, exception, info, log, log_to, resolve_name, warning,
};
pub use formatter::{Formatter, DEFAULT_FORMAT};
pub use handler::{FileHandler, Handler, MemoryHandler, StreamHandler, StreamTarget};
pub use level::Level;
pub use record::{ErrorInfo, Record};
pub use theme::{ColorTheme, FrameCategory, ResolvedColors};
pub use topology::{build_and_install, Topology};
