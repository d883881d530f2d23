// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logger name resolution.
//!
//! Configured logger names follow a small convention: a leading dot means
//! "relative to the application logger", the literal `root` means the
//! registry's universal root (the empty qualname), and anything else is an
//! absolute dotted name used verbatim.

/// Namespace prefix every application logger lives under.
pub const APP_NAMESPACE: &str = "nagare.application";

/// The qualname of the synthetic application logger for `app_name`.
pub fn app_logger_name(app_name: &str) -> String {
    format!("{APP_NAMESPACE}.{app_name}")
}

/// Resolves a configured `qualname` against the application logger's name.
///
/// ```
/// use nagare_logging::qualname::resolve;
///
/// let app = "nagare.application.demo";
/// assert_eq!(resolve(app, "."), "nagare.application.demo");
/// assert_eq!(resolve(app, ".jobs"), "nagare.application.demo.jobs");
/// assert_eq!(resolve(app, "root"), "");
/// assert_eq!(resolve(app, "sqlx.query"), "sqlx.query");
/// ```
pub fn resolve(app_logger_name: &str, qualname: &str) -> String {
    if qualname == "." {
        app_logger_name.to_string()
    } else if qualname.starts_with('.') {
        format!("{app_logger_name}{qualname}")
    } else if qualname == "root" {
        String::new()
    } else {
        qualname.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = "nagare.application.demo";

    #[test]
    fn lone_dot_is_the_app_logger() {
        assert_eq!(resolve(APP, "."), APP);
    }

    #[test]
    fn leading_dot_is_app_relative() {
        assert_eq!(resolve(APP, ".foo"), "nagare.application.demo.foo");
        assert_eq!(resolve(APP, ".foo.bar"), "nagare.application.demo.foo.bar");
    }

    #[test]
    fn root_maps_to_the_empty_qualname() {
        assert_eq!(resolve(APP, "root"), "");
    }

    #[test]
    fn absolute_names_pass_through() {
        assert_eq!(resolve(APP, "bar.baz"), "bar.baz");
        assert_eq!(resolve(APP, "rooted"), "rooted");
        assert_eq!(resolve(APP, ""), "");
    }

    #[test]
    fn app_logger_name_uses_the_fixed_namespace() {
        assert_eq!(app_logger_name("demo"), APP);
    }
}
