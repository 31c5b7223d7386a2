use std::{env, path::PathBuf};

/// Default number of trace positions attached to a runtime error.
pub const DEFAULT_TRACE_DEPTH: usize = 5;
/// Default limit on nested user function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;
/// Default node name for processes.
pub const DEFAULT_NODE_NAME: &str = "local";

/// Interpreter settings.
///
/// Built from the environment with [`Config::from_env`]; the CLI overrides
/// individual fields afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root directory searched (under `lib/`) for imports, after the working
    /// directory. Read from `BLUE_INSTALL_PATH`.
    pub install_path:   Option<PathBuf>,
    /// Whether diagnostics use ANSI color. Disabled by `BLUE_NO_COLOR` or
    /// `NO_COLOR`.
    pub color:          bool,
    /// Node part of every process key. Read from `BLUE_NODE_NAME`.
    pub node_name:      String,
    /// Trace positions attached to errors. Read from `BLUE_TRACE_DEPTH`.
    pub trace_depth:    usize,
    /// Maximum nesting of user function calls. Read from
    /// `BLUE_MAX_CALL_DEPTH`.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { install_path:   None,
               color:          true,
               node_name:      DEFAULT_NODE_NAME.to_string(),
               trace_depth:    DEFAULT_TRACE_DEPTH,
               max_call_depth: DEFAULT_MAX_CALL_DEPTH, }
    }
}

impl Config {
    /// Reads the configuration from environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    ///
    /// # Example
    /// ```
    /// use blue::config::Config;
    ///
    /// let config = Config::from_env();
    /// assert!(config.max_call_depth > 0);
    /// ```
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let set = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
        let number = |key: &str, default: usize| {
            lookup(key).and_then(|v| v.trim().parse().ok())
                       .filter(|n| *n > 0)
                       .unwrap_or(default)
        };

        Self { install_path:   lookup("BLUE_INSTALL_PATH").filter(|p| !p.is_empty())
                                                          .map(PathBuf::from),
               color:          !(set("BLUE_NO_COLOR") || set("NO_COLOR")),
               node_name:      lookup("BLUE_NODE_NAME").filter(|n| !n.is_empty())
                                                       .unwrap_or(defaults.node_name),
               trace_depth:    number("BLUE_TRACE_DEPTH", defaults.trace_depth),
               max_call_depth: number("BLUE_MAX_CALL_DEPTH", defaults.max_call_depth), }
    }

    /// Overrides the node name.
    #[must_use]
    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = node_name.into();
        self
    }

    /// Overrides color output.
    #[must_use]
    pub const fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs.iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect::<HashMap<_, _>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(from_pairs(&[]), Config::default());
    }

    #[test]
    fn no_color_disables_color() {
        assert!(!from_pairs(&[("NO_COLOR", "1")]).color);
        assert!(!from_pairs(&[("BLUE_NO_COLOR", "yes")]).color);
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = from_pairs(&[("BLUE_TRACE_DEPTH", "many"), ("BLUE_MAX_CALL_DEPTH", "12")]);
        assert_eq!(config.trace_depth, DEFAULT_TRACE_DEPTH);
        assert_eq!(config.max_call_depth, 12);
    }
}
