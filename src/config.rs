//! Toolchain configuration.
//!
//! Defaults can be overridden from the environment and then from command-line
//! flags, in that order.

use tracing::warn;

/// Default number of diagnostics reported before a phase gives up.
pub const DEFAULT_MAX_ERRORS: usize = 15;

/// Default size of the virtual machine's memory in bytes.
pub const DEFAULT_MEMORY_SIZE: usize = 8 * 1024;

/// Settings shared by the compiler, assembler, and virtual machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_errors: usize,
    pub memory_size: usize,
    pub optimize: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            memory_size: DEFAULT_MEMORY_SIZE,
            optimize: true,
            debug: false,
        }
    }
}

impl Config {
    /// Build a configuration from `CPRL_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration using `lookup` to fetch override values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("CPRL_MAX_ERRORS") {
            match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_errors = n,
                _ => warn!(value = %value, "ignoring invalid CPRL_MAX_ERRORS"),
            }
        }

        if let Some(value) = lookup("CPRL_MEMORY_SIZE") {
            match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.memory_size = n,
                _ => warn!(value = %value, "ignoring invalid CPRL_MEMORY_SIZE"),
            }
        }

        if let Some(value) = lookup("CPRL_OPTIMIZE") {
            match parse_switch(&value) {
                Some(on) => config.optimize = on,
                None => warn!(value = %value, "ignoring invalid CPRL_OPTIMIZE"),
            }
        }

        config
    }
}

/// Parse an `on`/`off` switch value.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.memory_size, 8192);
        assert!(config.optimize);
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("CPRL_MAX_ERRORS", "3"),
            ("CPRL_MEMORY_SIZE", "65536"),
            ("CPRL_OPTIMIZE", "off"),
        ]);
        assert_eq!(config.max_errors, 3);
        assert_eq!(config.memory_size, 65536);
        assert!(!config.optimize);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = config_with(&[("CPRL_MAX_ERRORS", "lots"), ("CPRL_MEMORY_SIZE", "0")]);
        assert_eq!(config.max_errors, DEFAULT_MAX_ERRORS);
        assert_eq!(config.memory_size, DEFAULT_MEMORY_SIZE);
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch("off"), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }
}
