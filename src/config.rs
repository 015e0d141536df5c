//! Session configuration

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Tunables for one interpreter session
///
/// Every key is optional when loaded from TOML:
///
/// ```toml
/// max_call_depth = 500
/// main_module_name = "__main__"
/// source_name = "script.py"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Nested guest calls allowed before RuntimeError
    pub max_call_depth: usize,
    /// Value bound to the global `__name__`
    pub main_module_name: String,
    /// File name shown in syntax diagnostics
    pub source_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: 200,
            main_module_name: "__main__".to_string(),
            source_name: "<input>".to_string(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    #[diagnostic(code(serpent::config))]
    Toml(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
