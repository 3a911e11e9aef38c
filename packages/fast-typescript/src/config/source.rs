//! Configuration source reduction.
//!
//! The host may hand the plugin a boolean, a path, an inline tsconfig object
//! or a function producing any of those. [`reduce_config_option`] turns that
//! into exactly one [`ConfigSource`] before anything is loaded.

use crate::error::ConfigSourceError;
use serde_json::Value;
use std::fmt;

/// Deferred configuration, called once while the plugin is created.
pub type ConfigGetter = Box<dyn FnOnce() -> ConfigOption + Send>;

/// Configuration as the host supplies it.
pub enum ConfigOption {
    /// `true` loads `./tsconfig.json`, `false` disables configuration.
    Bool(bool),
    /// Path to a tsconfig file. The empty string disables configuration.
    Path(String),
    /// tsconfig content given inline.
    Object(Value),
    Getter(ConfigGetter),
}

impl ConfigOption {
    pub fn getter(f: impl FnOnce() -> ConfigOption + Send + 'static) -> Self {
        ConfigOption::Getter(Box::new(f))
    }

    fn type_name(&self) -> &'static str {
        match self {
            ConfigOption::Bool(_) => "boolean",
            ConfigOption::Path(_) => "string",
            ConfigOption::Object(value) => json_type_name(value),
            ConfigOption::Getter(_) => "function",
        }
    }
}

impl Default for ConfigOption {
    fn default() -> Self {
        ConfigOption::Bool(true)
    }
}

impl fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOption::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ConfigOption::Path(p) => f.debug_tuple("Path").field(p).finish(),
            ConfigOption::Object(v) => f.debug_tuple("Object").field(v).finish(),
            ConfigOption::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

impl From<bool> for ConfigOption {
    fn from(value: bool) -> Self {
        ConfigOption::Bool(value)
    }
}

impl From<&str> for ConfigOption {
    fn from(value: &str) -> Self {
        ConfigOption::Path(value.to_string())
    }
}

impl From<String> for ConfigOption {
    fn from(value: String) -> Self {
        ConfigOption::Path(value)
    }
}

impl From<Value> for ConfigOption {
    fn from(value: Value) -> Self {
        ConfigOption::Object(value)
    }
}

/// Canonical configuration source handed to the chain loader.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// The conventional `./tsconfig.json`.
    UseDefault,
    /// No configuration file: empty compiler options.
    Disabled,
    Path(String),
    InlineObject(Value),
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        // typeof null and arrays is "object" for the host.
        Value::Null | Value::Array(_) | Value::Object(_) => "object",
    }
}

/// Reduces a host option to one canonical source, calling a getter at most once.
pub fn reduce_config_option(option: ConfigOption) -> Result<ConfigSource, ConfigSourceError> {
    let option = match option {
        ConfigOption::Getter(getter) => {
            let produced = getter();
            let rejected = match &produced {
                ConfigOption::Getter(_) => true,
                ConfigOption::Object(value) => !is_config_value(value),
                _ => false,
            };
            if rejected {
                return Err(ConfigSourceError::WrongGetterReturnType(produced.type_name()));
            }
            produced
        }
        other => other,
    };

    match option {
        ConfigOption::Bool(true) => Ok(ConfigSource::UseDefault),
        ConfigOption::Bool(false) => Ok(ConfigSource::Disabled),
        ConfigOption::Path(path) => Ok(path_source(path)),
        ConfigOption::Object(Value::Bool(true)) => Ok(ConfigSource::UseDefault),
        ConfigOption::Object(Value::Bool(false)) => Ok(ConfigSource::Disabled),
        ConfigOption::Object(Value::String(path)) => Ok(path_source(path)),
        ConfigOption::Object(value @ Value::Object(_)) => Ok(ConfigSource::InlineObject(value)),
        ConfigOption::Object(value) => Err(ConfigSourceError::InvalidValue(value.to_string())),
        ConfigOption::Getter(_) => Err(ConfigSourceError::WrongGetterReturnType("function")),
    }
}

fn is_config_value(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::String(_) | Value::Object(_))
}

fn path_source(path: String) -> ConfigSource {
    if path.is_empty() {
        ConfigSource::Disabled
    } else {
        ConfigSource::Path(path)
    }
}
