//! Error types
//!
//! Every fatal condition reaches the host as a [`PluginError`] whose
//! `Display` is the user-facing message and nothing else.

use thiserror::Error;

/// Fatal errors reported through the host's single error path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// Unknown transformer name, unusable configuration source or a
    /// configuration file error.
    #[error("{0}")]
    StartupConfiguration(String),

    #[error("{0}")]
    BackendLoad(String),

    /// A backend rejected or failed on one file. The message is the backend's, unmodified.
    #[error("{message}")]
    Transform { file: String, message: String },
}

impl PluginError {
    pub fn message(&self) -> &str {
        match self {
            PluginError::StartupConfiguration(message) | PluginError::BackendLoad(message) => message,
            PluginError::Transform { message, .. } => message,
        }
    }
}

/// Why a transformer backend could not be instantiated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The backend's optional dependency is not installed.
    #[error("optional dependency '{dependency}' is not installed")]
    MissingDependency {
        dependency: String,
        /// How to install it, as a full sentence.
        hint: String,
    },

    #[error("{0}")]
    Other(String),
}

impl LoadError {
    pub fn missing(dependency: impl Into<String>, hint: impl Into<String>) -> Self {
        LoadError::MissingDependency {
            dependency: dependency.into(),
            hint: hint.into(),
        }
    }
}

/// A configuration source that does not reduce to a usable form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigSourceError {
    #[error("Wrong return type from function parameter: expected a TsConfigJson object, got '{0}'.")]
    WrongGetterReturnType(&'static str),

    #[error("Invalid value '{0}' for tsconfig parameter.")]
    InvalidValue(String),
}

impl From<ConfigSourceError> for PluginError {
    fn from(err: ConfigSourceError) -> Self {
        PluginError::StartupConfiguration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = PluginError::Transform {
            file: "/p/src/a.ts".to_string(),
            message: "Unexpected token".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected token");
        assert_eq!(err.message(), "Unexpected token");
        assert_eq!(
            PluginError::from(ConfigSourceError::InvalidValue("42".to_string())).to_string(),
            "Invalid value '42' for tsconfig parameter."
        );
    }

    #[test]
    fn getter_type_error_names_the_type() {
        assert_eq!(
            ConfigSourceError::WrongGetterReturnType("number").to_string(),
            "Wrong return type from function parameter: expected a TsConfigJson object, got 'number'."
        );
    }
}
