//! Error types for prerender-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while locating, parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the offending path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested config file does not exist.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// The configuration parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Why a string was rejected as a [`crate::Slug`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("slug is empty")]
    Empty,

    #[error("slug '{0}' contains a path separator")]
    PathSeparator(String),

    #[error("slug '{0}' is a relative path component")]
    Relative(String),

    #[error("slug '{0}' must not carry an .html suffix")]
    HtmlSuffix(String),

    #[error("slug '{0}' contains whitespace or control characters")]
    InvalidCharacter(String),
}
