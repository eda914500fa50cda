//! Error types for ticketlog

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using TicketlogError
pub type Result<T> = std::result::Result<T, TicketlogError>;

/// Main error type for ticketlog operations
#[derive(Debug, Error)]
pub enum TicketlogError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Hook-related errors
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// No commit or date range could be resolved
    #[error("No range defined for the changelog. Pass --range or --date, or set source_control.default_range")]
    NoRange,

    /// A range was given but could not be understood
    #[error("Invalid range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    /// Release flag used without a name and without a generator
    #[error("--release was passed without a name, but no release.generator is configured. Pass a release name or configure release.generator")]
    MissingReleaseGenerator,

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// A revision in the range does not exist
    #[error("Unknown revision '{0}'")]
    UnknownRevision(String),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Hook-related errors
#[derive(Debug, Error)]
pub enum HookError {
    /// Hook could not be started or exited unsuccessfully
    #[error("Hook '{name}' failed running `{command}`: {message}")]
    ExecutionFailed {
        name: String,
        command: String,
        message: String,
    },

    /// Hook ran but produced nothing usable
    #[error("Hook '{name}' produced no output")]
    EmptyOutput { name: String },
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Unknown output format
    #[error("Unknown changelog format: {0}")]
    UnknownFormat(String),

    /// Failed to render changelog
    #[error("Failed to render changelog: {0}")]
    RenderFailed(String),
}

impl TicketlogError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this is a configuration problem the user can fix
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
