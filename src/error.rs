//! # Error Handling
//!
//! This module defines the centralized error type for `mod-composer`. It uses
//! `thiserror` to build a single `Error` enum covering every failure the build
//! pipeline can hit, each variant carrying enough context to name the
//! offending flag, coordinate, or file.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. The build-level kinds are
//!   `MissingConfigurationKey`, `InvalidFlagValue`,
//!   `DependencyResolutionFailure`, `ManifestAttributeConflict` and
//!   `ArchiveAssembly`; the rest wrap parse and I/O failures from the
//!   libraries the pipeline uses.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Every error is fatal to the build invocation. Nothing in the library
//! retries; callers decide what to report and exit with a non-zero status.

use thiserror::Error;

/// Main error type for mod-composer operations
#[derive(Error, Debug)]
pub enum Error {
    /// A flag consumed by a component is absent from the flag set.
    #[error("Missing configuration key: '{key}'")]
    MissingConfigurationKey { key: String },

    /// A flag is present but its value cannot be interpreted.
    #[error("Invalid value for flag '{key}': '{value}' (expected {expected})")]
    InvalidFlagValue {
        key: String,
        value: String,
        expected: String,
    },

    /// A dependency could not be found in any of its repositories.
    #[error("Could not resolve dependency {coordinate} (tried: {})", tried.join(", "))]
    DependencyResolutionFailure {
        coordinate: String,
        /// Source identifiers in the order they were attempted
        tried: Vec<String>,
    },

    /// Two manifest attributes share a key but disagree on the value.
    #[error("Manifest attribute conflict for '{key}': '{existing}' vs '{incoming}'")]
    ManifestAttributeConflict {
        key: String,
        existing: String,
        incoming: String,
    },

    /// Building the output archive failed.
    #[error("Archive assembly error for {}: {message}", path.display())]
    ArchiveAssembly {
        path: std::path::PathBuf,
        message: String,
    },

    /// The project descriptor could not be interpreted.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A dependency coordinate is not of the form `group:name:version`.
    #[error("Invalid dependency coordinate '{coordinate}': {message}")]
    InvalidCoordinate { coordinate: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A properties file parsing error, wrapped from `ini::ParseError`.
    #[error("Properties parsing error: {0}")]
    Properties(#[from] ini::ParseError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A zip archive error, wrapped from `zip::result::ZipError`.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
