//! # devws-store
//!
//! The declarative data model behind devws: `Project` and `Preset` entities
//! as plain serde data holders, and file-backed repositories that load,
//! search and persist them against a config-file store.
//!
//! Layout on disk (under the application data directory):
//!
//! - `config.json` — the index of registered projects and presets
//! - `projects/<name>/config.json` — per-project entity body
//! - `presets/<name>/` — materialized github presets
//!
//! External presets keep their `config.json` at their registered path;
//! internal presets live in a bundled directory and are read-only.

#![warn(missing_docs)]
#![warn(unsafe_code)]

mod index;
mod preset;
mod project;
mod repository;

pub use index::{AppIndex, PresetRef, ProjectRef, StorePaths};
pub use preset::{OptionSpec, Preset, PresetSource};
pub use project::{parse_port, parse_volume, Project, ProjectType, ServiceOverrides};
pub use repository::{PresetFilter, PresetRepository, ProjectFilter, ProjectRepository};

/// Error type for store operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed entity field or write against a read-only source
    #[error("Validation error: {0}")]
    Validation(String),

    /// Identity collision, e.g. a duplicate project name at a different path
    #[error("Conflict: {0}")]
    Conflict(String),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
