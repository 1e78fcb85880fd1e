//! # devws-orchestration
//!
//! The orchestration core of devws: a synchronous, ordered lifecycle event
//! bus, the container-runtime boundary with a docker CLI implementation, the
//! project reconciliation engine and the preset resolver.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use devws_orchestration::{DockerCli, DockerComposeCli, EventBus, ProjectOrchestrator};
//! use devws_store::{PresetRepository, ProjectRepository, StorePaths};
//!
//! # async fn example() -> devws_orchestration::Result<()> {
//! let paths = StorePaths::new("/var/lib/devws");
//! let bus = Arc::new(EventBus::new());
//! let orchestrator = ProjectOrchestrator::new(
//!     Arc::new(DockerCli::new()),
//!     Arc::new(DockerComposeCli::new()),
//!     bus,
//!     ProjectRepository::new(paths.clone()),
//!     PresetRepository::new(paths, None),
//! );
//! let mut project = orchestrator.projects().get_by_name("demo").await?;
//! orchestrator.start(&mut project, false, false, false).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

mod events;
mod image;
mod orchestrator;
mod plugin;
mod remote;
mod resolver;
mod runtime;

pub use events::{EventBus, EventContext, HandlerFuture, LifecycleEvent, Subscription};
pub use image::{dockerfile_image_tag, preset_image_tag};
pub use orchestrator::ProjectOrchestrator;
pub use plugin::{load_plugins, DomainsPlugin, Plugin, PluginContext};
pub use remote::{GithubSource, RemoteSource};
pub use resolver::{Installed, PresetResolver, BASELINE_RANGE};
pub use runtime::{
    BuildRequest, ComposeRuntime, ContainerHandle, ContainerRuntime, ContainerSpec,
    ContainerStatus, DockerCli, DockerComposeCli,
};

/// Error types for orchestration operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Store errors
    #[error("Store error: {0}")]
    Store(#[from] devws_store::Error),

    /// Version parsing errors
    #[error("Version error: {0}")]
    Version(#[from] devws_version::Error),

    /// Project, preset or container absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Named script absent from the project
    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    /// Backing container does not exist
    #[error("Project is not running: {0}")]
    NotRunning(String),

    /// No remote tag or branch satisfies the requested constraint
    #[error("No version satisfies {0}")]
    VersionNotFound(String),

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Name collision, e.g. installing a preset whose name is taken by
    /// another source
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Container runtime call failed
    #[error("Runtime failure: {0}")]
    Runtime(String),

    /// Remote preset source request failed
    #[error("Remote source error: {0}")]
    Remote(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
