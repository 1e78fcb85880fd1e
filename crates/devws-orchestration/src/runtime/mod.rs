//! The container-runtime boundary.
//!
//! The orchestrator never talks to a runtime wire protocol directly; it
//! consumes these traits. The default implementations shell out to the
//! `docker` CLI.

mod compose;
mod docker;

pub use compose::DockerComposeCli;
pub use docker::DockerCli;

use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Observed container status, authoritative over any cached assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    /// Created but never started
    Created,
    /// Running
    Running,
    /// Paused
    Paused,
    /// Restarting
    Restarting,
    /// Exited
    Exited,
    /// Dead
    Dead,
    /// Anything the runtime reports that we do not model
    Unknown,
}

impl ContainerStatus {
    /// Parse the status string reported by `docker inspect`.
    pub fn from_runtime(raw: &str) -> Self {
        match raw.trim() {
            "created" => ContainerStatus::Created,
            "running" => ContainerStatus::Running,
            "paused" => ContainerStatus::Paused,
            "restarting" => ContainerStatus::Restarting,
            "exited" => ContainerStatus::Exited,
            "dead" => ContainerStatus::Dead,
            _ => ContainerStatus::Unknown,
        }
    }

    /// True for statuses a start call may act on.
    pub fn is_startable(&self) -> bool {
        matches!(self, ContainerStatus::Created | ContainerStatus::Exited)
    }
}

/// Handle to an existing container.
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    /// Runtime container id
    pub id: String,
    /// Container name
    pub name: String,
    /// Status observed when the handle was obtained
    pub status: ContainerStatus,
}

/// Everything needed to create a container.
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    /// Container name
    pub name: String,
    /// Image reference
    pub image: String,
    /// Environment variables
    pub env: BTreeMap<String, String>,
    /// `source:destination[:options]` mounts with absolute sources
    pub volumes: Vec<String>,
    /// `host:container[/proto]` port mappings
    pub ports: Vec<String>,
    /// Extra host → ip entries
    pub extra_hosts: BTreeMap<String, String>,
    /// Container labels
    pub labels: BTreeMap<String, String>,
}

/// Everything needed to build an image.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Tag for the built image
    pub tag: String,
    /// Build context directory
    pub context: PathBuf,
    /// Dockerfile path relative to the context, runtime default when absent
    pub dockerfile: Option<String>,
    /// Build arguments
    pub build_args: BTreeMap<String, String>,
    /// Image labels
    pub labels: BTreeMap<String, String>,
}

/// Container and image primitives consumed by the orchestrator.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Look a container up by name.
    async fn get_container(&self, name: &str) -> Result<Option<ContainerHandle>>;

    /// Create a container from the spec. The container is not started.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle>;

    /// Start a created or exited container.
    async fn start_container(&self, handle: &ContainerHandle) -> Result<()>;

    /// Stop and remove a named container. A failing stop is tolerated and
    /// logged; the removal proceeds regardless since the end state is the
    /// same. Removing an absent container is a no-op.
    async fn remove_container(&self, name: &str) -> Result<()>;

    /// Re-query the observed status of a container.
    async fn inspect(&self, handle: &ContainerHandle) -> Result<ContainerStatus>;

    /// Pull an image.
    async fn pull_image(&self, tag: &str) -> Result<()>;

    /// Whether an image with this tag exists locally.
    async fn image_exists(&self, tag: &str) -> Result<bool>;

    /// Remove a local image.
    async fn remove_image(&self, tag: &str) -> Result<()>;

    /// Build an image.
    async fn build_image(&self, request: &BuildRequest) -> Result<()>;

    /// Execute a command inside a running container with the calling
    /// process's stdio attached. Returns the command's exit code.
    async fn exec(&self, handle: &ContainerHandle, cmd: &[String], tty: bool) -> Result<i32>;

    /// Attach the calling process's stdio to a running container.
    async fn attach(&self, handle: &ContainerHandle) -> Result<()>;

    /// Stream container logs to the calling process's stdout. With `follow`
    /// the stream runs until the container stops; otherwise the current log
    /// content is fetched once.
    async fn logs(&self, handle: &ContainerHandle, follow: bool, tail: Option<u32>) -> Result<()>;
}

/// Compose stack primitives consumed by the orchestrator.
#[async_trait]
pub trait ComposeRuntime: Send + Sync {
    /// Bring a compose stack up.
    async fn up(
        &self,
        file: &Path,
        env: &BTreeMap<String, String>,
        detach: bool,
    ) -> Result<()>;

    /// Tear a compose stack down.
    async fn down(&self, file: &Path) -> Result<()>;

    /// Build the images of a compose stack.
    async fn build(&self, file: &Path, build_args: &BTreeMap<String, String>) -> Result<()>;

    /// Execute a command inside a service container of a running stack.
    async fn exec(
        &self,
        file: &Path,
        service: &str,
        cmd: &[String],
        tty: bool,
    ) -> Result<i32>;
}
