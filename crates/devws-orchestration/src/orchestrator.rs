//! The project reconciliation engine.
//!
//! Every lifecycle method re-queries the container runtime before acting;
//! the observed container state is authoritative over anything the entity
//! file claims. Events fire around state changes so feature listeners can
//! mutate the project before it is persisted.

use crate::events::{EventBus, LifecycleEvent};
use crate::image::{dockerfile_image_tag, preset_image_tag};
use crate::runtime::{
    BuildRequest, ComposeRuntime, ContainerHandle, ContainerRuntime, ContainerSpec,
    ContainerStatus,
};
use crate::{Error, Result};
use devws_store::{parse_volume, Preset, PresetRepository, Project, ProjectRepository, ProjectType};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

const PROJECT_LABEL: &str = "devws.project";
const DOMAINS_LABEL: &str = "devws.domains";

/// Coordinates project lifecycle actions against the container runtime.
pub struct ProjectOrchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    compose: Arc<dyn ComposeRuntime>,
    bus: Arc<EventBus>,
    projects: ProjectRepository,
    presets: PresetRepository,
    global_env: BTreeMap<String, String>,
}

impl ProjectOrchestrator {
    /// Wire an orchestrator from its collaborators.
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        compose: Arc<dyn ComposeRuntime>,
        bus: Arc<EventBus>,
        projects: ProjectRepository,
        presets: PresetRepository,
    ) -> Self {
        ProjectOrchestrator {
            runtime,
            compose,
            bus,
            projects,
            presets,
            global_env: BTreeMap::new(),
        }
    }

    /// Environment variables injected into every project container, below
    /// the project's own variables in precedence.
    pub fn with_global_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.global_env = env;
        self
    }

    /// The project repository the orchestrator persists against.
    pub fn projects(&self) -> &ProjectRepository {
        &self.projects
    }

    /// The preset repository consulted for preset projects.
    pub fn presets(&self) -> &PresetRepository {
        &self.presets
    }

    /// The lifecycle event bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Register a new project: apply preset defaults and volume templates,
    /// persist it, and announce it.
    pub async fn init(&self, project: &mut Project) -> Result<()> {
        if project.kind == ProjectType::Preset {
            let preset = self.preset_of(project).await?;
            apply_preset_defaults(project, &preset)?;
        }
        self.projects.save(project).await?;
        self.bus.emit(LifecycleEvent::Init, project).await?;
        info!("Initialized project {}", project.name);
        Ok(())
    }

    /// Ensure the project's runtime image exists, building or pulling as the
    /// project type requires. With `rebuild` an existing built image is
    /// discarded first.
    pub async fn build(&self, project: &mut Project, rebuild: bool) -> Result<()> {
        self.bus
            .emit_with(LifecycleEvent::Rebuild, project, rebuild)
            .await?;

        match project.kind {
            ProjectType::Image => {
                let image = project.image_name.clone().ok_or_else(|| {
                    Error::Validation(format!("Project {} declares no image", project.name))
                })?;
                if rebuild || !self.runtime.image_exists(&image).await? {
                    self.runtime.pull_image(&image).await?;
                }
            }
            ProjectType::Dockerfile => {
                let tag = dockerfile_image_tag(project);
                project.image_name = Some(tag.clone());
                // Persist the derived tag before the build so a failed build
                // still leaves the project pointing at its image name.
                self.projects.save(project).await?;
                self.build_local_image(
                    &tag,
                    project.path.clone(),
                    project.dockerfile.clone(),
                    &project.build_args,
                    rebuild,
                )
                .await?;
            }
            ProjectType::Preset => {
                let preset = self.preset_of(project).await?;
                if let Some(image) = &preset.image {
                    project.image_name = Some(image.clone());
                    self.projects.save(project).await?;
                    if rebuild || !self.runtime.image_exists(image).await? {
                        self.runtime.pull_image(image).await?;
                    }
                } else {
                    let tag = preset_image_tag(&preset, &project.build_args);
                    project.image_name = Some(tag.clone());
                    self.projects.save(project).await?;
                    self.build_local_image(
                        &tag,
                        preset.path.clone(),
                        preset.dockerfile.clone(),
                        &project.build_args,
                        rebuild,
                    )
                    .await?;
                }
            }
            ProjectType::Compose => {
                let file = self.compose_file(project)?;
                self.compose.build(&file, &project.build_args).await?;
            }
        }

        self.bus.emit(LifecycleEvent::Build, project).await?;
        Ok(())
    }

    /// Reconcile the project into a running state. With `restart` or
    /// `rebuild` any existing container is removed first; with `attach` the
    /// calling process attaches to the started container.
    pub async fn start(
        &self,
        project: &mut Project,
        restart: bool,
        rebuild: bool,
        attach: bool,
    ) -> Result<()> {
        if restart || rebuild {
            self.stop(project).await?;
        }
        self.build(project, rebuild).await?;
        self.bus.emit(LifecycleEvent::BeforeStart, project).await?;

        if project.kind == ProjectType::Compose {
            let file = self.compose_file(project)?;
            self.compose
                .up(&file, &self.merged_env(project), !attach)
                .await?;
        } else {
            let name = project.container_name();
            let handle = match self.runtime.get_container(&name).await? {
                Some(existing) => existing,
                None => {
                    let spec = self.container_spec(project)?;
                    self.runtime.create_container(&spec).await?
                }
            };
            if handle.status.is_startable() {
                self.runtime.start_container(&handle).await?;
            } else {
                debug!("Container {} is {:?}, not starting", name, handle.status);
            }
        }

        self.projects.save(project).await?;
        self.bus.emit(LifecycleEvent::Start, project).await?;
        self.bus.emit(LifecycleEvent::AfterStart, project).await?;
        info!("Started project {}", project.name);

        if attach && project.kind != ProjectType::Compose {
            let handle = self.running_container(project).await?;
            self.runtime.attach(&handle).await?;
        }
        Ok(())
    }

    /// Stop the project. Stopping a project with no backing container is a
    /// no-op beyond the existence check.
    pub async fn stop(&self, project: &mut Project) -> Result<()> {
        self.bus.emit(LifecycleEvent::BeforeStop, project).await?;
        if project.kind == ProjectType::Compose {
            let file = self.compose_file(project)?;
            self.compose.down(&file).await?;
        } else {
            self.runtime.remove_container(&project.container_name()).await?;
        }
        self.bus.emit(LifecycleEvent::Stop, project).await?;
        info!("Stopped project {}", project.name);
        Ok(())
    }

    /// Stop the project and delete its stored entity.
    pub async fn destroy(&self, project: &mut Project) -> Result<()> {
        self.stop(project).await?;
        self.projects.delete(&project.name).await?;
        info!("Destroyed project {}", project.name);
        Ok(())
    }

    /// Run a named script inside the project's running container, with any
    /// extra arguments appended. Compose projects run the script inside the
    /// named service. Returns the script's exit code.
    pub async fn run(
        &self,
        project: &Project,
        script: &str,
        service: Option<&str>,
        args: &[String],
    ) -> Result<i32> {
        let command = project
            .scripts
            .get(script)
            .ok_or_else(|| Error::ScriptNotFound(script.to_string()))?;
        let mut words = shell_words::split(command)
            .map_err(|err| Error::Validation(format!("Script {}: {}", script, err)))?;
        words.extend(args.iter().cloned());

        if project.kind == ProjectType::Compose {
            let service = service.ok_or_else(|| {
                Error::Validation(format!(
                    "Project {} is a compose stack, running {} requires a service",
                    project.name, script
                ))
            })?;
            let file = self.compose_file(project)?;
            return self.compose.exec(&file, service, &words, true).await;
        }

        let handle = self.running_container(project).await?;
        self.runtime.exec(&handle, &words, true).await
    }

    /// Execute an arbitrary command inside the project's running container.
    pub async fn exec(&self, project: &Project, cmd: &[String], tty: bool) -> Result<i32> {
        if project.kind == ProjectType::Compose {
            return Err(Error::Validation(format!(
                "Project {} is a compose stack, use exec_service",
                project.name
            )));
        }
        let handle = self.running_container(project).await?;
        self.runtime.exec(&handle, cmd, tty).await
    }

    /// Execute a command inside one service of a running compose project.
    pub async fn exec_service(
        &self,
        project: &Project,
        service: &str,
        cmd: &[String],
        tty: bool,
    ) -> Result<i32> {
        let file = self.compose_file(project)?;
        self.compose.exec(&file, service, cmd, tty).await
    }

    /// Stream the project container's logs.
    pub async fn logs(&self, project: &Project, follow: bool, tail: Option<u32>) -> Result<()> {
        let name = project.container_name();
        let handle = self
            .runtime
            .get_container(&name)
            .await?
            .ok_or_else(|| Error::NotRunning(project.name.clone()))?;
        self.runtime.logs(&handle, follow, tail).await
    }

    /// The observed container status backing a project, if any.
    pub async fn status(&self, project: &Project) -> Result<Option<ContainerStatus>> {
        Ok(self
            .runtime
            .get_container(&project.container_name())
            .await?
            .map(|h| h.status))
    }

    async fn preset_of(&self, project: &Project) -> Result<Preset> {
        let name = project.preset.as_deref().ok_or_else(|| {
            Error::Validation(format!("Project {} references no preset", project.name))
        })?;
        Ok(self.presets.get_by_name(name).await?)
    }

    async fn running_container(&self, project: &Project) -> Result<ContainerHandle> {
        let handle = self
            .runtime
            .get_container(&project.container_name())
            .await?
            .ok_or_else(|| Error::NotRunning(project.name.clone()))?;
        if handle.status != ContainerStatus::Running {
            return Err(Error::NotRunning(project.name.clone()));
        }
        Ok(handle)
    }

    async fn build_local_image(
        &self,
        tag: &str,
        context: PathBuf,
        dockerfile: Option<String>,
        build_args: &BTreeMap<String, String>,
        rebuild: bool,
    ) -> Result<()> {
        if rebuild && self.runtime.image_exists(tag).await? {
            self.runtime.remove_image(tag).await?;
        }
        if !self.runtime.image_exists(tag).await? {
            self.runtime
                .build_image(&BuildRequest {
                    tag: tag.to_string(),
                    context,
                    dockerfile,
                    build_args: build_args.clone(),
                    labels: BTreeMap::new(),
                })
                .await?;
        }
        Ok(())
    }

    fn compose_file(&self, project: &Project) -> Result<PathBuf> {
        let file = project.composefile.as_deref().unwrap_or("docker-compose.yml");
        Ok(project.path.join(file))
    }

    fn merged_env(&self, project: &Project) -> BTreeMap<String, String> {
        let mut env = self.global_env.clone();
        env.extend(project.env.clone());
        env
    }

    fn container_spec(&self, project: &Project) -> Result<ContainerSpec> {
        let image = project.image_name.clone().ok_or_else(|| {
            Error::Validation(format!("Project {} has no resolved image", project.name))
        })?;

        let mut volumes = Vec::new();
        for spec in &project.volumes {
            volumes.push(absolutize_volume(spec, &project.path)?);
        }

        let mut labels = BTreeMap::new();
        labels.insert(PROJECT_LABEL.to_string(), project.name.clone());
        if !project.domains.is_empty() {
            labels.insert(DOMAINS_LABEL.to_string(), project.domains.join(","));
        }

        Ok(ContainerSpec {
            name: project.container_name(),
            image,
            env: self.merged_env(project),
            volumes,
            ports: project.ports.clone(),
            extra_hosts: project.extra_hosts.clone(),
            labels,
        })
    }
}

// Relative mount sources are declared against the project directory.
fn absolutize_volume(spec: &str, base: &std::path::Path) -> Result<String> {
    let (source, destination, options) = parse_volume(spec)?;
    let source = if std::path::Path::new(&source).is_absolute() {
        PathBuf::from(source)
    } else {
        base.join(source.trim_start_matches("./"))
    };
    let mut resolved = format!("{}:{}", source.display(), destination);
    if let Some(options) = options {
        resolved.push(':');
        resolved.push_str(&options);
    }
    Ok(resolved)
}

fn apply_preset_defaults(project: &mut Project, preset: &Preset) -> Result<()> {
    for (key, spec) in &preset.env_options {
        if let Some(default) = &spec.default {
            project
                .env
                .entry(key.clone())
                .or_insert_with(|| default.clone());
        }
    }
    for (key, spec) in &preset.build_args_options {
        if let Some(default) = &spec.default {
            project
                .build_args
                .entry(key.clone())
                .or_insert_with(|| default.clone());
        }
    }
    for template in &preset.volume_options {
        let resolved = template
            .replace("${PROJECT_PATH}", &project.path.display().to_string())
            .replace("${PROJECT_NAME}", &project.name);
        project.volume_mount(&resolved)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use devws_store::OptionSpec;

    #[test]
    fn relative_volume_sources_resolve_against_the_project_path() {
        let base = std::path::Path::new("/srv/demo");
        assert_eq!(
            absolutize_volume("./data:/var/data", base).unwrap(),
            "/srv/demo/data:/var/data"
        );
        assert_eq!(
            absolutize_volume("cache:/cache:ro", base).unwrap(),
            "/srv/demo/cache:/cache:ro"
        );
        assert_eq!(
            absolutize_volume("/abs:/abs", base).unwrap(),
            "/abs:/abs"
        );
    }

    #[test]
    fn preset_defaults_fill_gaps_without_overriding() {
        let mut project = Project::new("demo", "/srv/demo", ProjectType::Preset);
        project.env.insert("RUST_LOG".to_string(), "trace".to_string());

        let mut preset = Preset {
            name: "rust".to_string(),
            ..Default::default()
        };
        preset.env_options.insert(
            "RUST_LOG".to_string(),
            OptionSpec {
                default: Some("info".to_string()),
                ..Default::default()
            },
        );
        preset.env_options.insert(
            "CARGO_HOME".to_string(),
            OptionSpec {
                default: Some("/cargo".to_string()),
                ..Default::default()
            },
        );
        preset
            .volume_options
            .push("${PROJECT_PATH}/target:/app/target".to_string());

        apply_preset_defaults(&mut project, &preset).unwrap();
        assert_eq!(project.env["RUST_LOG"], "trace");
        assert_eq!(project.env["CARGO_HOME"], "/cargo");
        assert_eq!(project.volumes, vec!["/srv/demo/target:/app/target".to_string()]);
    }
}
