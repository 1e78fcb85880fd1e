//! Application wiring.
//!
//! Every collaborator is built here in dependency order and passed by
//! reference; no service reaches for ambient global state.

use anyhow::{Context, Result};
use devws_orchestration::{
    load_plugins, DockerCli, DockerComposeCli, DomainsPlugin, EventBus, GithubSource, Plugin,
    PluginContext, PresetResolver, ProjectOrchestrator,
};
use devws_store::{PresetRepository, ProjectRepository, StorePaths};
use std::path::PathBuf;
use std::sync::Arc;

const DATA_DIR_ENV: &str = "DEVWS_DATA_DIR";
const INTERNAL_PRESETS_ENV: &str = "DEVWS_INTERNAL_PRESETS";

/// The wired application services commands dispatch against.
pub(crate) struct App {
    pub orchestrator: ProjectOrchestrator,
    pub resolver: PresetResolver,
}

pub(crate) fn build() -> Result<App> {
    let data_dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .context("no application data directory available")?
            .join("devws"),
    };
    let paths = StorePaths::new(data_dir);

    let projects = ProjectRepository::new(paths.clone());
    let internal_presets = std::env::var_os(INTERNAL_PRESETS_ENV).map(PathBuf::from);
    let presets = PresetRepository::new(paths, internal_presets);

    let bus = Arc::new(EventBus::new());
    let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(DomainsPlugin)];
    load_plugins(
        &plugins,
        &PluginContext {
            bus: bus.clone(),
            projects: projects.clone(),
            presets: presets.clone(),
        },
    );

    let orchestrator = ProjectOrchestrator::new(
        Arc::new(DockerCli::new()),
        Arc::new(DockerComposeCli::new()),
        bus,
        projects,
        presets.clone(),
    )
    .with_global_env(global_env());

    let resolver = PresetResolver::new(Arc::new(GithubSource::new()), presets);

    Ok(App {
        orchestrator,
        resolver,
    })
}

// Variables every workspace container receives, below project env in
// precedence.
fn global_env() -> std::collections::BTreeMap<String, String> {
    let mut env = std::collections::BTreeMap::new();
    env.insert("DEVWS".to_string(), "1".to_string());
    env
}

/// Resolve the project a command targets: by explicit name, or by the
/// project registered at the current directory.
pub(crate) async fn resolve_project(
    app: &App,
    name: Option<String>,
) -> Result<devws_store::Project> {
    let projects = app.orchestrator.projects();
    match name {
        Some(name) => projects
            .get_by_name(&name)
            .await
            .with_context(|| format!("project {} is not registered", name)),
        None => {
            let cwd = std::env::current_dir()?;
            projects
                .search_one(&devws_store::ProjectFilter::path(&cwd))
                .await
                .context("no project registered at the current directory, pass --name")
        }
    }
}
