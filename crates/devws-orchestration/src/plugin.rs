//! Lifecycle plugins.
//!
//! A plugin is anything that registers event handlers against the bus at
//! startup. A plugin that fails to register is logged and skipped; the
//! remaining plugins still load.

use crate::{EventBus, LifecycleEvent, Result};
use devws_store::{PresetRepository, ProjectRepository};
use std::sync::Arc;
use tracing::{debug, warn};

/// Collaborators a plugin may hold on to.
#[derive(Clone)]
pub struct PluginContext {
    /// The lifecycle event bus
    pub bus: Arc<EventBus>,
    /// Project repository
    pub projects: ProjectRepository,
    /// Preset repository
    pub presets: PresetRepository,
}

/// A unit of behavior attached to the project lifecycle.
pub trait Plugin: Send + Sync {
    /// Stable plugin name, used in logs.
    fn name(&self) -> &str;

    /// Register event handlers against the bus.
    fn register(&self, ctx: &PluginContext) -> Result<()>;
}

/// Register every plugin. A registration failure is logged and the plugin
/// skipped so one broken plugin cannot take the whole startup down.
pub fn load_plugins(plugins: &[Box<dyn Plugin>], ctx: &PluginContext) {
    for plugin in plugins {
        match plugin.register(ctx) {
            Ok(()) => debug!("Loaded plugin {}", plugin.name()),
            Err(err) => warn!("Skipping plugin {}: {}", plugin.name(), err),
        }
    }
}

/// Assigns a default `<name>.localhost` domain to projects that declare no
/// domains of their own, just before they start.
pub struct DomainsPlugin;

impl Plugin for DomainsPlugin {
    fn name(&self) -> &str {
        "domains"
    }

    fn register(&self, ctx: &PluginContext) -> Result<()> {
        ctx.bus.on(LifecycleEvent::BeforeStart, |project, _| {
            Box::pin(async move {
                if project.domains.is_empty() {
                    let domain = format!("{}.localhost", project.name);
                    debug!("Assigning default domain {} to {}", domain, project.name);
                    project.domains.push(domain);
                }
                Ok(())
            })
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devws_store::{Project, ProjectType, StorePaths};

    fn context() -> (PluginContext, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths::new(dir.path());
        let ctx = PluginContext {
            bus: Arc::new(EventBus::new()),
            projects: ProjectRepository::new(paths.clone()),
            presets: PresetRepository::new(paths, None),
        };
        (ctx, dir)
    }

    #[tokio::test]
    async fn domains_plugin_assigns_default_domain() {
        let (ctx, _dir) = context();
        DomainsPlugin.register(&ctx).unwrap();

        let mut project = Project::new("demo", "/tmp/demo", ProjectType::Image);
        ctx.bus
            .emit(LifecycleEvent::BeforeStart, &mut project)
            .await
            .unwrap();
        assert_eq!(project.domains, vec!["demo.localhost".to_string()]);
    }

    #[tokio::test]
    async fn domains_plugin_keeps_explicit_domains() {
        let (ctx, _dir) = context();
        DomainsPlugin.register(&ctx).unwrap();

        let mut project = Project::new("demo", "/tmp/demo", ProjectType::Image);
        project.domains.push("demo.example.test".to_string());
        ctx.bus
            .emit(LifecycleEvent::BeforeStart, &mut project)
            .await
            .unwrap();
        assert_eq!(project.domains, vec!["demo.example.test".to_string()]);
    }
}
