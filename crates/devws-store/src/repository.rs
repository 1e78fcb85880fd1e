//! File-backed repositories for projects and presets.
//!
//! Persistence of an entity body and the index update are two separate
//! writes; a crash in between leaves an entity file the index does not yet
//! reference, which the next save repairs.

use crate::{
    index::{AppIndex, PresetRef, ProjectRef, StorePaths},
    Error, Preset, PresetSource, Project, Result,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const ENTITY_FILE: &str = "config.json";

/// Conjunctive filter over project identity fields.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Match by name
    pub name: Option<String>,
    /// Match by path
    pub path: Option<PathBuf>,
}

impl ProjectFilter {
    /// Filter by name.
    pub fn name(name: impl Into<String>) -> Self {
        ProjectFilter {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Filter by path.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ProjectFilter {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    fn matches(&self, entry: &ProjectRef) -> bool {
        self.name.as_ref().is_none_or(|n| *n == entry.name)
            && self.path.as_ref().is_none_or(|p| *p == entry.path)
    }
}

/// Repository of project entities.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    paths: StorePaths,
}

impl ProjectRepository {
    /// Repository over the given store layout.
    pub fn new(paths: StorePaths) -> Self {
        ProjectRepository { paths }
    }

    /// All projects matching the filter, in index order.
    pub async fn search(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let index = AppIndex::load(&self.paths.index_file()).await?;
        let mut found = Vec::new();
        for entry in index.projects.iter().filter(|e| filter.matches(e)) {
            match self.load_entity(&entry.name).await {
                Ok(project) => found.push(project),
                Err(Error::NotFound(_)) => {
                    warn!("Index references missing project {}", entry.name);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(found)
    }

    /// The first project matching the filter.
    pub async fn search_one(&self, filter: &ProjectFilter) -> Result<Project> {
        self.search(filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(describe_project_filter(filter)))
    }

    /// Look a project up by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Project> {
        self.search_one(&ProjectFilter::name(name)).await
    }

    /// Persist a project: validate identity, assign `id`, write the entity
    /// body, then update the index so subsequent searches find it.
    pub async fn save(&self, project: &mut Project) -> Result<()> {
        if project.name.is_empty() {
            return Err(Error::Validation("Project name is required".to_string()));
        }
        if project.path.as_os_str().is_empty() {
            return Err(Error::Validation("Project path is required".to_string()));
        }
        if project.id.is_none() {
            project.id = Some(project.name.clone());
        }

        let index_file = self.paths.index_file();
        let mut index = AppIndex::load(&index_file).await?;

        if let Some(existing) = index.projects.iter().find(|e| e.name == project.name) {
            if existing.path != project.path {
                return Err(Error::Conflict(format!(
                    "Project {} is already registered at {}",
                    project.name,
                    existing.path.display()
                )));
            }
        }
        if let Some(existing) = index
            .projects
            .iter()
            .find(|e| e.path == project.path && e.name != project.name)
        {
            return Err(Error::Conflict(format!(
                "Path {} already belongs to project {}",
                project.path.display(),
                existing.name
            )));
        }

        let dir = self.paths.project_dir(&project.name);
        tokio::fs::create_dir_all(&dir).await?;
        let body = serde_json::to_vec_pretty(project)?;
        tokio::fs::write(dir.join(ENTITY_FILE), body).await?;

        index.projects.retain(|e| e.name != project.name);
        index.projects.push(ProjectRef {
            name: project.name.clone(),
            path: project.path.clone(),
        });
        index.save(&index_file).await?;

        debug!("Saved project {}", project.name);
        Ok(())
    }

    /// Remove a project from the index and delete its storage directory.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let index_file = self.paths.index_file();
        let mut index = AppIndex::load(&index_file).await?;
        let before = index.projects.len();
        index.projects.retain(|e| e.name != name);
        if index.projects.len() == before {
            return Err(Error::NotFound(format!("Project {}", name)));
        }
        index.save(&index_file).await?;

        let dir = self.paths.project_dir(name);
        if let Err(err) = tokio::fs::remove_dir_all(&dir).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                return Err(err.into());
            }
        }
        info!("Deleted project {}", name);
        Ok(())
    }

    async fn load_entity(&self, name: &str) -> Result<Project> {
        let file = self.paths.project_dir(name).join(ENTITY_FILE);
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("Project {}", name)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn describe_project_filter(filter: &ProjectFilter) -> String {
    match (&filter.name, &filter.path) {
        (Some(name), _) => format!("Project {}", name),
        (None, Some(path)) => format!("Project at {}", path.display()),
        (None, None) => "Project".to_string(),
    }
}

/// Conjunctive filter over preset identity fields.
#[derive(Debug, Clone, Default)]
pub struct PresetFilter {
    /// Match by name
    pub name: Option<String>,
    /// Match by source
    pub source: Option<PresetSource>,
}

impl PresetFilter {
    /// Filter by name.
    pub fn name(name: impl Into<String>) -> Self {
        PresetFilter {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn matches(&self, preset: &Preset) -> bool {
        self.name.as_ref().is_none_or(|n| *n == preset.name)
            && self.source.is_none_or(|s| s == preset.source)
    }
}

/// Repository of preset entities across internal, external and github
/// sources. Enumeration order is internal first, then registered entries in
/// registration order; name resolution takes the first match.
#[derive(Debug, Clone)]
pub struct PresetRepository {
    paths: StorePaths,
    internal_dir: Option<PathBuf>,
}

impl PresetRepository {
    /// Repository over the given store layout, optionally with a bundled
    /// internal preset directory.
    pub fn new(paths: StorePaths, internal_dir: Option<PathBuf>) -> Self {
        PresetRepository {
            paths,
            internal_dir,
        }
    }

    /// The store layout this repository persists against.
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// All presets matching the filter, internal sources first.
    pub async fn search(&self, filter: &PresetFilter) -> Result<Vec<Preset>> {
        let mut found = Vec::new();

        if let Some(internal_dir) = &self.internal_dir {
            for dir in list_subdirs(internal_dir).await? {
                match load_preset_at(&dir, PresetSource::Internal, None).await {
                    Ok(preset) => found.push(preset),
                    Err(Error::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }
            }
        }

        let index = AppIndex::load(&self.paths.index_file()).await?;
        for entry in &index.presets {
            let dir = match (entry.source, &entry.path) {
                (PresetSource::External, Some(path)) => path.clone(),
                (PresetSource::Github, _) => self.paths.preset_dir(&entry.name),
                _ => {
                    warn!("Index preset entry {} has no usable path", entry.name);
                    continue;
                }
            };
            match load_preset_at(&dir, entry.source, entry.version.clone()).await {
                Ok(preset) => found.push(preset),
                Err(Error::NotFound(_)) => {
                    warn!("Index references missing preset {}", entry.name);
                }
                Err(err) => return Err(err),
            }
        }

        found.retain(|p| filter.matches(p));
        Ok(found)
    }

    /// The first preset matching the filter.
    pub async fn search_one(&self, filter: &PresetFilter) -> Result<Preset> {
        self.search(filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::NotFound(match &filter.name {
                    Some(name) => format!("Preset {}", name),
                    None => "Preset".to_string(),
                })
            })
    }

    /// Look a preset up by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Preset> {
        self.search_one(&PresetFilter::name(name)).await
    }

    /// Persist a preset. Internal presets are read-only; external presets
    /// rewrite their registered config file; github presets write under the
    /// store's preset directory. Names must stay unique across sources.
    pub async fn save(&self, preset: &mut Preset) -> Result<()> {
        if preset.name.is_empty() {
            return Err(Error::Validation("Preset name is required".to_string()));
        }
        if preset.id.is_none() {
            preset.id = Some(preset.name.clone());
        }

        match self.search_one(&PresetFilter::name(&preset.name)).await {
            Ok(existing) if existing.source != preset.source => {
                return Err(Error::Conflict(format!(
                    "Preset {} already exists from source {}",
                    preset.name, existing.source
                )));
            }
            Ok(_) | Err(Error::NotFound(_)) => {}
            Err(err) => return Err(err),
        }

        match preset.source {
            PresetSource::Internal => {
                return Err(Error::Validation(format!(
                    "Internal preset {} is read-only",
                    preset.name
                )));
            }
            PresetSource::External => {
                if preset.path.as_os_str().is_empty() {
                    return Err(Error::Validation(
                        "External presets require a registered path".to_string(),
                    ));
                }
                tokio::fs::create_dir_all(&preset.path).await?;
                let body = serde_json::to_vec_pretty(preset)?;
                tokio::fs::write(preset.path.join(ENTITY_FILE), body).await?;
                self.register(PresetRef {
                    name: preset.name.clone(),
                    source: PresetSource::External,
                    path: Some(preset.path.clone()),
                    version: None,
                })
                .await?;
            }
            PresetSource::Github => {
                let dir = self.paths.preset_dir(&preset.name);
                tokio::fs::create_dir_all(&dir).await?;
                let body = serde_json::to_vec_pretty(preset)?;
                tokio::fs::write(dir.join(ENTITY_FILE), body).await?;
                preset.path = dir;
                self.register(PresetRef {
                    name: preset.name.clone(),
                    source: PresetSource::Github,
                    path: None,
                    version: preset.version.clone(),
                })
                .await?;
            }
        }

        debug!("Saved preset {}", preset.name);
        Ok(())
    }

    /// Add or replace an index entry for a preset. Used directly by the
    /// install flow once a downloaded preset directory is in place.
    pub async fn register(&self, entry: PresetRef) -> Result<()> {
        let index_file = self.paths.index_file();
        let mut index = AppIndex::load(&index_file).await?;
        index.presets.retain(|e| e.name != entry.name);
        index.presets.push(entry);
        index.save(&index_file).await
    }

    /// Remove a preset: drop the index entry and, for github presets,
    /// delete the materialized directory. External presets are only
    /// unregistered; internal presets cannot be removed.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let preset = self.get_by_name(name).await?;
        match preset.source {
            PresetSource::Internal => Err(Error::Validation(format!(
                "Internal preset {} cannot be removed",
                name
            ))),
            PresetSource::External => {
                self.unregister(name).await?;
                info!("Unregistered external preset {}", name);
                Ok(())
            }
            PresetSource::Github => {
                self.unregister(name).await?;
                let dir = self.paths.preset_dir(name);
                if let Err(err) = tokio::fs::remove_dir_all(&dir).await {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        return Err(err.into());
                    }
                }
                info!("Deleted github preset {}", name);
                Ok(())
            }
        }
    }

    async fn unregister(&self, name: &str) -> Result<()> {
        let index_file = self.paths.index_file();
        let mut index = AppIndex::load(&index_file).await?;
        let before = index.presets.len();
        index.presets.retain(|e| e.name != name);
        if index.presets.len() == before {
            return Err(Error::NotFound(format!("Preset {}", name)));
        }
        index.save(&index_file).await
    }
}

async fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(dirs),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

async fn load_preset_at(
    dir: &Path,
    source: PresetSource,
    version: Option<String>,
) -> Result<Preset> {
    let file = dir.join(ENTITY_FILE);
    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("Preset at {}", dir.display())));
        }
        Err(err) => return Err(err.into()),
    };
    let mut preset: Preset = serde_json::from_slice(&bytes)?;
    preset.source = source;
    preset.path = dir.to_path_buf();
    if preset.version.is_none() {
        preset.version = version;
    }
    Ok(preset)
}
