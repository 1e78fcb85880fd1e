//! The application config index and on-disk layout.

use crate::{PresetSource, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk layout of the application data directory.
#[derive(Debug, Clone)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    /// Layout rooted at the given data directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StorePaths { root: root.into() }
    }

    /// The application index file.
    pub fn index_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Directory holding per-project entity bodies.
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    /// Storage directory of one project.
    pub fn project_dir(&self, name: &str) -> PathBuf {
        self.projects_dir().join(name)
    }

    /// Directory holding materialized github presets.
    pub fn presets_dir(&self) -> PathBuf {
        self.root.join("presets")
    }

    /// Materialized directory of one github preset.
    pub fn preset_dir(&self, name: &str) -> PathBuf {
        self.presets_dir().join(name)
    }
}

/// Index entry for a registered project.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectRef {
    /// Project name
    pub name: String,
    /// Project path
    pub path: PathBuf,
}

// The legacy index used `{id, src}` references. They are read and
// normalized during load but always written back in the current shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawProjectRef {
    Current { name: String, path: PathBuf },
    Legacy { id: String, src: PathBuf },
}

impl<'de> Deserialize<'de> for ProjectRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawProjectRef::deserialize(deserializer)? {
            RawProjectRef::Current { name, path } => ProjectRef { name, path },
            RawProjectRef::Legacy { id, src } => ProjectRef { name: id, path: src },
        })
    }
}

/// Index entry for a registered preset.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PresetRef {
    /// Preset name
    pub name: String,
    /// Preset source
    pub source: PresetSource,
    /// Registered directory, set for external presets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Installed version, set for github presets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPresetRef {
    Current {
        name: String,
        source: PresetSource,
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default)]
        version: Option<String>,
    },
    Legacy {
        id: String,
        src: PathBuf,
    },
}

impl<'de> Deserialize<'de> for PresetRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawPresetRef::deserialize(deserializer)? {
            RawPresetRef::Current {
                name,
                source,
                path,
                version,
            } => PresetRef {
                name,
                source,
                path,
                version,
            },
            // Legacy preset references were always external directories.
            RawPresetRef::Legacy { id, src } => PresetRef {
                name: id,
                source: PresetSource::External,
                path: Some(src),
                version: None,
            },
        })
    }
}

/// The application config index: the list of registered project and preset
/// references. Read-modify-written wholesale on every save; two concurrent
/// processes race with last write winning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppIndex {
    /// Registered projects
    pub projects: Vec<ProjectRef>,
    /// Registered presets, in registration order
    pub presets: Vec<PresetRef>,
}

impl AppIndex {
    /// Load the index, normalizing legacy entries. A missing file is an
    /// empty index.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Index {} not found, starting empty", path.display());
                Ok(AppIndex::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Write the index in the current shape.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_project_refs_normalize() {
        let raw = r#"{
            "projects": [
                { "id": "old", "src": "/srv/old" },
                { "name": "new", "path": "/srv/new" }
            ]
        }"#;
        let index: AppIndex = serde_json::from_str(raw).unwrap();
        assert_eq!(index.projects[0].name, "old");
        assert_eq!(index.projects[0].path, PathBuf::from("/srv/old"));
        assert_eq!(index.projects[1].name, "new");
    }

    #[test]
    fn legacy_preset_refs_normalize_to_external() {
        let raw = r#"{ "presets": [ { "id": "rust", "src": "/srv/presets/rust" } ] }"#;
        let index: AppIndex = serde_json::from_str(raw).unwrap();
        let preset = &index.presets[0];
        assert_eq!(preset.name, "rust");
        assert_eq!(preset.source, PresetSource::External);
        assert_eq!(preset.path, Some(PathBuf::from("/srv/presets/rust")));
    }

    #[test]
    fn index_always_serializes_in_current_shape() {
        let raw = r#"{ "projects": [ { "id": "old", "src": "/srv/old" } ] }"#;
        let index: AppIndex = serde_json::from_str(raw).unwrap();
        let out = serde_json::to_string(&index).unwrap();
        assert!(out.contains("\"name\""));
        assert!(out.contains("\"path\""));
        assert!(!out.contains("\"src\""));
    }
}
