//! Preset entities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where a preset comes from. The repository's save/delete behavior branches
/// on this tag; the entity itself stays a plain data holder.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresetSource {
    /// Bundled with the application, read-only
    #[default]
    Internal,
    /// A local directory registered by path
    External,
    /// Installed from a remote repository release
    Github,
}

impl std::fmt::Display for PresetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresetSource::Internal => write!(f, "internal"),
            PresetSource::External => write!(f, "external"),
            PresetSource::Github => write!(f, "github"),
        }
    }
}

/// A declarative prompt spec consumed at project-init time. The shape is
/// authoritative input to preset image-name hashing: values of keys marked
/// `hash: false` become literal tag segments, everything else is
/// content-hashed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionSpec {
    /// Prompt kind, e.g. `input` or `select`
    #[serde(rename = "type")]
    pub kind: String,
    /// Default value applied when the user provides none
    pub default: Option<String>,
    /// Whether the value participates in the hashed tag segment
    pub hash: bool,
}

impl Default for OptionSpec {
    fn default() -> Self {
        OptionSpec {
            kind: "input".to_string(),
            default: None,
            hash: true,
        }
    }
}

/// A named, versioned, installable project template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Preset {
    /// Storage identity, assigned from the name on first save
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unique name across all sources
    pub name: String,
    /// Installed version (github presets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Base image to adopt, exclusive with `dockerfile`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Dockerfile to build, exclusive with `image`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    /// Build-argument prompt specs, keyed by argument name
    pub build_args_options: BTreeMap<String, OptionSpec>,
    /// Environment prompt specs, keyed by variable name
    pub env_options: BTreeMap<String, OptionSpec>,
    /// Volume templates with `${...}` placeholders
    pub volume_options: Vec<String>,
    /// Source tag, set by the repository when the entity is loaded
    #[serde(skip)]
    pub source: PresetSource,
    /// Materialized directory, set by the repository when the entity is loaded
    #[serde(skip)]
    pub path: PathBuf,
}
