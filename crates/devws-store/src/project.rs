//! Project entities.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The runtime artifact backing a project, which determines orchestrator
/// dispatch. Immutable once meaningfully set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// A prebuilt container image
    #[default]
    Image,
    /// A Dockerfile built from the project directory
    Dockerfile,
    /// A compose stack
    Compose,
    /// A named preset
    Preset,
}

/// Per-service configuration overrides for compose projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceOverrides {
    /// Environment variable overrides
    pub env: BTreeMap<String, String>,
    /// Build argument overrides
    pub build_args: BTreeMap<String, String>,
}

/// A named development workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    /// Storage identity, assigned from the name on first save
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unique name, also the base of the runtime container name
    pub name: String,
    /// Absolute filesystem location; a directory maps to at most one project
    pub path: PathBuf,
    /// Runtime artifact type
    #[serde(rename = "type")]
    pub kind: ProjectType,
    /// Image reference for `image` projects, or the tag derived by a build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    /// Dockerfile path for `dockerfile` projects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    /// Compose file path for `compose` projects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composefile: Option<String>,
    /// Referenced preset name for `preset` projects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Environment variables
    pub env: BTreeMap<String, String>,
    /// Image build arguments
    pub build_args: BTreeMap<String, String>,
    /// Ordered `source:destination[:options]` mounts, unique by destination
    pub volumes: Vec<String>,
    /// `host:container[/proto]` port mappings
    pub ports: Vec<String>,
    /// Ordered virtual-host names
    pub domains: Vec<String>,
    /// Extra host → ip entries
    pub extra_hosts: BTreeMap<String, String>,
    /// Named shell commands runnable inside the container
    pub scripts: BTreeMap<String, String>,
    /// Per-service overrides for compose projects
    pub services: BTreeMap<String, ServiceOverrides>,
}

impl Project {
    /// Create a project with the identity fields set.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: ProjectType) -> Self {
        Project {
            name: name.into(),
            path: path.into(),
            kind,
            ..Default::default()
        }
    }

    /// The deterministic runtime container name for this project.
    pub fn container_name(&self) -> String {
        format!("{}.workspace", self.name)
    }

    /// Add a volume mount, replacing any existing entry with the same
    /// destination. The first matching entry is removed before the new one
    /// is appended, so the last write wins.
    pub fn volume_mount(&mut self, spec: &str) -> Result<()> {
        let (_, destination, _) = parse_volume(spec)?;
        if let Some(pos) = self
            .volumes
            .iter()
            .position(|existing| matches_destination(existing, &destination))
        {
            self.volumes.remove(pos);
        }
        self.volumes.push(spec.to_string());
        Ok(())
    }

    /// Remove a volume by exact string match. Removing an absent volume is a
    /// no-op.
    pub fn volume_unmount(&mut self, spec: &str) {
        self.volumes.retain(|existing| existing != spec);
    }
}

fn matches_destination(spec: &str, destination: &str) -> bool {
    parse_volume(spec).map(|(_, d, _)| d == destination).unwrap_or(false)
}

/// Split a `source:destination[:options]` volume spec.
pub fn parse_volume(spec: &str) -> Result<(String, String, Option<String>)> {
    let mut parts = spec.splitn(3, ':');
    let source = parts.next().unwrap_or_default();
    let destination = parts.next().unwrap_or_default();
    let options = parts.next().map(str::to_string);
    if source.is_empty() || destination.is_empty() {
        return Err(Error::Validation(format!("Malformed volume spec: {}", spec)));
    }
    Ok((source.to_string(), destination.to_string(), options))
}

/// Split a `host:container[/proto]` port spec.
pub fn parse_port(spec: &str) -> Result<(u16, u16, Option<String>)> {
    let (mapping, proto) = match spec.split_once('/') {
        Some((mapping, proto)) => (mapping, Some(proto.to_string())),
        None => (spec, None),
    };
    let (host, container) = mapping
        .split_once(':')
        .ok_or_else(|| Error::Validation(format!("Malformed port spec: {}", spec)))?;
    let host = host
        .parse()
        .map_err(|_| Error::Validation(format!("Malformed port spec: {}", spec)))?;
    let container = container
        .parse()
        .map_err(|_| Error::Validation(format!("Malformed port spec: {}", spec)))?;
    Ok((host, container, proto))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_name_derives_from_project_name() {
        let project = Project::new("demo", "/tmp/demo", ProjectType::Image);
        assert_eq!(project.container_name(), "demo.workspace");
    }

    #[test]
    fn volume_mount_replaces_same_destination() {
        let mut project = Project::new("demo", "/tmp/demo", ProjectType::Image);
        project.volume_mount("./data:/var/data").unwrap();
        project.volume_mount("./other:/var/data:ro").unwrap();
        assert_eq!(project.volumes, vec!["./other:/var/data:ro".to_string()]);
    }

    #[test]
    fn volume_mount_keeps_distinct_destinations_ordered() {
        let mut project = Project::new("demo", "/tmp/demo", ProjectType::Image);
        project.volume_mount("./a:/a").unwrap();
        project.volume_mount("./b:/b").unwrap();
        project.volume_mount("./c:/a").unwrap();
        assert_eq!(project.volumes, vec!["./b:/b".to_string(), "./c:/a".to_string()]);
    }

    #[test]
    fn volume_unmount_removes_exact_match_only() {
        let mut project = Project::new("demo", "/tmp/demo", ProjectType::Image);
        project.volume_mount("./a:/a").unwrap();
        project.volume_unmount("./a:/a:ro");
        assert_eq!(project.volumes.len(), 1);
        project.volume_unmount("./a:/a");
        assert!(project.volumes.is_empty());
    }

    #[test]
    fn malformed_volume_spec_is_a_validation_error() {
        let mut project = Project::new("demo", "/tmp/demo", ProjectType::Image);
        assert!(matches!(
            project.volume_mount("no-destination"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(project.volume_mount(":/x"), Err(Error::Validation(_))));
    }

    #[test]
    fn port_specs_parse_with_optional_protocol() {
        assert_eq!(parse_port("8080:80").unwrap(), (8080, 80, None));
        assert_eq!(
            parse_port("53:53/udp").unwrap(),
            (53, 53, Some("udp".to_string()))
        );
        assert!(parse_port("8080").is_err());
        assert!(parse_port("a:b").is_err());
    }

    #[test]
    fn entity_json_round_trips() {
        let mut project = Project::new("demo", "/tmp/demo", ProjectType::Dockerfile);
        project.dockerfile = Some("Dockerfile".to_string());
        project.env.insert("RUST_LOG".to_string(), "debug".to_string());
        project.scripts.insert("test".to_string(), "cargo test".to_string());

        let json = serde_json::to_string_pretty(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(project, back);
    }
}
