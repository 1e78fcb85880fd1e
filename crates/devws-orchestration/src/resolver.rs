//! Preset installation from remote repositories.
//!
//! Given a repository reference and an optional version constraint, the
//! resolver enumerates remote tags (then branches as a fallback channel),
//! picks the greatest satisfying version, downloads the archive into a
//! staging directory and swaps it into place.

use crate::remote::RemoteSource;
use crate::{Error, Result};
use devws_store::{Preset, PresetRef, PresetRepository, PresetSource};
use devws_version::{Version, VersionRule};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// The compatibility floor every installed preset must satisfy.
pub const BASELINE_RANGE: &str = "1.x.x";

const DEFAULT_OWNER: &str = "devws-presets";

/// Outcome of an install request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installed {
    /// The requested version was already installed; nothing was touched.
    AlreadyCurrent {
        /// Canonical preset name
        name: String,
        /// Installed version
        version: String,
    },
    /// The preset was downloaded and registered.
    Fresh {
        /// Canonical preset name
        name: String,
        /// Installed version
        version: String,
        /// The `owner/name` repository it came from
        repo: String,
    },
}

/// Resolves and installs presets from a remote source.
pub struct PresetResolver {
    source: Arc<dyn RemoteSource>,
    presets: PresetRepository,
}

impl PresetResolver {
    /// Resolver over a remote source and the preset repository it installs
    /// into.
    pub fn new(source: Arc<dyn RemoteSource>, presets: PresetRepository) -> Self {
        PresetResolver { source, presets }
    }

    /// Expand a short preset name to the conventional `owner/name`
    /// repository reference. References already containing an owner pass
    /// through unchanged.
    pub fn expand_reference(reference: &str) -> String {
        if reference.contains('/') {
            reference.to_string()
        } else {
            format!("{}/preset-{}", DEFAULT_OWNER, reference)
        }
    }

    /// Install a preset, resolving the best version for the constraint.
    ///
    /// `constraint` accepts a range expression, the literal `latest`
    /// (baseline range over release tags) or `beta` (the greatest
    /// prerelease-tagged branch). Installing a version that is already
    /// current is a no-op.
    pub async fn install(&self, reference: &str, constraint: Option<&str>) -> Result<Installed> {
        let repo = Self::expand_reference(reference);
        let baseline = VersionRule::parse(BASELINE_RANGE)?;
        let (requested, beta) = match constraint {
            None | Some("latest") => (baseline.clone(), false),
            Some("beta") => (baseline.clone(), true),
            Some(raw) => (VersionRule::parse(raw)?, false),
        };

        let selected = if beta {
            // Prerelease channel: tags are release artifacts, so only
            // version-named branches carrying a tag qualify.
            let branches = self.source.list_branches(&repo).await?;
            best_prerelease(&branches)
        } else {
            let tags = self.source.list_tags(&repo).await?;
            match best_candidate(&tags, &baseline, &requested) {
                Some(found) => Some(found),
                None => {
                    debug!("No tag of {} satisfies the constraint, trying branches", repo);
                    let branches = self.source.list_branches(&repo).await?;
                    best_candidate(&branches, &baseline, &requested)
                }
            }
        };
        let Some(version) = selected else {
            return Err(Error::VersionNotFound(format!(
                "{} {}",
                repo,
                constraint.unwrap_or(BASELINE_RANGE)
            )));
        };
        debug!("Resolved {} to version {}", repo, version);

        // The preset's canonical name comes from its own config, not from
        // the repository reference.
        let config = self
            .source
            .fetch_config(&repo, &version)
            .await?
            .ok_or_else(|| Error::NotFound(format!("config.json in {}@{}", repo, version)))?;
        let preset: Preset = serde_json::from_str(&config)?;
        if preset.name.is_empty() {
            return Err(Error::Validation(format!(
                "Preset config in {}@{} has no name",
                repo, version
            )));
        }

        match self.presets.get_by_name(&preset.name).await {
            Ok(existing)
                if existing.source == PresetSource::Github
                    && existing.version.as_deref() == Some(version.as_str()) =>
            {
                info!("Preset {} {} is already installed", preset.name, version);
                return Ok(Installed::AlreadyCurrent {
                    name: preset.name,
                    version,
                });
            }
            // Names stay unique across sources; an internal or external
            // preset with this name would shadow the install anyway.
            Ok(existing) if existing.source != PresetSource::Github => {
                return Err(Error::Conflict(format!(
                    "Preset {} already exists from source {}",
                    preset.name, existing.source
                )));
            }
            Ok(_) | Err(devws_store::Error::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        let archive = self.source.download_archive(&repo, &version).await?;
        self.materialize(&preset.name, archive).await?;

        self.presets
            .register(PresetRef {
                name: preset.name.clone(),
                source: PresetSource::Github,
                path: None,
                version: Some(version.clone()),
            })
            .await?;

        info!("Installed preset {} {} from {}", preset.name, version, repo);
        Ok(Installed::Fresh {
            name: preset.name,
            version,
            repo,
        })
    }

    /// Unpack the archive in a staging directory next to the final location,
    /// then replace the final directory. The staging directory is removed on
    /// every exit path when it drops.
    async fn materialize(&self, name: &str, archive: Vec<u8>) -> Result<()> {
        let presets_dir = self.presets.paths().presets_dir();
        tokio::fs::create_dir_all(&presets_dir).await?;
        let staging = tempfile::tempdir_in(&presets_dir)?;

        let unpack_dir = staging.path().to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let decoder = flate2::read::GzDecoder::new(std::io::Cursor::new(archive));
            tar::Archive::new(decoder).unpack(&unpack_dir)?;
            Ok(())
        })
        .await
        .map_err(|err| Error::Runtime(format!("Archive unpack task failed: {}", err)))??;

        let content_root = archive_content_root(staging.path()).await?;
        let final_dir = self.presets.paths().preset_dir(name);
        if let Err(err) = tokio::fs::remove_dir_all(&final_dir).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                return Err(err.into());
            }
        }
        tokio::fs::create_dir_all(&final_dir).await?;
        let mut entries = tokio::fs::read_dir(&content_root).await?;
        while let Some(entry) = entries.next_entry().await? {
            tokio::fs::rename(entry.path(), final_dir.join(entry.file_name())).await?;
        }
        Ok(())
    }
}

/// Repository archives wrap the content in a single `repo-ref/` directory;
/// flat archives place it at the top. Descend one level only when the top
/// holds nothing but one directory.
async fn archive_content_root(staging: &Path) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(staging).await?;
    let mut dirs = Vec::new();
    let mut files = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        } else {
            files += 1;
        }
    }
    if files == 0 && dirs.len() == 1 {
        Ok(dirs.remove(0))
    } else {
        Ok(staging.to_path_buf())
    }
}

fn best_candidate(
    names: &[String],
    baseline: &VersionRule,
    requested: &VersionRule,
) -> Option<String> {
    names
        .iter()
        .filter_map(|name| Version::parse(name).ok().map(|v| (name, v)))
        .filter(|(_, v)| {
            baseline.matches(v, false) || requested.matches(v, requested.tag.is_some())
        })
        .max_by(|(_, a), (_, b)| a.compare(b))
        .map(|(name, _)| name.clone())
}

fn best_prerelease(names: &[String]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| Version::parse(name).ok().map(|v| (name, v)))
        .filter(|(_, v)| v.tag.is_some())
        .max_by(|(_, a), (_, b)| a.compare(b))
        .map(|(name, _)| name.clone())
}
