//! Preset resolution and installation against a scripted remote source.

use async_trait::async_trait;
use devws_orchestration::{Error, Installed, PresetResolver, RemoteSource, Result};
use devws_store::{PresetFilter, PresetRepository, PresetSource, StorePaths};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct MockSource {
    tags: Vec<String>,
    branches: Vec<String>,
    configs: HashMap<String, String>,
    archives: HashMap<String, Vec<u8>>,
}

impl MockSource {
    fn with_versioned_preset(mut self, name: &str, reference: &str) -> Self {
        let config = format!(r#"{{ "name": "{}", "dockerfile": "Dockerfile" }}"#, name);
        self.configs.insert(reference.to_string(), config.clone());
        self.archives
            .insert(reference.to_string(), archive(reference, &config));
        self
    }
}

#[async_trait]
impl RemoteSource for MockSource {
    async fn list_tags(&self, _repo: &str) -> Result<Vec<String>> {
        Ok(self.tags.clone())
    }

    async fn list_branches(&self, _repo: &str) -> Result<Vec<String>> {
        Ok(self.branches.clone())
    }

    async fn fetch_config(&self, _repo: &str, reference: &str) -> Result<Option<String>> {
        Ok(self.configs.get(reference).cloned())
    }

    async fn download_archive(&self, _repo: &str, reference: &str) -> Result<Vec<u8>> {
        self.archives
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::Runtime(format!("no archive for {}", reference)))
    }
}

/// A gzipped tarball with the content wrapped in a single top directory,
/// the way repository hosts package ref downloads.
fn archive(reference: &str, config: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let encoder =
            flate2::write::GzEncoder::new(&mut bytes, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let data = config.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("preset-{}/config.json", reference), data)
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }
    bytes
}

struct Fixture {
    resolver: PresetResolver,
    presets: PresetRepository,
    paths: StorePaths,
    _dir: tempfile::TempDir,
}

fn fixture(source: MockSource) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let paths = StorePaths::new(dir.path());
    let presets = PresetRepository::new(paths.clone(), None);
    Fixture {
        resolver: PresetResolver::new(Arc::new(source), presets.clone()),
        presets,
        paths,
        _dir: dir,
    }
}

#[tokio::test]
async fn installs_the_greatest_satisfying_tag() {
    let source = MockSource {
        tags: vec![
            "0.9.0".to_string(),
            "1.2.0".to_string(),
            "1.10.1".to_string(),
            "main".to_string(),
        ],
        ..Default::default()
    }
    .with_versioned_preset("rust", "1.10.1");
    let fx = fixture(source);

    let outcome = fx.resolver.install("rust", None).await.unwrap();
    assert_eq!(
        outcome,
        Installed::Fresh {
            name: "rust".to_string(),
            version: "1.10.1".to_string(),
            repo: "devws-presets/preset-rust".to_string(),
        }
    );

    let installed = fx.presets.get_by_name("rust").await.unwrap();
    assert_eq!(installed.source, PresetSource::Github);
    assert_eq!(installed.version.as_deref(), Some("1.10.1"));
    assert!(fx.paths.preset_dir("rust").join("config.json").is_file());
}

#[tokio::test]
async fn reinstalling_the_current_version_is_a_no_op() {
    let source = MockSource {
        tags: vec!["1.2.0".to_string()],
        ..Default::default()
    }
    .with_versioned_preset("rust", "1.2.0");
    let fx = fixture(source);

    let first = fx.resolver.install("rust", None).await.unwrap();
    assert!(matches!(first, Installed::Fresh { .. }));

    let second = fx.resolver.install("rust", None).await.unwrap();
    assert_eq!(
        second,
        Installed::AlreadyCurrent {
            name: "rust".to_string(),
            version: "1.2.0".to_string(),
        }
    );
}

#[tokio::test]
async fn falls_back_to_version_named_branches() {
    let source = MockSource {
        tags: vec!["main".to_string()],
        branches: vec!["1.3.0".to_string(), "develop".to_string()],
        ..Default::default()
    }
    .with_versioned_preset("rust", "1.3.0");
    let fx = fixture(source);

    let outcome = fx.resolver.install("rust", None).await.unwrap();
    assert!(matches!(outcome, Installed::Fresh { ref version, .. } if version == "1.3.0"));
}

#[tokio::test]
async fn beta_selects_the_greatest_prerelease_branch() {
    let source = MockSource {
        tags: vec!["1.5.0".to_string()],
        branches: vec![
            "1.4.0".to_string(),
            "1.6.0-beta.1".to_string(),
            "1.6.0-beta.3".to_string(),
        ],
        ..Default::default()
    }
    .with_versioned_preset("rust", "1.6.0-beta.3");
    let fx = fixture(source);

    let outcome = fx.resolver.install("rust", Some("beta")).await.unwrap();
    assert!(matches!(outcome, Installed::Fresh { ref version, .. } if version == "1.6.0-beta.3"));
}

#[tokio::test]
async fn unsatisfiable_constraints_fail_with_version_not_found() {
    let source = MockSource {
        tags: vec!["2.5.0".to_string(), "main".to_string()],
        ..Default::default()
    };
    let fx = fixture(source);

    let outcome = fx.resolver.install("rust", Some("^3.0.0")).await;
    assert!(matches!(outcome, Err(Error::VersionNotFound(_))));
}

#[tokio::test]
async fn resolution_is_deterministic_for_a_fixed_tag_set() {
    let tags = vec![
        "1.0.0".to_string(),
        "1.9.9".to_string(),
        "1.10.0".to_string(),
    ];
    let mut picked = Vec::new();
    for _ in 0..2 {
        let source = MockSource {
            tags: tags.clone(),
            ..Default::default()
        }
        .with_versioned_preset("rust", "1.10.0");
        let fx = fixture(source);
        match fx.resolver.install("rust", Some("^1.0.0")).await.unwrap() {
            Installed::Fresh { version, .. } => picked.push(version),
            other => panic!("expected a fresh install, got {:?}", other),
        }
    }
    assert_eq!(picked, vec!["1.10.0".to_string(), "1.10.0".to_string()]);
}

#[tokio::test]
async fn installing_over_a_preset_from_another_source_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let internal_dir = dir.path().join("internal");
    std::fs::create_dir_all(internal_dir.join("rust")).unwrap();
    std::fs::write(
        internal_dir.join("rust").join("config.json"),
        r#"{ "name": "rust" }"#,
    )
    .unwrap();

    let paths = StorePaths::new(dir.path().join("store"));
    let presets = PresetRepository::new(paths.clone(), Some(internal_dir));
    let source = MockSource {
        tags: vec!["1.2.0".to_string()],
        ..Default::default()
    }
    .with_versioned_preset("rust", "1.2.0");
    let resolver = PresetResolver::new(Arc::new(source), presets.clone());

    let outcome = resolver.install("rust", None).await;
    assert!(matches!(outcome, Err(Error::Conflict(_))));

    let named = presets
        .search(&PresetFilter::name("rust"))
        .await
        .unwrap();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].source, PresetSource::Internal);
    assert!(!paths.preset_dir("rust").exists());
}

#[tokio::test]
async fn a_failed_unpack_leaves_no_staging_directory_behind() {
    let config = r#"{ "name": "rust" }"#;
    let mut source = MockSource {
        tags: vec!["1.2.0".to_string()],
        ..Default::default()
    };
    source.configs.insert("1.2.0".to_string(), config.to_string());
    source
        .archives
        .insert("1.2.0".to_string(), b"not a tarball".to_vec());
    let fx = fixture(source);

    let outcome = fx.resolver.install("rust", None).await;
    assert!(outcome.is_err());

    let mut leftovers = Vec::new();
    if let Ok(entries) = std::fs::read_dir(fx.paths.presets_dir()) {
        for entry in entries.flatten() {
            leftovers.push(entry.file_name());
        }
    }
    assert!(leftovers.is_empty(), "staging leaked: {:?}", leftovers);
    assert!(fx.presets.get_by_name("rust").await.is_err());
}
