//! Repository integration tests against a temporary store directory.

use devws_store::{
    AppIndex, Error, Preset, PresetFilter, PresetRepository, PresetSource, Project, ProjectFilter,
    ProjectRepository, ProjectType, StorePaths,
};
use tempfile::TempDir;

fn store(dir: &TempDir) -> StorePaths {
    StorePaths::new(dir.path())
}

#[tokio::test]
async fn save_then_search_round_trips() {
    let dir = TempDir::new().unwrap();
    let repo = ProjectRepository::new(store(&dir));

    let mut project = Project::new("demo", "/tmp/demo", ProjectType::Image);
    project.image_name = Some("nginx:latest".to_string());
    project
        .env
        .insert("RUST_LOG".to_string(), "debug".to_string());
    repo.save(&mut project).await.unwrap();
    assert_eq!(project.id.as_deref(), Some("demo"));

    let found = repo
        .search(&ProjectFilter::name("demo"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "demo");
    assert_eq!(found[0].path, std::path::PathBuf::from("/tmp/demo"));
    assert_eq!(found[0].env.get("RUST_LOG").map(String::as_str), Some("debug"));
}

#[tokio::test]
async fn search_one_by_path_finds_the_project() {
    let dir = TempDir::new().unwrap();
    let repo = ProjectRepository::new(store(&dir));

    let mut project = Project::new("demo", "/srv/demo", ProjectType::Dockerfile);
    repo.save(&mut project).await.unwrap();

    let found = repo
        .search_one(&ProjectFilter::path("/srv/demo"))
        .await
        .unwrap();
    assert_eq!(found.name, "demo");
}

#[tokio::test]
async fn get_by_name_signals_not_found() {
    let dir = TempDir::new().unwrap();
    let repo = ProjectRepository::new(store(&dir));
    assert!(matches!(
        repo.get_by_name("missing").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_name_at_different_path_is_a_conflict() {
    let dir = TempDir::new().unwrap();
    let repo = ProjectRepository::new(store(&dir));

    let mut first = Project::new("demo", "/srv/one", ProjectType::Image);
    repo.save(&mut first).await.unwrap();

    let mut second = Project::new("demo", "/srv/two", ProjectType::Image);
    assert!(matches!(
        repo.save(&mut second).await,
        Err(Error::Conflict(_))
    ));
}

#[tokio::test]
async fn one_path_maps_to_at_most_one_project() {
    let dir = TempDir::new().unwrap();
    let repo = ProjectRepository::new(store(&dir));

    let mut first = Project::new("one", "/srv/shared", ProjectType::Image);
    repo.save(&mut first).await.unwrap();

    let mut second = Project::new("two", "/srv/shared", ProjectType::Image);
    assert!(matches!(
        repo.save(&mut second).await,
        Err(Error::Conflict(_))
    ));
}

#[tokio::test]
async fn save_requires_identity_fields() {
    let dir = TempDir::new().unwrap();
    let repo = ProjectRepository::new(store(&dir));

    let mut nameless = Project::new("", "/srv/x", ProjectType::Image);
    assert!(matches!(
        repo.save(&mut nameless).await,
        Err(Error::Validation(_))
    ));

    let mut pathless = Project::new("x", "", ProjectType::Image);
    assert!(matches!(
        repo.save(&mut pathless).await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn delete_removes_index_entry_and_directory() {
    let dir = TempDir::new().unwrap();
    let paths = store(&dir);
    let repo = ProjectRepository::new(paths.clone());

    let mut project = Project::new("demo", "/srv/demo", ProjectType::Image);
    repo.save(&mut project).await.unwrap();
    assert!(paths.project_dir("demo").join("config.json").exists());

    repo.delete("demo").await.unwrap();
    assert!(!paths.project_dir("demo").exists());
    assert!(matches!(
        repo.get_by_name("demo").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn saving_twice_updates_in_place() {
    let dir = TempDir::new().unwrap();
    let repo = ProjectRepository::new(store(&dir));

    let mut project = Project::new("demo", "/srv/demo", ProjectType::Image);
    repo.save(&mut project).await.unwrap();
    project.domains.push("demo.localhost".to_string());
    repo.save(&mut project).await.unwrap();

    let found = repo.search(&ProjectFilter::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].domains, vec!["demo.localhost".to_string()]);
}

#[tokio::test]
async fn legacy_index_entries_load_and_rewrite_current() {
    let dir = TempDir::new().unwrap();
    let paths = store(&dir);

    // Seed a legacy-format index plus the referenced entity body.
    let project_dir = paths.project_dir("old");
    tokio::fs::create_dir_all(&project_dir).await.unwrap();
    let body = serde_json::to_vec_pretty(&Project::new(
        "old",
        "/srv/old",
        ProjectType::Image,
    ))
    .unwrap();
    tokio::fs::write(project_dir.join("config.json"), body)
        .await
        .unwrap();
    tokio::fs::write(
        paths.index_file(),
        r#"{ "projects": [ { "id": "old", "src": "/srv/old" } ] }"#,
    )
    .await
    .unwrap();

    let repo = ProjectRepository::new(paths.clone());
    let found = repo.get_by_name("old").await.unwrap();
    assert_eq!(found.name, "old");

    // Any save rewrites the index in the current shape.
    let mut other = Project::new("new", "/srv/new", ProjectType::Image);
    repo.save(&mut other).await.unwrap();
    let raw = tokio::fs::read_to_string(paths.index_file()).await.unwrap();
    assert!(!raw.contains("\"src\""));
    let reloaded = AppIndex::load(&paths.index_file()).await.unwrap();
    assert_eq!(reloaded.projects.len(), 2);
}

#[tokio::test]
async fn preset_resolution_prefers_internal_sources() {
    let dir = TempDir::new().unwrap();
    let internal = dir.path().join("internal");
    tokio::fs::create_dir_all(internal.join("rust")).await.unwrap();
    tokio::fs::write(
        internal.join("rust").join("config.json"),
        r#"{ "name": "rust", "image": "rust:bundled" }"#,
    )
    .await
    .unwrap();

    let paths = store(&dir);
    let repo = PresetRepository::new(paths.clone(), Some(internal));

    // A github preset with the same name resolves behind the internal one.
    let github_dir = paths.preset_dir("rust");
    tokio::fs::create_dir_all(&github_dir).await.unwrap();
    tokio::fs::write(
        github_dir.join("config.json"),
        r#"{ "name": "rust", "image": "rust:remote" }"#,
    )
    .await
    .unwrap();
    repo.register(devws_store::PresetRef {
        name: "rust".to_string(),
        source: PresetSource::Github,
        path: None,
        version: Some("1.0.0".to_string()),
    })
    .await
    .unwrap();

    let resolved = repo.get_by_name("rust").await.unwrap();
    assert_eq!(resolved.source, PresetSource::Internal);
    assert_eq!(resolved.image.as_deref(), Some("rust:bundled"));

    let all = repo.search(&PresetFilter::name("rust")).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn internal_presets_are_read_only() {
    let dir = TempDir::new().unwrap();
    let internal = dir.path().join("internal");
    tokio::fs::create_dir_all(internal.join("node")).await.unwrap();
    tokio::fs::write(
        internal.join("node").join("config.json"),
        r#"{ "name": "node", "image": "node:22" }"#,
    )
    .await
    .unwrap();

    let repo = PresetRepository::new(store(&dir), Some(internal));
    let mut preset = repo.get_by_name("node").await.unwrap();
    assert!(matches!(
        repo.save(&mut preset).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        repo.delete("node").await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn external_presets_rewrite_their_config_file() {
    let dir = TempDir::new().unwrap();
    let external_dir = dir.path().join("my-preset");
    let repo = PresetRepository::new(store(&dir), None);

    let mut preset = Preset {
        name: "custom".to_string(),
        source: PresetSource::External,
        path: external_dir.clone(),
        dockerfile: Some("Dockerfile".to_string()),
        ..Default::default()
    };
    repo.save(&mut preset).await.unwrap();
    assert!(external_dir.join("config.json").exists());

    preset.image = Some("alpine".to_string());
    repo.save(&mut preset).await.unwrap();
    let reloaded = repo.get_by_name("custom").await.unwrap();
    assert_eq!(reloaded.image.as_deref(), Some("alpine"));
    assert_eq!(reloaded.source, PresetSource::External);

    // Deleting only unregisters; the directory stays.
    repo.delete("custom").await.unwrap();
    assert!(external_dir.exists());
    assert!(matches!(
        repo.get_by_name("custom").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn github_preset_delete_removes_materialized_directory() {
    let dir = TempDir::new().unwrap();
    let paths = store(&dir);
    let repo = PresetRepository::new(paths.clone(), None);

    let mut preset = Preset {
        name: "remote".to_string(),
        source: PresetSource::Github,
        version: Some("1.2.0".to_string()),
        image: Some("alpine".to_string()),
        ..Default::default()
    };
    repo.save(&mut preset).await.unwrap();
    assert!(paths.preset_dir("remote").exists());

    repo.delete("remote").await.unwrap();
    assert!(!paths.preset_dir("remote").exists());
}

#[tokio::test]
async fn preset_names_are_unique_across_sources() {
    let dir = TempDir::new().unwrap();
    let repo = PresetRepository::new(store(&dir), None);

    let mut github = Preset {
        name: "dup".to_string(),
        source: PresetSource::Github,
        image: Some("a".to_string()),
        ..Default::default()
    };
    repo.save(&mut github).await.unwrap();

    let mut external = Preset {
        name: "dup".to_string(),
        source: PresetSource::External,
        path: dir.path().join("dup"),
        image: Some("b".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        repo.save(&mut external).await,
        Err(Error::Conflict(_))
    ));
}
