use crate::bootstrap::App;
use anyhow::{bail, Context, Result};
use devws_store::{Project, ProjectType};

#[allow(clippy::too_many_arguments)]
pub(crate) async fn run(
    app: &App,
    name: Option<String>,
    kind: &str,
    image: Option<String>,
    dockerfile: Option<String>,
    composefile: Option<String>,
    preset: Option<String>,
) -> Result<()> {
    let path = std::env::current_dir()?;
    let name = match name {
        Some(name) => name,
        None => path
            .file_name()
            .context("cannot derive a project name from the current directory")?
            .to_string_lossy()
            .into_owned(),
    };

    let kind = match kind {
        "image" => ProjectType::Image,
        "dockerfile" => ProjectType::Dockerfile,
        "compose" => ProjectType::Compose,
        "preset" => ProjectType::Preset,
        other => bail!("unknown project type {}, expected image, dockerfile, compose or preset", other),
    };

    let mut project = Project::new(name, path, kind);
    project.image_name = image;
    project.dockerfile = dockerfile;
    project.composefile = composefile;
    project.preset = preset;

    match kind {
        ProjectType::Image if project.image_name.is_none() => {
            bail!("image projects require --image")
        }
        ProjectType::Preset if project.preset.is_none() => {
            bail!("preset projects require --preset")
        }
        _ => {}
    }

    app.orchestrator.init(&mut project).await?;
    println!("Initialized project {}", project.name);
    Ok(())
}
