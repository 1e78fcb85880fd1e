use crate::bootstrap::{resolve_project, App};
use anyhow::Result;

pub(crate) async fn run(app: &App, name: Option<String>, rebuild: bool) -> Result<()> {
    let mut project = resolve_project(app, name).await?;
    app.orchestrator.build(&mut project, rebuild).await?;
    match &project.image_name {
        Some(image) => println!("Project {} image ready: {}", project.name, image),
        None => println!("Project {} built", project.name),
    }
    Ok(())
}
