use crate::bootstrap::{resolve_project, App};
use anyhow::Result;

pub(crate) async fn run(app: &App, name: Option<String>) -> Result<()> {
    let mut project = resolve_project(app, name).await?;
    app.orchestrator.stop(&mut project).await?;
    println!("Project {} stopped", project.name);
    Ok(())
}
