use crate::bootstrap::{resolve_project, App};
use anyhow::Result;

pub(crate) async fn run(
    app: &App,
    name: Option<String>,
    restart: bool,
    rebuild: bool,
    attach: bool,
) -> Result<()> {
    let mut project = resolve_project(app, name).await?;
    app.orchestrator
        .start(&mut project, restart, rebuild, attach)
        .await?;
    println!("Project {} is up", project.name);
    Ok(())
}
