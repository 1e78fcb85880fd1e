use crate::bootstrap::{resolve_project, App};
use crate::tail;
use anyhow::Result;
use std::path::PathBuf;

pub(crate) async fn run(
    app: &App,
    name: Option<String>,
    follow: bool,
    tail_lines: Option<u32>,
    file: Option<PathBuf>,
) -> Result<()> {
    if let Some(file) = file {
        return tail::follow_file(&file).await;
    }
    let project = resolve_project(app, name).await?;
    app.orchestrator.logs(&project, follow, tail_lines).await?;
    Ok(())
}
