use crate::bootstrap::{resolve_project, App};
use anyhow::Result;

pub(crate) async fn run(
    app: &App,
    name: Option<String>,
    script: &str,
    service: Option<String>,
    args: Vec<String>,
) -> Result<()> {
    let project = resolve_project(app, name).await?;
    let code = app
        .orchestrator
        .run(&project, script, service.as_deref(), &args)
        .await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
