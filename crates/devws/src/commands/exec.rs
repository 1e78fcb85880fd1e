use crate::bootstrap::{resolve_project, App};
use anyhow::Result;
use devws_store::ProjectType;

pub(crate) async fn run(
    app: &App,
    name: Option<String>,
    service: Option<String>,
    cmd: Vec<String>,
) -> Result<()> {
    let project = resolve_project(app, name).await?;
    let code = match (project.kind, service) {
        (ProjectType::Compose, Some(service)) => {
            app.orchestrator
                .exec_service(&project, &service, &cmd, true)
                .await?
        }
        (ProjectType::Compose, None) => {
            anyhow::bail!("compose projects require --service")
        }
        (_, _) => app.orchestrator.exec(&project, &cmd, true).await?,
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
