use crate::bootstrap::App;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use devws_orchestration::ContainerStatus;
use devws_store::ProjectFilter;

pub(crate) async fn run(app: &App, all: bool) -> Result<()> {
    let projects = app
        .orchestrator
        .projects()
        .search(&ProjectFilter::default())
        .await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["NAME", "TYPE", "STATUS", "IMAGE", "PATH"]);

    for project in projects {
        let status = app.orchestrator.status(&project).await?;
        let running = status == Some(ContainerStatus::Running);
        if !all && !running {
            continue;
        }
        let status_text = match status {
            Some(status) => format!("{:?}", status).to_lowercase(),
            None => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(&project.name),
            Cell::new(format!("{:?}", project.kind).to_lowercase()),
            Cell::new(status_text),
            Cell::new(project.image_name.as_deref().unwrap_or("-")),
            Cell::new(project.path.display().to_string()),
        ]);
    }

    println!("{}", table);
    Ok(())
}
