use crate::bootstrap::App;
use crate::PresetCommands;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use devws_orchestration::Installed;
use devws_store::PresetFilter;

pub(crate) async fn run(app: &App, command: PresetCommands) -> Result<()> {
    match command {
        PresetCommands::Ls => ls(app).await,
        PresetCommands::Install { reference, version } => {
            install(app, &reference, version.as_deref()).await
        }
        PresetCommands::Delete { name } => delete(app, &name).await,
    }
}

async fn ls(app: &App) -> Result<()> {
    let presets = app
        .orchestrator
        .presets()
        .search(&PresetFilter::default())
        .await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["NAME", "SOURCE", "VERSION", "PATH"]);
    for preset in presets {
        table.add_row(vec![
            Cell::new(&preset.name),
            Cell::new(preset.source.to_string()),
            Cell::new(preset.version.as_deref().unwrap_or("-")),
            Cell::new(preset.path.display().to_string()),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn install(app: &App, reference: &str, version: Option<&str>) -> Result<()> {
    match app.resolver.install(reference, version).await? {
        Installed::Fresh {
            name,
            version,
            repo,
        } => println!("Installed preset {} {} from {}", name, version, repo),
        Installed::AlreadyCurrent { name, version } => {
            println!("Preset {} {} is already installed", name, version)
        }
    }
    Ok(())
}

async fn delete(app: &App, name: &str) -> Result<()> {
    app.orchestrator.presets().delete(name).await?;
    println!("Removed preset {}", name);
    Ok(())
}
