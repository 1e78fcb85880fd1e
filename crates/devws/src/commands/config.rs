use crate::bootstrap::{resolve_project, App};
use crate::{ConfigCommands, KeyValueCommands};
use anyhow::{bail, Result};
use std::collections::BTreeMap;

pub(crate) async fn run(app: &App, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Env { command } => apply(app, command, |p| &mut p.env).await,
        ConfigCommands::BuildArg { command } => apply(app, command, |p| &mut p.build_args).await,
    }
}

async fn apply(
    app: &App,
    command: KeyValueCommands,
    table: impl Fn(&mut devws_store::Project) -> &mut BTreeMap<String, String>,
) -> Result<()> {
    match command {
        KeyValueCommands::Set { entries, name } => {
            let mut project = resolve_project(app, name).await?;
            for entry in entries {
                let Some((key, value)) = entry.split_once('=') else {
                    bail!("expected KEY=VALUE, got {}", entry);
                };
                table(&mut project).insert(key.to_string(), value.to_string());
            }
            app.orchestrator.projects().save(&mut project).await?;
            println!("Updated project {}", project.name);
        }
        KeyValueCommands::Unset { keys, name } => {
            let mut project = resolve_project(app, name).await?;
            for key in keys {
                table(&mut project).remove(&key);
            }
            app.orchestrator.projects().save(&mut project).await?;
            println!("Updated project {}", project.name);
        }
        KeyValueCommands::Ls { name } => {
            let mut project = resolve_project(app, name).await?;
            for (key, value) in table(&mut project).iter() {
                println!("{}={}", key, value);
            }
        }
    }
    Ok(())
}
