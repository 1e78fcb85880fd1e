use crate::bootstrap::{resolve_project, App};
use crate::DomainCommands;
use anyhow::Result;

pub(crate) async fn run(app: &App, command: DomainCommands) -> Result<()> {
    match command {
        DomainCommands::Add { domain, name } => {
            let mut project = resolve_project(app, name).await?;
            if !project.domains.contains(&domain) {
                project.domains.push(domain);
                app.orchestrator.projects().save(&mut project).await?;
            }
            println!("Domains: {}", project.domains.join(", "));
        }
        DomainCommands::Remove { domain, name } => {
            let mut project = resolve_project(app, name).await?;
            project.domains.retain(|d| *d != domain);
            app.orchestrator.projects().save(&mut project).await?;
            println!("Domains: {}", project.domains.join(", "));
        }
        DomainCommands::Ls { name } => {
            let project = resolve_project(app, name).await?;
            for domain in &project.domains {
                println!("{}", domain);
            }
        }
    }
    Ok(())
}
