//! devws - local development environment orchestrator.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod bootstrap;
mod commands;
mod tail;

#[derive(Parser)]
#[command(name = "devws")]
#[command(about = "devws - container-backed development workspaces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the current directory as a project
    Init {
        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Project type: image, dockerfile, compose or preset
        #[arg(short = 't', long, default_value = "image")]
        r#type: String,

        /// Image reference for image projects
        #[arg(long)]
        image: Option<String>,

        /// Dockerfile path for dockerfile projects
        #[arg(long)]
        dockerfile: Option<String>,

        /// Compose file path for compose projects
        #[arg(long)]
        composefile: Option<String>,

        /// Preset name for preset projects
        #[arg(long)]
        preset: Option<String>,
    },

    /// Build or pull the project image
    Build {
        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,

        /// Discard an existing built image first
        #[arg(short, long)]
        rebuild: bool,
    },

    /// Start a project
    Start {
        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,

        /// Remove an existing container before starting
        #[arg(short, long)]
        restart: bool,

        /// Rebuild the image before starting
        #[arg(short = 'b', long)]
        rebuild: bool,

        /// Attach to the container after starting
        #[arg(short, long)]
        attach: bool,
    },

    /// Stop a project
    Stop {
        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List projects and their container status
    Ps {
        /// Include projects with no running container
        #[arg(short, long)]
        all: bool,
    },

    /// Run a named project script inside the container
    Run {
        /// Script name from the project's scripts table
        script: String,

        /// Extra arguments appended to the script command
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,

        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,

        /// Compose service to run the script in (compose projects only)
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Execute a command inside the project container
    Exec {
        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,

        /// Compose service to exec into (compose projects only)
        #[arg(short, long)]
        service: Option<String>,

        /// Command and arguments
        #[arg(trailing_var_arg = true, required = true)]
        cmd: Vec<String>,
    },

    /// Show container logs, or follow a log file on disk
    Logs {
        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,

        /// Keep streaming as new output arrives
        #[arg(short, long)]
        follow: bool,

        /// Only show the last N lines
        #[arg(long)]
        tail: Option<u32>,

        /// Follow a log file instead of the container stream
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Stop a project and delete its configuration
    Destroy {
        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Preset management
    Preset {
        #[command(subcommand)]
        command: PresetCommands,
    },

    /// Project configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Project domains
    Domain {
        #[command(subcommand)]
        command: DomainCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum PresetCommands {
    /// List installed presets
    Ls,

    /// Install a preset from a remote repository
    Install {
        /// `owner/repo` or a short preset name
        reference: String,

        /// Version constraint, `latest` or `beta`
        #[arg(short, long)]
        version: Option<String>,
    },

    /// Remove an installed preset
    Delete {
        /// Preset name
        name: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Environment variables
    Env {
        #[command(subcommand)]
        command: KeyValueCommands,
    },

    /// Image build arguments
    BuildArg {
        #[command(subcommand)]
        command: KeyValueCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum KeyValueCommands {
    /// Set one or more KEY=VALUE entries
    Set {
        /// Entries in KEY=VALUE form
        #[arg(required = true)]
        entries: Vec<String>,

        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove keys
    Unset {
        /// Keys to remove
        #[arg(required = true)]
        keys: Vec<String>,

        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List entries
    Ls {
        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub(crate) enum DomainCommands {
    /// Add a domain to a project
    Add {
        /// Domain name
        domain: String,

        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove a domain from a project
    Remove {
        /// Domain name
        domain: String,

        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List a project's domains
    Ls {
        /// Project name (defaults to the project at the current directory)
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devws=info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let app = bootstrap::build()?;

    match cli.command {
        Commands::Init {
            name,
            r#type,
            image,
            dockerfile,
            composefile,
            preset,
        } => {
            commands::init::run(&app, name, &r#type, image, dockerfile, composefile, preset).await
        }
        Commands::Build { name, rebuild } => commands::build::run(&app, name, rebuild).await,
        Commands::Start {
            name,
            restart,
            rebuild,
            attach,
        } => commands::start::run(&app, name, restart, rebuild, attach).await,
        Commands::Stop { name } => commands::stop::run(&app, name).await,
        Commands::Ps { all } => commands::ps::run(&app, all).await,
        Commands::Run {
            script,
            args,
            name,
            service,
        } => commands::run::run(&app, name, &script, service, args).await,
        Commands::Exec { name, service, cmd } => {
            commands::exec::run(&app, name, service, cmd).await
        }
        Commands::Logs {
            name,
            follow,
            tail,
            file,
        } => commands::logs::run(&app, name, follow, tail, file).await,
        Commands::Destroy { name } => commands::destroy::run(&app, name).await,
        Commands::Preset { command } => commands::preset::run(&app, command).await,
        Commands::Config { command } => commands::config::run(&app, command).await,
        Commands::Domain { command } => commands::domain::run(&app, command).await,
    }
}
