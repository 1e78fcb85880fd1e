//! Docker Compose CLI implementation of the compose boundary.

use super::ComposeRuntime;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Compose collaborator backed by `docker compose`.
pub struct DockerComposeCli {
    binary: String,
}

impl DockerComposeCli {
    /// Collaborator using the `docker` binary from `PATH`.
    pub fn new() -> Self {
        DockerComposeCli {
            binary: "docker".to_string(),
        }
    }

    async fn run(
        &self,
        file: &Path,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> Result<i32> {
        let file_arg = file.to_string_lossy().into_owned();
        debug!("{} compose -f {} {}", self.binary, file_arg, args.join(" "));
        let status = Command::new(&self.binary)
            .arg("compose")
            .arg("-f")
            .arg(&file_arg)
            .args(args)
            .envs(env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn run_checked(
        &self,
        file: &Path,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> Result<()> {
        let code = self.run(file, args, env).await?;
        if code != 0 {
            return Err(Error::Runtime(format!(
                "docker compose {} exited with code {}",
                args.first().map(String::as_str).unwrap_or_default(),
                code
            )));
        }
        Ok(())
    }
}

impl Default for DockerComposeCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComposeRuntime for DockerComposeCli {
    async fn up(
        &self,
        file: &Path,
        env: &BTreeMap<String, String>,
        detach: bool,
    ) -> Result<()> {
        info!("Bringing compose stack up: {}", file.display());
        let mut args = vec!["up".to_string()];
        if detach {
            args.push("-d".to_string());
        }
        self.run_checked(file, &args, env).await
    }

    async fn down(&self, file: &Path) -> Result<()> {
        info!("Taking compose stack down: {}", file.display());
        self.run_checked(file, &["down".to_string()], &BTreeMap::new())
            .await
    }

    async fn build(&self, file: &Path, build_args: &BTreeMap<String, String>) -> Result<()> {
        info!("Building compose stack: {}", file.display());
        let mut args = vec!["build".to_string()];
        for (key, value) in build_args {
            args.push("--build-arg".to_string());
            args.push(format!("{}={}", key, value));
        }
        self.run_checked(file, &args, &BTreeMap::new()).await
    }

    async fn exec(
        &self,
        file: &Path,
        service: &str,
        cmd: &[String],
        tty: bool,
    ) -> Result<i32> {
        let mut args = vec!["exec".to_string()];
        if !tty {
            args.push("-T".to_string());
        }
        args.push(service.to_string());
        args.extend(cmd.iter().cloned());
        self.run(file, &args, &BTreeMap::new()).await
    }
}
