//! Docker CLI implementation of the container-runtime boundary.

use super::{BuildRequest, ContainerHandle, ContainerRuntime, ContainerSpec, ContainerStatus};
use crate::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Container runtime backed by the local `docker` binary.
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    /// Runtime using the `docker` binary from `PATH`.
    pub fn new() -> Self {
        DockerCli {
            binary: "docker".to_string(),
        }
    }

    /// Run a docker command and capture its stdout.
    async fn capture(&self, args: &[&str]) -> Result<String> {
        debug!("{} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Runtime(format!(
                "docker {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a docker command with the calling process's stdio attached.
    async fn interactive(&self, args: &[String]) -> Result<i32> {
        debug!("{} {}", self.binary, args.join(" "));
        let status = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Like [`interactive`](Self::interactive) but a non-zero exit is a
    /// runtime failure.
    async fn interactive_checked(&self, args: &[String]) -> Result<()> {
        let code = self.interactive(args).await?;
        if code != 0 {
            return Err(Error::Runtime(format!(
                "docker {} exited with code {}",
                args.first().map(String::as_str).unwrap_or_default(),
                code
            )));
        }
        Ok(())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn get_container(&self, name: &str) -> Result<Option<ContainerHandle>> {
        let filter = format!("name={}", name);
        let output = self
            .capture(&[
                "ps",
                "-a",
                "--filter",
                &filter,
                "--format",
                "{{.ID}}|{{.Names}}|{{.State}}",
                "--no-trunc",
            ])
            .await?;

        // The name filter is a substring match; require the exact name.
        for line in output.lines() {
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() >= 3 && parts[1] == name {
                return Ok(Some(ContainerHandle {
                    id: parts[0].to_string(),
                    name: name.to_string(),
                    status: ContainerStatus::from_runtime(parts[2]),
                }));
            }
        }
        Ok(None)
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle> {
        let mut args = vec![
            "create".to_string(),
            "--name".to_string(),
            spec.name.clone(),
            "--tty".to_string(),
        ];
        for (key, value) in &spec.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        for port in &spec.ports {
            args.push("-p".to_string());
            args.push(port.clone());
        }
        for volume in &spec.volumes {
            args.push("-v".to_string());
            args.push(volume.clone());
        }
        for (host, ip) in &spec.extra_hosts {
            args.push("--add-host".to_string());
            args.push(format!("{}:{}", host, ip));
        }
        for (key, value) in &spec.labels {
            args.push("--label".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(spec.image.clone());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.capture(&arg_refs).await?;
        let id = output.trim().to_string();
        info!("Created container {} ({})", spec.name, &id[..12.min(id.len())]);
        Ok(ContainerHandle {
            id,
            name: spec.name.clone(),
            status: ContainerStatus::Created,
        })
    }

    async fn start_container(&self, handle: &ContainerHandle) -> Result<()> {
        self.capture(&["start", &handle.id]).await?;
        info!("Started container {}", handle.name);
        Ok(())
    }

    async fn remove_container(&self, name: &str) -> Result<()> {
        let Some(handle) = self.get_container(name).await? else {
            debug!("Container {} not found, nothing to remove", name);
            return Ok(());
        };

        // The end state (container gone) is achievable even when the stop
        // call fails, e.g. because the container already exited.
        if let Err(err) = self.capture(&["stop", &handle.id]).await {
            warn!("Stopping container {} failed: {}", name, err);
        }
        self.capture(&["rm", "-f", &handle.id]).await?;
        info!("Removed container {}", name);
        Ok(())
    }

    async fn inspect(&self, handle: &ContainerHandle) -> Result<ContainerStatus> {
        let output = self
            .capture(&["inspect", "--format", "{{.State.Status}}", &handle.id])
            .await?;
        Ok(ContainerStatus::from_runtime(&output))
    }

    async fn pull_image(&self, tag: &str) -> Result<()> {
        info!("Pulling image {}", tag);
        self.interactive_checked(&["pull".to_string(), tag.to_string()])
            .await
    }

    async fn image_exists(&self, tag: &str) -> Result<bool> {
        let output = Command::new(&self.binary)
            .args(["image", "inspect", tag])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        Ok(output.success())
    }

    async fn remove_image(&self, tag: &str) -> Result<()> {
        info!("Removing image {}", tag);
        self.capture(&["rmi", tag]).await?;
        Ok(())
    }

    async fn build_image(&self, request: &BuildRequest) -> Result<()> {
        info!("Building image {}", request.tag);
        let mut args = vec![
            "build".to_string(),
            "-t".to_string(),
            request.tag.clone(),
        ];
        if let Some(dockerfile) = &request.dockerfile {
            args.push("-f".to_string());
            args.push(request.context.join(dockerfile).to_string_lossy().into_owned());
        }
        for (key, value) in &request.build_args {
            args.push("--build-arg".to_string());
            args.push(format!("{}={}", key, value));
        }
        for (key, value) in &request.labels {
            args.push("--label".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(request.context.to_string_lossy().into_owned());
        self.interactive_checked(&args).await
    }

    async fn exec(&self, handle: &ContainerHandle, cmd: &[String], tty: bool) -> Result<i32> {
        let mut args = vec!["exec".to_string(), "-i".to_string()];
        if tty {
            args.push("-t".to_string());
        }
        args.push(handle.id.clone());
        args.extend(cmd.iter().cloned());
        self.interactive(&args).await
    }

    async fn attach(&self, handle: &ContainerHandle) -> Result<()> {
        info!("Attaching to container {}", handle.name);
        self.interactive(&["attach".to_string(), handle.id.clone()])
            .await?;
        Ok(())
    }

    async fn logs(&self, handle: &ContainerHandle, follow: bool, tail: Option<u32>) -> Result<()> {
        let mut args = vec!["logs".to_string()];
        if follow {
            args.push("-f".to_string());
        }
        if let Some(tail) = tail {
            args.push("--tail".to_string());
            args.push(tail.to_string());
        }
        args.push(handle.id.clone());
        self.interactive(&args).await?;
        Ok(())
    }
}
