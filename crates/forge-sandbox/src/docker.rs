//! Docker-backed [`SandboxDriver`].

use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions, WaitContainerOptions,
};
use bollard::models::HostConfig;
use forge_core::{Error, Result};
use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::{debug, info, warn};

use crate::driver::{LogChunk, LogSource, SandboxDriver, SandboxHandle, SandboxSpec, WaitOutcome};

pub struct DockerSandbox {
    docker: Docker,
}

impl DockerSandbox {
    pub fn new() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| Error::Internal(e.to_string()))?;
        Ok(Self { docker })
    }

    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }

    fn container_name(build_id: &str) -> String {
        format!("forge-build-{build_id}")
    }
}

#[async_trait]
impl SandboxDriver for DockerSandbox {
    async fn create(&self, spec: &SandboxSpec) -> Result<SandboxHandle> {
        let container_name = Self::container_name(&spec.build_id);

        let env: Vec<String> = spec.env.iter().map(|(k, v)| format!("{k}={v}")).collect();

        let pids_limit = spec.resources.pids_limit as i64;
        let host_config = HostConfig {
            binds: Some(vec![format!("{}:/output", spec.host_out_dir)]),
            memory: Some(spec.resources.memory_bytes as i64),
            memory_reservation: Some(spec.resources.memory_soft_bytes as i64),
            cpu_quota: Some(spec.resources.cpu_quota),
            cpu_period: Some(spec.resources.cpu_period),
            pids_limit: Some(pids_limit),
            security_opt: Some(vec!["no-new-privileges:true".to_string()]),
            cap_drop: Some(vec!["ALL".to_string()]),
            network_mode: Some("bridge".to_string()),
            privileged: Some(false),
            auto_remove: Some(spec.auto_remove),
            ..Default::default()
        };

        let mut labels = std::collections::HashMap::new();
        labels.insert("build_id".to_string(), spec.build_id.clone());

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(env),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            tty: Some(false),
            labels: Some(labels),
            host_config: Some(host_config),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name: container_name.clone(),
            platform: None,
        };

        info!(container = %container_name, image = %spec.image, "creating build container");
        let container = self
            .docker
            .create_container(Some(create_options), config)
            .await
            .map_err(|e| Error::ExecutionFailed(format!("failed to create container: {e}")))?;

        Ok(SandboxHandle {
            container_id: container.id,
        })
    }

    async fn start(&self, handle: &SandboxHandle) -> Result<()> {
        info!(container = %handle.container_id, "starting build container");
        self.docker
            .start_container(&handle.container_id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::ExecutionFailed(format!("failed to start container: {e}")))
    }

    async fn logs(&self, handle: &SandboxHandle) -> Result<BoxStream<'static, LogChunk>> {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            timestamps: false,
            ..Default::default()
        };

        let stream = self.docker.logs(&handle.container_id, Some(options));

        let mapped = stream.filter_map(|result| async move {
            match result {
                Ok(LogOutput::StdOut { message }) => Some(LogChunk {
                    source: LogSource::Stdout,
                    content: String::from_utf8_lossy(&message).to_string(),
                }),
                Ok(LogOutput::StdErr { message }) => Some(LogChunk {
                    source: LogSource::Stderr,
                    content: String::from_utf8_lossy(&message).to_string(),
                }),
                Ok(LogOutput::Console { message }) | Ok(LogOutput::StdIn { message }) => Some(LogChunk {
                    source: LogSource::Stdout,
                    content: String::from_utf8_lossy(&message).to_string(),
                }),
                Err(e) => {
                    warn!(error = %e, "log stream error");
                    None
                }
            }
        });

        Ok(Box::pin(mapped))
    }

    async fn wait(&self, handle: &SandboxHandle, deadline: Duration) -> Result<WaitOutcome> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };
        let mut stream = self.docker.wait_container(&handle.container_id, Some(options));

        match tokio::time::timeout(deadline, stream.next()).await {
            Ok(Some(Ok(response))) => Ok(WaitOutcome::Exited {
                exit_code: response.status_code,
            }),
            Ok(Some(Err(e))) => Err(Error::ExecutionFailed(format!("wait error: {e}"))),
            Ok(None) => {
                // The stream ended with no item; inspect directly to recover the exit code.
                let inspect = self
                    .docker
                    .inspect_container(&handle.container_id, None)
                    .await
                    .map_err(|e| Error::ExecutionFailed(format!("inspect after wait: {e}")))?;
                let exit_code = inspect
                    .state
                    .and_then(|s| s.exit_code)
                    .ok_or_else(|| Error::Internal("container exited with no state".to_string()))?;
                Ok(WaitOutcome::Exited { exit_code })
            }
            Err(_) => Ok(WaitOutcome::DeadlineExceeded),
        }
    }

    async fn stop(&self, handle: &SandboxHandle, grace: Duration) -> Result<()> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };
        if let Err(e) = self.docker.stop_container(&handle.container_id, Some(options)).await {
            warn!(container = %handle.container_id, error = %e, "stop_container failed, forcing removal");
        }

        let remove_options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self
            .docker
            .remove_container(&handle.container_id, Some(remove_options))
            .await
        {
            Ok(()) => Ok(()),
            // Auto-remove containers may already be gone by the time we stop them.
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                debug!(container = %handle.container_id, "container already removed");
                Ok(())
            }
            Err(e) => Err(Error::ExecutionFailed(format!("failed to remove container: {e}"))),
        }
    }
}
