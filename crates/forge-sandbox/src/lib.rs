//! Container sandboxing for isolated build execution.

pub mod docker;
pub mod driver;

pub use docker::DockerSandbox;
pub use driver::{LogChunk, LogSource, SandboxDriver, SandboxHandle, SandboxResources, SandboxSpec, WaitOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_spec() -> SandboxSpec {
        SandboxSpec {
            build_id: "11111111-2222-3333-4444-555555555555".to_string(),
            image: "node:20-slim".to_string(),
            env: HashMap::new(),
            host_out_dir: "/tmp/forge-out".to_string(),
            resources: SandboxResources {
                memory_bytes: 1024 * 1024 * 1024,
                memory_soft_bytes: 768 * 1024 * 1024,
                cpu_quota: 100_000,
                cpu_period: 100_000,
                pids_limit: 256,
            },
            auto_remove: true,
        }
    }

    #[test]
    fn spec_carries_build_id_through() {
        let spec = sample_spec();
        assert_eq!(spec.build_id, "11111111-2222-3333-4444-555555555555");
        assert!(spec.auto_remove);
    }

    #[tokio::test]
    #[ignore]
    async fn docker_runs_a_job_to_completion() {
        let docker = DockerSandbox::new().expect("docker daemon should be reachable");
        let mut spec = sample_spec();
        spec.image = "alpine:latest".to_string();

        let handle = docker.create(&spec).await.expect("create");
        docker.start(&handle).await.expect("start");
        let outcome = docker
            .wait(&handle, std::time::Duration::from_secs(30))
            .await
            .expect("wait");
        assert_eq!(outcome, WaitOutcome::Exited { exit_code: 0 });
        docker.stop(&handle, std::time::Duration::from_secs(5)).await.expect("cleanup");
    }
}
