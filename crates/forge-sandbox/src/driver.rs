//! The narrow container runtime surface the job pipeline drives against.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use forge_core::Result;

/// Source stream a log chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Stdout,
    Stderr,
}

/// One demultiplexed chunk of container output. May contain multiple lines.
#[derive(Debug, Clone)]
pub struct LogChunk {
    pub source: LogSource,
    pub content: String,
}

/// Resource and security constraints applied to a created container.
#[derive(Debug, Clone)]
pub struct SandboxResources {
    pub memory_bytes: u64,
    pub memory_soft_bytes: u64,
    pub cpu_quota: i64,
    pub cpu_period: i64,
    pub pids_limit: u64,
}

/// Everything needed to create a single build container.
#[derive(Debug, Clone)]
pub struct SandboxSpec {
    pub build_id: String,
    pub image: String,
    pub env: HashMap<String, String>,
    pub host_out_dir: String,
    pub resources: SandboxResources,
    pub auto_remove: bool,
}

/// A created (and possibly started) container.
#[derive(Debug, Clone)]
pub struct SandboxHandle {
    pub container_id: String,
}

/// The result of waiting on a container to reach a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited { exit_code: i64 },
    DeadlineExceeded,
}

/// Wraps the container runtime's minimal surface: create, start, wait, stop.
/// Every implementation must enforce the security posture described on
/// [`create`](SandboxDriver::create) — dropped capabilities, no new
/// privileges, unprivileged, PID ceiling — regardless of backend.
#[async_trait]
pub trait SandboxDriver: Send + Sync {
    /// Create (but do not start) a container from `spec`. Must drop all
    /// capabilities, set `no-new-privileges`, run unprivileged, use default
    /// bridge networking, and enforce `spec.resources.pids_limit`. A failed
    /// create leaves no container behind that the pipeline must clean up.
    async fn create(&self, spec: &SandboxSpec) -> Result<SandboxHandle>;

    /// Start a previously created container.
    async fn start(&self, handle: &SandboxHandle) -> Result<()>;

    /// Stream demultiplexed stdout/stderr chunks until the container exits
    /// or the stream errors.
    async fn logs(&self, handle: &SandboxHandle) -> Result<BoxStream<'static, LogChunk>>;

    /// Wait for the container to exit, or until `deadline` elapses.
    async fn wait(&self, handle: &SandboxHandle, deadline: Duration) -> Result<WaitOutcome>;

    /// Stop a running container within `grace`, then remove it.
    async fn stop(&self, handle: &SandboxHandle, grace: Duration) -> Result<()>;
}
