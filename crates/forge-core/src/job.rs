//! The build job message and the plan-level limits it may carry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::id::BuildId;

/// A build job as deserialized from a queue delivery body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildJob {
    pub build_id: BuildId,
    pub repo_full_name: String,
    pub clone_url: String,
    #[serde(default)]
    pub directory: String,
    pub out_dir: String,
    #[serde(default)]
    pub install_command: String,
    #[serde(default)]
    pub build_command: String,
    #[serde(default)]
    pub node_version: Option<String>,
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
    pub artifacts_upload_path: String,
    pub logs_upload_path: String,
    #[serde(default)]
    pub limits: Option<PlanLimits>,
}

/// Plan-level resource ceilings requested for a job. Every field is optional;
/// zero or absent means "use the worker's configured default".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlanLimits {
    #[serde(default)]
    pub memory_mb: Option<u64>,
    #[serde(default)]
    pub cpu_percent: Option<u32>,
    #[serde(default)]
    pub build_timeout_s: Option<u64>,
    #[serde(default)]
    pub artifact_size_mb: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_job() {
        let json = r#"{
            "build_id": "11111111-2222-3333-4444-555555555555",
            "repo_full_name": "acme/widgets",
            "clone_url": "https://github.com/acme/widgets.git",
            "out_dir": "dist",
            "artifacts_upload_path": "/builds/1/artifact",
            "logs_upload_path": "/builds/1/logs"
        }"#;
        let job: BuildJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.out_dir, "dist");
        assert!(job.env_vars.is_empty());
        assert!(job.limits.is_none());
    }
}
