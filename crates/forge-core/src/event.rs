//! Lifecycle events published to the fan-out events exchange.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::id::BuildId;

/// Wire-encoded as an integer (`Started = 0`, `Done = 1`, `Failed = 2`),
/// matching the original event message's `JobStatus int` enum so existing
/// `app.build.events` subscribers keep decoding the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum JobStatus {
    Started = 0,
    Done = 1,
    Failed = 2,
}

/// A single terminal-or-start status transition for a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusEvent {
    pub build_id: BuildId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
}

impl JobStatusEvent {
    pub fn started(build_id: BuildId, container_id: impl Into<String>) -> Self {
        Self {
            build_id,
            status: JobStatus::Started,
            container_id: Some(container_id.into()),
            artifact_id: None,
        }
    }

    pub fn done(build_id: BuildId, artifact_id: Option<String>) -> Self {
        Self {
            build_id,
            status: JobStatus::Done,
            container_id: None,
            artifact_id,
        }
    }

    pub fn failed(build_id: BuildId) -> Self {
        Self {
            build_id,
            status: JobStatus::Failed,
            container_id: None,
            artifact_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn started_carries_container_id_only() {
        let event = JobStatusEvent::started(BuildId::from_uuid(Uuid::nil()), "abc123");
        assert_eq!(event.container_id.as_deref(), Some("abc123"));
        assert!(event.artifact_id.is_none());
    }

    #[test]
    fn done_carries_optional_artifact_id() {
        let event = JobStatusEvent::done(BuildId::from_uuid(Uuid::nil()), Some("art-1".to_string()));
        assert_eq!(event.artifact_id.as_deref(), Some("art-1"));
    }

    #[test]
    fn status_serializes_as_an_integer() {
        let event = JobStatusEvent::failed(BuildId::from_uuid(Uuid::nil()));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"status\":2"));
    }
}
