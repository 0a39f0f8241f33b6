//! The per-line log record shape shared by the in-memory buffer, the
//! live-logs topic, and the JSONL archive uploaded to the artifact API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::BuildId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Stdout,
    Stderr,
}

/// One captured line of container output (or a worker-emitted note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub log: String,
    pub source: LogSource,
    pub tag: String,
    pub time: DateTime<Utc>,
    pub uuid: Uuid,
    pub build_id: BuildId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

impl LogEntry {
    /// Construct a log entry stamped with the current time and a fresh v4
    /// UUID, mirroring the original collector's per-line identity scheme.
    pub fn new(
        build_id: BuildId,
        source: LogSource,
        tag: impl Into<String>,
        line: impl Into<String>,
        container_id: Option<String>,
    ) -> Self {
        Self {
            log: line.into(),
            source,
            tag: tag.into(),
            time: Utc::now(),
            uuid: Uuid::new_v4(),
            build_id,
            container_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_lowercase_source() {
        let build_id = BuildId::from_uuid(Uuid::nil());
        let entry = LogEntry::new(build_id, LogSource::Stderr, "app.builder", "boom", None);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"source\":\"stderr\""));
        assert!(!json.contains("container_id"));
    }
}
