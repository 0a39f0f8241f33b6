//! Per-job log buffer and live-log publishing.
//!
//! Reads demultiplexed container output, splits it into lines, appends each
//! to a shared buffer, and best-effort publishes it to the live-logs topic.
//! The buffer is capped at [`SOFT_CAP`] entries: once full, the oldest lines
//! are folded into a single gap-marker entry rather than growing without
//! bound for a chatty or runaway build.

use std::collections::VecDeque;
use std::sync::Arc;

use forge_broker::EventSink;
use forge_core::id::BuildId;
use forge_core::log::{LogEntry, LogSource as CoreLogSource};
use forge_sandbox::{LogChunk, LogSource as SandboxLogSource};
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::Mutex;

/// Soft cap on buffered log entries per job. Chosen so a worst-case 2-hour
/// build logging a line a second still fits comfortably before folding.
pub const SOFT_CAP: usize = 20_000;

const GAP_MARKER_TAG: &str = "forge.worker.gap";

struct Inner {
    entries: VecDeque<LogEntry>,
    /// Total entries folded into the gap marker so far.
    dropped: u64,
}

/// Shared, mutex-protected log buffer for a single job.
pub struct LogBuffer {
    inner: Mutex<Inner>,
    cap: usize,
    build_id: BuildId,
}

impl LogBuffer {
    pub fn new(build_id: BuildId) -> Self {
        Self::with_cap(build_id, SOFT_CAP)
    }

    pub fn with_cap(build_id: BuildId, cap: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::new(),
                dropped: 0,
            }),
            cap,
            build_id,
        }
    }

    /// Append `entry` to the buffer. Used both by the log streamer for
    /// container output and by the pipeline for its own status notes (e.g.
    /// a timeout marker), so both end up in the uploaded JSONL archive.
    pub async fn push(&self, entry: LogEntry) {
        let mut inner = self.inner.lock().await;
        inner.entries.push_back(entry);
        enforce_cap(&mut inner, self.cap);
    }

    /// A point-in-time copy of the buffer, oldest first, for JSONL upload.
    pub async fn snapshot(&self) -> Vec<LogEntry> {
        self.inner.lock().await.entries.iter().cloned().collect()
    }

    pub fn build_id(&self) -> BuildId {
        self.build_id
    }
}

/// Keep at most `cap` entries, reserving one slot for a gap marker once
/// anything has been dropped. Folds every overflowing entry into a running
/// count rather than growing the marker text per drop.
fn enforce_cap(inner: &mut Inner, cap: usize) {
    if inner.entries.len() <= cap {
        return;
    }

    let has_marker = inner.entries.front().is_some_and(|e| e.tag == GAP_MARKER_TAG);
    let target = if has_marker { cap } else { cap.saturating_sub(1) };

    let mut last_dropped: Option<LogEntry> = None;
    while inner.entries.len() > target {
        let idx = if has_marker { 1 } else { 0 };
        match inner.entries.remove(idx) {
            Some(dropped) => {
                inner.dropped += 1;
                last_dropped = Some(dropped);
            }
            None => break,
        }
    }

    let Some(last_dropped) = last_dropped else {
        return;
    };

    if has_marker {
        let marker = inner.entries.front_mut().expect("marker was just observed present");
        marker.log = format!("... {} lines omitted ...", inner.dropped);
        marker.time = last_dropped.time;
    } else {
        inner.entries.push_front(LogEntry {
            log: format!("... {} lines omitted ...", inner.dropped),
            source: last_dropped.source,
            tag: GAP_MARKER_TAG.to_string(),
            time: last_dropped.time,
            uuid: uuid::Uuid::new_v4(),
            build_id: last_dropped.build_id,
            container_id: last_dropped.container_id,
        });
    }
}

fn to_core_source(source: SandboxLogSource) -> CoreLogSource {
    match source {
        SandboxLogSource::Stdout => CoreLogSource::Stdout,
        SandboxLogSource::Stderr => CoreLogSource::Stderr,
    }
}

/// Drain `chunks` until the stream ends, splitting each chunk into lines,
/// appending every non-empty line to `buffer`, and best-effort publishing it
/// to the live-logs exchange. Returns once the stream is exhausted — callers
/// must await this before uploading logs.
pub async fn stream_to_buffer(
    mut chunks: BoxStream<'static, LogChunk>,
    buffer: Arc<LogBuffer>,
    sink: Arc<dyn EventSink>,
    container_id: Option<String>,
    tag: String,
) {
    let build_id = buffer.build_id();
    while let Some(chunk) = chunks.next().await {
        for line in chunk.content.split('\n') {
            if line.is_empty() {
                continue;
            }
            let entry = LogEntry::new(
                build_id,
                to_core_source(chunk.source),
                tag.clone(),
                line.to_string(),
                container_id.clone(),
            );
            buffer.push(entry.clone()).await;
            sink.publish_log(&build_id.to_string(), &entry).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(build_id: BuildId, line: &str) -> LogEntry {
        LogEntry::new(build_id, CoreLogSource::Stdout, "test", line, None)
    }

    #[tokio::test]
    async fn buffers_lines_in_order() {
        let build_id = BuildId::from_uuid(Uuid::nil());
        let buffer = LogBuffer::new(build_id);
        buffer.push(entry(build_id, "one")).await;
        buffer.push(entry(build_id, "two")).await;
        let snapshot = buffer.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].log, "one");
        assert_eq!(snapshot[1].log, "two");
    }

    #[tokio::test]
    async fn folds_overflow_into_a_single_gap_marker() {
        let build_id = BuildId::from_uuid(Uuid::nil());
        let buffer = LogBuffer::with_cap(build_id, 3);
        for i in 0..10 {
            buffer.push(entry(build_id, &format!("line-{i}"))).await;
        }
        let snapshot = buffer.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].tag, GAP_MARKER_TAG);
        assert!(snapshot[0].log.contains("omitted"));
        assert_eq!(snapshot[2].log, "line-9");
    }
}
