//! Best-effort publishing of lifecycle events and live log lines.

use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel};
use serde::Serialize;
use tracing::warn;

use crate::topology::{EVENTS_EXCHANGE, LOGS_EXCHANGE, logs_routing_key};

/// Publish a `JobStatusEvent` to the fan-out events exchange. Errors are
/// logged, never propagated: a dropped status event must not fail the build.
pub async fn publish_event(channel: &Channel, event: &impl Serialize) {
    match serde_json::to_vec(event) {
        Ok(body) => {
            if let Err(e) = channel
                .basic_publish(
                    EVENTS_EXCHANGE,
                    "",
                    BasicPublishOptions::default(),
                    &body,
                    BasicProperties::default(),
                )
                .await
            {
                warn!(error = %e, "failed to publish status event");
            }
        }
        Err(e) => warn!(error = %e, "failed to serialize status event"),
    }
}

/// Publish a `LogEntry` to the live-logs topic exchange, routed by build id.
/// Best-effort: the line stays in the in-memory buffer regardless of outcome.
pub async fn publish_log_entry(channel: &Channel, build_id: &str, entry: &impl Serialize) {
    match serde_json::to_vec(entry) {
        Ok(body) => {
            let routing_key = logs_routing_key(build_id);
            if let Err(e) = channel
                .basic_publish(
                    LOGS_EXCHANGE,
                    &routing_key,
                    BasicPublishOptions::default(),
                    &body,
                    BasicProperties::default(),
                )
                .await
            {
                warn!(error = %e, build_id, "failed to publish live log entry");
            }
        }
        Err(e) => warn!(error = %e, "failed to serialize log entry"),
    }
}
