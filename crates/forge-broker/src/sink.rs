//! Trait boundary over event/log publishing so callers can be driven by a
//! stub in tests instead of a live channel.

use async_trait::async_trait;
use forge_core::event::JobStatusEvent;
use forge_core::log::LogEntry;
use lapin::Channel;

use crate::publisher::{publish_event, publish_log_entry};

/// Everything the job pipeline needs from the broker after a delivery has
/// been accepted: publishing status transitions and live log lines. Both
/// operations are best-effort by contract — neither returns a `Result`, since
/// a dropped publish must never change a build's outcome.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish_event(&self, event: &JobStatusEvent);
    async fn publish_log(&self, build_id: &str, entry: &LogEntry);
}

/// The production [`EventSink`], backed by a single AMQP channel.
pub struct ChannelEventSink {
    channel: Channel,
}

impl ChannelEventSink {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn publish_event(&self, event: &JobStatusEvent) {
        publish_event(&self.channel, event).await;
    }

    async fn publish_log(&self, build_id: &str, entry: &LogEntry) {
        publish_log_entry(&self.channel, build_id, entry).await;
    }
}
