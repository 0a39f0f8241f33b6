//! Declares the queue and exchanges the worker depends on.

use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{Channel, ExchangeKind};

use crate::error::{BrokerError, BrokerResult};

pub const JOB_QUEUE: &str = "job_queue";
pub const EVENTS_EXCHANGE: &str = "app.build.events";
pub const LOGS_EXCHANGE: &str = "app.build.logs";

/// Declare `job_queue` (durable), the fan-out events exchange (durable), and
/// the topic live-logs exchange (non-durable), binding the queue to nothing
/// else — deliveries reach it only via direct publish to its name.
pub async fn declare(channel: &Channel) -> BrokerResult<()> {
    let mut queue_args = FieldTable::default();
    // Builds can run up to SystemLimits::max_build_duration_secs; give the
    // broker enough slack that a slow build isn't treated as a stalled consumer.
    queue_args.insert("x-consumer-timeout".into(), AMQPValue::LongInt(24 * 3600 * 1000));

    channel
        .queue_declare(
            JOB_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            queue_args,
        )
        .await
        .map_err(|e| BrokerError::Topology(format!("declare {JOB_QUEUE}: {e}")))?;

    channel
        .exchange_declare(
            EVENTS_EXCHANGE,
            ExchangeKind::Fanout,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| BrokerError::Topology(format!("declare {EVENTS_EXCHANGE}: {e}")))?;

    channel
        .exchange_declare(
            LOGS_EXCHANGE,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: false,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| BrokerError::Topology(format!("declare {LOGS_EXCHANGE}: {e}")))?;

    Ok(())
}

/// Bind `queue` to `exchange` with `routing_key`. Unused for the default
/// topology (the job queue is published to directly) but kept for deployments
/// that want a durable subscriber on the live-logs exchange.
pub async fn bind(channel: &Channel, queue: &str, exchange: &str, routing_key: &str) -> BrokerResult<()> {
    channel
        .queue_bind(queue, exchange, routing_key, QueueBindOptions::default(), FieldTable::default())
        .await
        .map_err(|e| BrokerError::Topology(format!("bind {queue} to {exchange}: {e}")))
}

pub fn logs_routing_key(build_id: &str) -> String {
    format!("{LOGS_EXCHANGE}.{build_id}")
}
