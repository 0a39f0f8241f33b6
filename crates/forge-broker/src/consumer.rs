//! Manual-ack delivery handling for the job queue.

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Consumer};
use serde::de::DeserializeOwned;

use crate::error::{BrokerError, BrokerResult};
use crate::topology::JOB_QUEUE;

/// A job-queue delivery. Decoding is kept separate from acking so a
/// malformed body can still be nacked by the caller rather than lost.
pub struct JobDelivery {
    delivery: Delivery,
}

impl JobDelivery {
    /// Decode the raw body as `T`. Does not consume the delivery, since a
    /// decode failure still needs to be nacked.
    pub fn decode<T: DeserializeOwned>(&self) -> BrokerResult<T> {
        Ok(serde_json::from_slice(&self.delivery.data)?)
    }

    /// Acknowledge successful processing.
    pub async fn ack(self) -> BrokerResult<()> {
        self.delivery
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| BrokerError::Acknowledge(e.to_string()))
    }

    /// Reject without requeue, so a poison message is dropped rather than
    /// redelivered forever.
    pub async fn nack_no_requeue(self) -> BrokerResult<()> {
        self.delivery
            .nack(BasicNackOptions {
                requeue: false,
                ..Default::default()
            })
            .await
            .map_err(|e| BrokerError::Acknowledge(e.to_string()))
    }
}

/// Set channel prefetch and start consuming `job_queue` with manual ack.
pub async fn consume(channel: &Channel, prefetch: u16, consumer_tag: &str) -> BrokerResult<Consumer> {
    channel
        .basic_qos(prefetch, BasicQosOptions::default())
        .await
        .map_err(|e| BrokerError::Consume(format!("set prefetch: {e}")))?;

    channel
        .basic_consume(
            JOB_QUEUE,
            consumer_tag,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| BrokerError::Consume(format!("consume {JOB_QUEUE}: {e}")))
}

/// Pull the next delivery off `consumer`. Returns `Ok(None)` once the
/// consumer stream ends (channel/connection closed).
pub async fn next_job(consumer: &mut Consumer) -> BrokerResult<Option<JobDelivery>> {
    let Some(result) = consumer.next().await else {
        return Ok(None);
    };
    let delivery = result.map_err(|e| BrokerError::Consume(e.to_string()))?;
    Ok(Some(JobDelivery { delivery }))
}
