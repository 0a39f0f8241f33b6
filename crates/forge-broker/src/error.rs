//! Broker connection and topology errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to connect to broker: {0}")]
    Connect(String),

    #[error("failed to declare topology: {0}")]
    Topology(String),

    #[error("failed to consume: {0}")]
    Consume(String),

    #[error("failed to publish: {0}")]
    Publish(String),

    #[error("failed to ack/nack delivery: {0}")]
    Acknowledge(String),

    #[error("delivery body was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type BrokerResult<T> = std::result::Result<T, BrokerError>;
