//! Connection lifecycle: connect, open a channel, declare topology.

use lapin::{Connection, ConnectionProperties};
use tracing::info;

use crate::error::{BrokerError, BrokerResult};
use crate::topology;

pub struct Broker {
    connection: Connection,
}

impl Broker {
    /// Connect to `url` and declare the job queue plus the events and
    /// live-logs exchanges. A failure at either step is fatal to worker
    /// startup.
    pub async fn connect(url: &str) -> BrokerResult<Self> {
        info!("connecting to broker");
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;
        topology::declare(&channel).await?;

        Ok(Self { connection })
    }

    /// Open a fresh channel for a consumer or a single job's publishes.
    pub async fn channel(&self) -> BrokerResult<lapin::Channel> {
        self.connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))
    }

    pub async fn close(&self) -> BrokerResult<()> {
        self.connection
            .close(200, "shutting down")
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))
    }
}
