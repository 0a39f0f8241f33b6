//! Build-execution worker entry point.
//!
//! Consumes build jobs from a durable queue, runs each in an isolated
//! container, streams logs live, and uploads the resulting artifact.

mod consumer;
mod log_streamer;
mod output;
mod pipeline;
mod shutdown;

use std::sync::Arc;

use forge_broker::{Broker, ChannelEventSink};
use forge_config::WorkerConfig;
use forge_sandbox::DockerSandbox;
use forge_uploader::{HttpUploader, OAuthCredentials};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pipeline::PipelineContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match WorkerConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    info!(max_concurrent_jobs = config.max_concurrent_jobs, "configuration loaded");

    let broker = match Broker::connect(&config.rabbitmq_url).await {
        Ok(broker) => broker,
        Err(e) => {
            error!(error = %e, "failed to connect to broker");
            std::process::exit(1);
        }
    };

    let consume_channel = match broker.channel().await {
        Ok(channel) => channel,
        Err(e) => {
            error!(error = %e, "failed to open consumer channel");
            std::process::exit(1);
        }
    };
    let publish_channel = match broker.channel().await {
        Ok(channel) => channel,
        Err(e) => {
            error!(error = %e, "failed to open publisher channel");
            std::process::exit(1);
        }
    };

    let lapin_consumer = match forge_broker::consumer::consume(
        &consume_channel,
        config.max_concurrent_jobs as u16,
        "forge-worker",
    )
    .await
    {
        Ok(consumer) => consumer,
        Err(e) => {
            error!(error = %e, "failed to start consuming job queue");
            std::process::exit(1);
        }
    };

    let sandbox = match DockerSandbox::new() {
        Ok(sandbox) => Arc::new(sandbox),
        Err(e) => {
            error!(error = %e, "failed to connect to the container runtime");
            std::process::exit(1);
        }
    };

    let uploader = Arc::new(HttpUploader::new(OAuthCredentials {
        domain: config.auth.domain.clone(),
        client_id: config.auth.client_id.clone(),
        client_secret: config.auth.client_secret.clone(),
        audience: config.auth.audience.clone(),
    }));

    let pipeline_ctx = Arc::new(PipelineContext {
        config: config.clone(),
        sandbox,
        uploader,
        sink: Arc::new(ChannelEventSink::new(publish_channel)),
    });

    let root_cancel = CancellationToken::new();
    let slots = Arc::new(Semaphore::new(config.max_concurrent_jobs));
    let mut jobs = JoinSet::new();

    let signal_task = tokio::spawn(shutdown::wait_for_signal(root_cancel.clone()));

    consumer::run(lapin_consumer, pipeline_ctx, slots, &mut jobs, root_cancel.clone()).await;

    root_cancel.cancel();
    signal_task.abort();
    shutdown::drain(jobs).await;

    broker.close().await.ok();
    info!("worker shut down cleanly");
    Ok(())
}
