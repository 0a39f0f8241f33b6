//! Signal handling and graceful drain of in-flight jobs.

use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 60-second ceiling on waiting for in-flight jobs to finish after the first
/// shutdown signal, matching the consumer loop's own drain budget.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Wait for SIGINT or SIGTERM, then cancel `root`. Only the first signal has
/// any effect; a second signal while draining is ignored here, since the
/// drain deadline below bounds how long the process can hang regardless.
pub async fn wait_for_signal(root: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("received interrupt signal"),
            _ = terminate.recv() => info!("received terminate signal"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("received interrupt signal");
    }

    root.cancel();
}

/// Block on every in-flight job in `jobs` completing, up to [`DRAIN_TIMEOUT`].
/// Jobs still outstanding past the deadline are abandoned so the process can
/// exit regardless.
pub async fn drain(mut jobs: JoinSet<()>) {
    if jobs.is_empty() {
        return;
    }
    info!(in_flight = jobs.len(), "draining in-flight jobs before exit");
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while jobs.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(remaining = jobs.len(), "drain deadline exceeded, exiting with jobs still in flight");
    }
}
