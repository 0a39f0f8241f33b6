//! Consumer loop: pulls deliveries off the job queue and spawns one pipeline
//! task per delivery, bounded by a semaphore independent of broker prefetch.

use std::sync::Arc;

use forge_broker::consumer::next_job;
use forge_core::job::BuildJob;
use lapin::Consumer;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::pipeline::{self, PipelineContext};

/// Consume deliveries until `cancel` fires or the consumer stream ends,
/// spawning each job onto `jobs` after acquiring a slot from `slots`.
pub async fn run(
    mut consumer: Consumer,
    ctx: Arc<PipelineContext>,
    slots: Arc<Semaphore>,
    jobs: &mut JoinSet<()>,
    cancel: CancellationToken,
) {
    loop {
        let delivery = tokio::select! {
            result = next_job(&mut consumer) => result,
            _ = cancel.cancelled() => {
                info!("shutdown requested, no longer accepting new deliveries");
                return;
            }
        };

        let delivery = match delivery {
            Ok(Some(delivery)) => delivery,
            Ok(None) => {
                warn!("consumer stream ended");
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to read delivery");
                continue;
            }
        };

        let job: BuildJob = match delivery.decode() {
            Ok(job) => job,
            Err(e) => {
                warn!(error = %e, "delivery body was not a valid build job");
                delivery.nack_no_requeue().await.ok();
                continue;
            }
        };

        let Ok(permit) = slots.clone().acquire_owned().await else {
            error!("job slot semaphore closed unexpectedly");
            return;
        };

        let ctx = ctx.clone();
        let job_cancel = cancel.child_token();
        jobs.spawn(async move {
            let build_id = job.build_id;
            let outcome = pipeline::run(job, &ctx, job_cancel).await;

            let ack_result = if outcome.should_ack() {
                delivery.ack().await
            } else {
                delivery.nack_no_requeue().await
            };
            if let Err(e) = ack_result {
                error!(%build_id, error = %e, "failed to acknowledge delivery");
            }

            drop(permit);
        });
    }
}
