//! System-wide resource ceilings and the per-job limits derived from them.

use crate::job::PlanLimits;

pub const MB: u64 = 1024 * 1024;
pub const GB: u64 = 1024 * MB;

/// Maximum limits enforced by the worker process. Plan limits are clamped
/// against these; they can never be amplified past them.
#[derive(Debug, Clone, Copy)]
pub struct SystemLimits {
    pub max_memory_bytes: u64,
    pub max_cpu_percent: u32,
    pub max_build_duration_secs: u64,
    pub max_artifact_size_bytes: u64,
    pub container_pids_limit: u64,
    pub max_concurrent_jobs: usize,
}

impl Default for SystemLimits {
    fn default() -> Self {
        Self {
            max_memory_bytes: 4 * GB,
            max_cpu_percent: 400,
            max_build_duration_secs: 3600,
            max_artifact_size_bytes: GB,
            container_pids_limit: 512,
            max_concurrent_jobs: 3,
        }
    }
}

/// Effective limits for a single job: the plan's request, clamped by
/// [`SystemLimits`], with soft thresholds derived from the hard ones.
#[derive(Debug, Clone, Copy)]
pub struct JobLimits {
    pub memory_bytes: u64,
    pub memory_soft_bytes: u64,
    pub cpu_quota: i64,
    pub cpu_period: i64,
    pub pids_limit: u64,
    pub build_duration_secs: u64,
    pub max_artifact_size_bytes: u64,
    pub warn_artifact_size_bytes: u64,
}

impl Default for JobLimits {
    fn default() -> Self {
        Self {
            memory_bytes: GB,
            memory_soft_bytes: 768 * MB,
            cpu_quota: 100_000,
            cpu_period: 100_000,
            pids_limit: 256,
            build_duration_secs: 600,
            max_artifact_size_bytes: 100 * MB,
            warn_artifact_size_bytes: 50 * MB,
        }
    }
}

impl JobLimits {
    /// `true` iff every field is at or below the corresponding system ceiling.
    /// This is the invariant the worker must uphold for every job it runs.
    pub fn within(&self, system: &SystemLimits) -> bool {
        let cpu_percent = self.cpu_quota * 100 / self.cpu_period.max(1);
        self.memory_bytes <= system.max_memory_bytes
            && self.pids_limit <= system.container_pids_limit
            && self.build_duration_secs <= system.max_build_duration_secs
            && self.max_artifact_size_bytes <= system.max_artifact_size_bytes
            && cpu_percent <= system.max_cpu_percent as i64
    }
}

/// Resolve the effective [`JobLimits`] for a job: start from `default_job`,
/// apply any plan override (clamped to `system`), then derive soft thresholds.
pub fn resolve_job_limits(
    plan: Option<&PlanLimits>,
    default_job: &JobLimits,
    system: &SystemLimits,
) -> JobLimits {
    let mut job = *default_job;

    let Some(plan) = plan else {
        return job;
    };

    if let Some(memory_mb) = plan.memory_mb.filter(|v| *v > 0) {
        let mut bytes = memory_mb * MB;
        if bytes > system.max_memory_bytes {
            bytes = system.max_memory_bytes;
        }
        job.memory_bytes = bytes;
        job.memory_soft_bytes = bytes * 3 / 4;
    }

    if let Some(cpu_percent) = plan.cpu_percent.filter(|v| *v > 0) {
        let mut percent = cpu_percent;
        if percent > system.max_cpu_percent {
            percent = system.max_cpu_percent;
        }
        job.cpu_quota = percent as i64 * 1000;
    }

    if let Some(timeout) = plan.build_timeout_s.filter(|v| *v > 0) {
        job.build_duration_secs = timeout.min(system.max_build_duration_secs);
    }

    if let Some(artifact_mb) = plan.artifact_size_mb.filter(|v| *v > 0) {
        let mut bytes = artifact_mb * MB;
        if bytes > system.max_artifact_size_bytes {
            bytes = system.max_artifact_size_bytes;
        }
        job.max_artifact_size_bytes = bytes;
        job.warn_artifact_size_bytes = bytes / 2;
    }

    job
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_system_ceiling() {
        let system = SystemLimits::default();
        let job = JobLimits::default();
        assert!(job.within(&system));
    }

    #[test]
    fn within_rejects_cpu_quota_over_the_system_ceiling() {
        let system = SystemLimits {
            max_cpu_percent: 50,
            ..SystemLimits::default()
        };
        let job = JobLimits::default(); // cpu_quota/cpu_period resolve to 100%
        assert!(!job.within(&system));
    }

    #[test]
    fn plan_limits_are_clamped_not_amplified() {
        let system = SystemLimits {
            max_memory_bytes: 2 * GB,
            max_cpu_percent: 100,
            max_build_duration_secs: 300,
            max_artifact_size_bytes: 50 * MB,
            ..SystemLimits::default()
        };
        let plan = PlanLimits {
            memory_mb: Some(8192), // way over the system ceiling
            cpu_percent: Some(800),
            build_timeout_s: Some(7200),
            artifact_size_mb: Some(1000),
        };

        let job = resolve_job_limits(Some(&plan), &JobLimits::default(), &system);

        assert_eq!(job.memory_bytes, 2 * GB);
        assert_eq!(job.memory_soft_bytes, (2 * GB) * 3 / 4);
        assert_eq!(job.cpu_quota, 100 * 1000);
        assert_eq!(job.build_duration_secs, 300);
        assert_eq!(job.max_artifact_size_bytes, 50 * MB);
        assert_eq!(job.warn_artifact_size_bytes, 25 * MB);
        assert!(job.within(&system));
    }

    #[test]
    fn absent_plan_falls_back_to_default() {
        let system = SystemLimits::default();
        let default_job = JobLimits::default();
        let job = resolve_job_limits(None, &default_job, &system);
        assert_eq!(job.memory_bytes, default_job.memory_bytes);
    }

    #[test]
    fn zero_or_negative_plan_fields_are_ignored() {
        let system = SystemLimits::default();
        let default_job = JobLimits::default();
        let plan = PlanLimits {
            memory_mb: Some(0),
            cpu_percent: None,
            build_timeout_s: Some(0),
            artifact_size_mb: None,
        };
        let job = resolve_job_limits(Some(&plan), &default_job, &system);
        assert_eq!(job.memory_bytes, default_job.memory_bytes);
        assert_eq!(job.build_duration_secs, default_job.build_duration_secs);
    }
}
