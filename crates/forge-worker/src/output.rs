//! Host-side output directory preparation and artifact size/content checks.

use std::path::{Path, PathBuf};

use forge_core::limits::JobLimits;
use tracing::warn;

/// Names that should never end up in an uploaded artifact. Their presence is
/// logged but never fails the build — it's informational for the operator.
const SENSITIVE_NAMES: &[&str] = &[
    ".git",
    ".env",
    ".env.local",
    ".env.production",
    "node_modules",
    ".ssh",
    "id_rsa",
    "id_ed25519",
    ".npmrc",
    ".yarnrc",
];

/// `<host_out_dir>/<build_id>`, created with mode 0777 so the container's
/// non-root builder user can write into it regardless of umask.
pub fn prepare(host_out_dir: &str, build_id: &str) -> std::io::Result<PathBuf> {
    let dir = Path::new(host_out_dir).join(build_id);
    std::fs::create_dir_all(&dir)?;
    force_permissive_mode(&dir)?;
    Ok(dir)
}

#[cfg(unix)]
fn force_permissive_mode(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o777))
}

#[cfg(not(unix))]
fn force_permissive_mode(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Path to the zip archive an out-dir produces: `<root>/<out_dir>.zip`.
pub fn artifact_path(root: &Path, out_dir: &str) -> PathBuf {
    root.join(format!("{out_dir}.zip"))
}

/// Log a warning for every sensitive name found directly under `output_dir`.
/// Never fails the build.
pub fn scan_for_sensitive_files(output_dir: &Path) {
    for name in SENSITIVE_NAMES {
        if output_dir.join(name).exists() {
            warn!(output_dir = %output_dir.display(), name, "suspicious file or directory in build output");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSizeVerdict {
    Ok,
    ExceedsSoft,
    ExceedsHard,
}

/// Check the artifact's size on disk against the job's hard and soft limits.
pub fn check_artifact_size(zip_path: &Path, limits: &JobLimits) -> std::io::Result<(u64, ArtifactSizeVerdict)> {
    let size = std::fs::metadata(zip_path)?.len();
    let verdict = if size > limits.max_artifact_size_bytes {
        ArtifactSizeVerdict::ExceedsHard
    } else if size > limits.warn_artifact_size_bytes {
        ArtifactSizeVerdict::ExceedsSoft
    } else {
        ArtifactSizeVerdict::Ok
    };
    Ok((size, verdict))
}

/// Best-effort removal of a job's output directory after a successful
/// upload. Failure is logged, never propagated.
pub fn cleanup(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %dir.display(), error = %e, "failed to remove build output directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_creates_world_writable_directory() {
        let base = std::env::temp_dir().join(format!("forge-worker-test-{}", uuid::Uuid::new_v4()));
        let build_id = "11111111-2222-3333-4444-555555555555";
        let dir = prepare(base.to_str().unwrap(), build_id).expect("prepare should succeed");
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&base).ok();
    }

    #[test]
    fn artifact_size_verdicts() {
        let limits = JobLimits {
            max_artifact_size_bytes: 100,
            warn_artifact_size_bytes: 50,
            ..JobLimits::default()
        };

        let tmp = std::env::temp_dir().join(format!("forge-artifact-{}.zip", uuid::Uuid::new_v4()));
        std::fs::write(&tmp, vec![0u8; 40]).unwrap();
        let (size, verdict) = check_artifact_size(&tmp, &limits).unwrap();
        assert_eq!(size, 40);
        assert_eq!(verdict, ArtifactSizeVerdict::Ok);

        std::fs::write(&tmp, vec![0u8; 70]).unwrap();
        let (_, verdict) = check_artifact_size(&tmp, &limits).unwrap();
        assert_eq!(verdict, ArtifactSizeVerdict::ExceedsSoft);

        std::fs::write(&tmp, vec![0u8; 200]).unwrap();
        let (_, verdict) = check_artifact_size(&tmp, &limits).unwrap();
        assert_eq!(verdict, ArtifactSizeVerdict::ExceedsHard);

        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn scan_does_not_panic_on_clean_directory() {
        let dir = std::env::temp_dir().join(format!("forge-scan-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        scan_for_sensitive_files(&dir);
        std::fs::remove_dir_all(&dir).ok();
    }
}
