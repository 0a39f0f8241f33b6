//! Pre-container validation of a [`BuildJob`], grouping every violation into
//! one report instead of failing on the first bad field.

use std::sync::LazyLock;

use regex::Regex;

use crate::job::BuildJob;

/// Bounded-length ceilings used while validating a [`BuildJob`]. Each has a
/// sane default and is independently overridable from the environment.
#[derive(Debug, Clone, Copy)]
pub struct ValidationLimits {
    pub max_directory_len: usize,
    pub max_command_len: usize,
    pub max_node_version_len: usize,
    pub max_env_vars: usize,
    pub max_env_key_len: usize,
    pub max_env_value_len: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_directory_len: 256,
            max_command_len: 4096,
            max_node_version_len: 32,
            max_env_vars: 100,
            max_env_key_len: 128,
            max_env_value_len: 4096,
        }
    }
}

const ALLOWED_CLONE_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];

static SAFE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-./]+$").unwrap());
static NODE_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(lts|latest|[0-9]+(\.[0-9]+){0,2})$").unwrap());
static ENV_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// One field-level violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found while validating a single [`BuildJob`]. Empty means
/// valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

/// Validate every field of a [`BuildJob`], accumulating all violations before
/// returning. The job must not be used to create a container unless the
/// returned report `is_valid()`.
pub fn validate_build_job(job: &BuildJob, limits: &ValidationLimits) -> ValidationReport {
    let mut report = ValidationReport::default();

    if let Err(message) = validate_clone_url(&job.clone_url) {
        report.push("clone_url", message);
    }

    if let Err(message) = validate_upload_path(&job.artifacts_upload_path) {
        report.push("artifacts_upload_path", message);
    }
    if let Err(message) = validate_upload_path(&job.logs_upload_path) {
        report.push("logs_upload_path", message);
    }

    if !job.directory.is_empty() {
        validate_safe_path(&job.directory, "directory", limits.max_directory_len, &mut report);
    }
    validate_safe_path(&job.out_dir, "out_dir", limits.max_directory_len, &mut report);

    if job.install_command.len() > limits.max_command_len {
        report.push(
            "install_command",
            format!("exceeds max length of {}", limits.max_command_len),
        );
    }
    if job.build_command.len() > limits.max_command_len {
        report.push(
            "build_command",
            format!("exceeds max length of {}", limits.max_command_len),
        );
    }

    if let Some(node_version) = &job.node_version {
        if node_version.len() > limits.max_node_version_len {
            report.push(
                "node_version",
                format!("exceeds max length of {}", limits.max_node_version_len),
            );
        } else if !NODE_VERSION_RE.is_match(node_version) {
            report.push("node_version", "invalid format");
        }
    }

    if job.env_vars.len() > limits.max_env_vars {
        report.push(
            "env_vars",
            format!("exceeds max count of {}", limits.max_env_vars),
        );
    } else {
        for (key, value) in &job.env_vars {
            if key.len() > limits.max_env_key_len {
                report.push(
                    "env_vars",
                    format!("key '{key}' exceeds max length of {}", limits.max_env_key_len),
                );
            } else if !ENV_KEY_RE.is_match(key) {
                report.push("env_vars", format!("key '{key}' contains invalid characters"));
            }
            if value.len() > limits.max_env_value_len {
                report.push(
                    "env_vars",
                    format!(
                        "value for '{key}' exceeds max length of {}",
                        limits.max_env_value_len
                    ),
                );
            }
        }
    }

    report
}

fn validate_clone_url(clone_url: &str) -> Result<(), &'static str> {
    if clone_url.is_empty() {
        return Err("required");
    }
    let parsed = url::Url::parse(clone_url).map_err(|_| "invalid URL format")?;
    if parsed.scheme() != "https" {
        return Err("only HTTPS URLs are allowed");
    }
    let host = parsed.host_str().ok_or("missing host")?.to_ascii_lowercase();
    let allowed = ALLOWED_CLONE_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")));
    if !allowed {
        return Err("host is not allow-listed");
    }
    Ok(())
}

fn validate_upload_path(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("required");
    }
    // Server-relative paths are joined against API_BASE_URL later; a leading
    // slash keeps that join unambiguous, matching the upstream API contract.
    if !path.starts_with('/') {
        return Err("must be a server-relative path starting with '/'");
    }
    url::Url::parse(&format!("https://placeholder.invalid{path}")).map_err(|_| "invalid URL format")?;
    Ok(())
}

fn validate_safe_path(path: &str, field: &str, max_len: usize, report: &mut ValidationReport) {
    if path.len() > max_len {
        report.push(field, format!("exceeds max length of {max_len}"));
        return;
    }
    if path.split('/').any(|segment| segment == "..") {
        report.push(field, "path traversal not allowed");
        return;
    }
    if path.starts_with('/') {
        report.push(field, "absolute paths not allowed");
        return;
    }
    if !SAFE_PATH_RE.is_match(path) {
        report.push(field, "contains invalid characters");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::BuildId;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn valid_job() -> BuildJob {
        BuildJob {
            build_id: BuildId::from_uuid(Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap()),
            repo_full_name: "acme/widgets".to_string(),
            clone_url: "https://github.com/acme/widgets.git".to_string(),
            directory: "app".to_string(),
            out_dir: "dist".to_string(),
            install_command: "npm install".to_string(),
            build_command: "npm run build".to_string(),
            node_version: Some("20".to_string()),
            env_vars: HashMap::new(),
            artifacts_upload_path: "/builds/1/artifact".to_string(),
            logs_upload_path: "/builds/1/logs".to_string(),
            limits: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_job() {
        let report = validate_build_job(&valid_job(), &ValidationLimits::default());
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn rejects_non_https_clone_url() {
        let mut job = valid_job();
        job.clone_url = "http://evil.example/repo.git".to_string();
        let report = validate_build_job(&job, &ValidationLimits::default());
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.field == "clone_url"));
    }

    #[test]
    fn rejects_disallowed_clone_host() {
        let mut job = valid_job();
        job.clone_url = "https://evil.example/acme/widgets.git".to_string();
        let report = validate_build_job(&job, &ValidationLimits::default());
        assert!(!report.is_valid());
    }

    #[test]
    fn allows_clone_host_subdomain() {
        let mut job = valid_job();
        job.clone_url = "https://sub.github.com/acme/widgets.git".to_string();
        let report = validate_build_job(&job, &ValidationLimits::default());
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn rejects_path_traversal_in_out_dir() {
        let mut job = valid_job();
        job.out_dir = "../../etc".to_string();
        let report = validate_build_job(&job, &ValidationLimits::default());
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.field == "out_dir"));
    }

    #[test]
    fn rejects_absolute_out_dir() {
        let mut job = valid_job();
        job.out_dir = "/dist".to_string();
        let report = validate_build_job(&job, &ValidationLimits::default());
        assert!(!report.is_valid());
    }

    #[test]
    fn rejects_bad_node_version() {
        let mut job = valid_job();
        job.node_version = Some("not-a-version".to_string());
        let report = validate_build_job(&job, &ValidationLimits::default());
        assert!(!report.is_valid());
    }

    #[test]
    fn accepts_lts_and_latest_node_version_aliases() {
        for alias in ["lts", "latest", "18", "18.17", "18.17.0"] {
            let mut job = valid_job();
            job.node_version = Some(alias.to_string());
            let report = validate_build_job(&job, &ValidationLimits::default());
            assert!(report.is_valid(), "{alias} should be valid: {report}");
        }
    }

    #[test]
    fn rejects_bad_env_var_key() {
        let mut job = valid_job();
        job.env_vars.insert("1BAD".to_string(), "x".to_string());
        let report = validate_build_job(&job, &ValidationLimits::default());
        assert!(!report.is_valid());
    }

    #[test]
    fn accumulates_multiple_errors() {
        let mut job = valid_job();
        job.clone_url = "http://evil.example".to_string();
        job.out_dir = "../escape".to_string();
        let report = validate_build_job(&job, &ValidationLimits::default());
        assert_eq!(report.errors.len(), 2);
    }
}
