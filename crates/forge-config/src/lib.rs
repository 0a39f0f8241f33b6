//! Environment-derived configuration for the build-execution worker.

pub mod env;
pub mod error;
pub mod worker;

pub use error::{ConfigError, ConfigResult};
pub use worker::{AuthConfig, WorkerConfig};
