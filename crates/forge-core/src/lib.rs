//! Core domain types for the build-execution worker.
//!
//! This crate contains:
//! - the `BuildJob` message shape and plan limits
//! - system/job resource limits and their clamping rules
//! - pre-container validation of job fields
//! - log entry and status event wire types

pub mod error;
pub mod event;
pub mod id;
pub mod job;
pub mod limits;
pub mod log;
pub mod validation;

pub use error::{Error, Result};
pub use id::BuildId;
