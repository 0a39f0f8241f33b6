//! Artifact/log uploading and token fetching for the build-execution worker.

pub mod error;
pub mod token;
pub mod uploader;

pub use error::{UploadError, UploadResult};
pub use token::{AccessToken, fetch_token};
pub use uploader::{HttpUploader, OAuthCredentials, Uploader};
