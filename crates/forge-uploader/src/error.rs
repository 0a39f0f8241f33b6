//! Upload and token-fetch errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read file to upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Request(String),

    #[error("upload rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to fetch access token: {0}")]
    Token(String),
}

pub type UploadResult<T> = std::result::Result<T, UploadError>;
