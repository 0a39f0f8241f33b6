//! Multipart artifact and log uploads with content hashing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{UploadError, UploadResult};
use crate::token::{self, AccessToken};

const USER_AGENT: &str = "deployment-worker";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ArtifactResponse {
    #[serde(rename = "artifactId", default)]
    artifact_id: String,
}

/// OAuth2 client-credentials coordinates backing [`Uploader::fetch_token`].
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub domain: String,
    pub client_id: String,
    pub client_secret: String,
    pub audience: String,
}

/// Upload operations the job pipeline depends on. A trait so pipeline tests
/// can stub network I/O entirely.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn fetch_token(&self) -> UploadResult<AccessToken>;
    async fn upload_artifact(&self, url: &str, file_name: &str, bytes: Vec<u8>, token: &str) -> UploadResult<String>;
    async fn upload_logs(&self, url: &str, file_name: &str, bytes: Vec<u8>, token: &str) -> UploadResult<()>;
}

pub struct HttpUploader {
    client: reqwest::Client,
    auth: OAuthCredentials,
}

impl HttpUploader {
    pub fn new(auth: OAuthCredentials) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client builder should not fail with static config"),
            auth,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn content_hash(bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        hex::encode(digest)
    }

    async fn put_multipart(&self, url: &str, file_name: &str, bytes: Vec<u8>, token: &str) -> UploadResult<String> {
        let content_hash = Self::content_hash(&bytes);
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("contentHash", content_hash);

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn fetch_token(&self) -> UploadResult<AccessToken> {
        token::fetch_token(
            &self.client,
            &self.auth.domain,
            &self.auth.client_id,
            &self.auth.client_secret,
            &self.auth.audience,
        )
        .await
    }

    async fn upload_artifact(&self, url: &str, file_name: &str, bytes: Vec<u8>, token: &str) -> UploadResult<String> {
        info!(url, file_name, "uploading artifact");
        let body = self.put_multipart(url, file_name, bytes, token).await?;

        match serde_json::from_str::<ArtifactResponse>(&body) {
            Ok(parsed) => Ok(parsed.artifact_id),
            Err(e) => {
                // An unparseable success response is not itself an error: the
                // upload completed, we simply have no artifact id to report.
                warn!(error = %e, "failed to parse artifact upload response");
                Ok(String::new())
            }
        }
    }

    async fn upload_logs(&self, url: &str, file_name: &str, bytes: Vec<u8>, token: &str) -> UploadResult<()> {
        info!(url, file_name, bytes = bytes.len(), "uploading logs");
        self.put_multipart(url, file_name, bytes, token).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_lowercase_hex_sha256() {
        let hash = HttpUploader::content_hash(b"hello");
        assert_eq!(hash, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn parses_artifact_id_from_camel_case_response() {
        let parsed: ArtifactResponse = serde_json::from_str(r#"{"artifactId":"abc-123"}"#).unwrap();
        assert_eq!(parsed.artifact_id, "abc-123");
    }

    #[test]
    fn missing_artifact_id_defaults_to_empty() {
        let parsed: ArtifactResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.artifact_id, "");
    }
}
