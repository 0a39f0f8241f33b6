//! OAuth2 client-credentials token fetch, backing both upload operations.

use serde::{Deserialize, Serialize};

use crate::error::{UploadError, UploadResult};

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// `POST <domain>/oauth/token` with a client-credentials body. Fetched once
/// per job; this worker never caches a token across jobs.
pub async fn fetch_token(
    client: &reqwest::Client,
    domain: &str,
    client_id: &str,
    client_secret: &str,
    audience: &str,
) -> UploadResult<AccessToken> {
    let url = format!("{}/oauth/token", domain.trim_end_matches('/'));

    let response = client
        .post(&url)
        .json(&TokenRequest {
            client_id,
            client_secret,
            audience,
            grant_type: "client_credentials",
        })
        .send()
        .await
        .map_err(|e| UploadError::Token(e.to_string()))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(UploadError::Token(format!("{} {}", status.as_u16(), body)));
    }

    serde_json::from_str(&body).map_err(|e| UploadError::Token(format!("invalid token response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_request_serializes_grant_type() {
        let req = TokenRequest {
            client_id: "id",
            client_secret: "secret",
            audience: "aud",
            grant_type: "client_credentials",
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"grant_type\":\"client_credentials\""));
    }
}
