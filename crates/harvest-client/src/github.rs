use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use harvest_core::error::AppError;
use harvest_core::models::UploadReceipt;
use harvest_core::traits::Uploader;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::GitHubConfig;

const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "harvest/0.1 (feed collector)";

/// Uploader backed by the GitHub repository contents API.
///
/// Each file is one `PUT /repos/{owner}/{repo}/contents/{path}` carrying
/// the base64 of the content's UTF-8 bytes. If the path already exists the
/// API answers 422; the uploader then fetches the current blob sha and
/// repeats the PUT with it, overwriting the file.
#[derive(Clone)]
pub struct GitHubUploader {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    token: String,
    timeout_secs: u64,
}

impl GitHubUploader {
    pub fn new(config: &GitHubConfig) -> Result<Self, AppError> {
        Self::with_timeout(config, DEFAULT_UPLOAD_TIMEOUT)
    }

    pub fn with_timeout(config: &GitHubConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
            timeout_secs: timeout.as_secs(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })
    }

    async fn put(&self, path: &str, body: &PutContents<'_>) -> Result<Response, AppError> {
        let request = self.authorized(self.client.put(self.contents_url(path))).json(body);
        self.send(request).await
    }

    /// Sha of the file currently at `path` on the target branch.
    async fn existing_sha(&self, path: &str) -> Result<String, AppError> {
        let url = format!("{}?ref={}", self.contents_url(path), self.branch);
        let request = self.authorized(self.client.get(url));
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let existing: ExistingFile = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse contents response: {e}")))?;
        Ok(existing.sha)
    }
}

// ---- GitHub API types ----

#[derive(Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Deserialize)]
struct PutContentsResponse {
    content: Option<ContentInfo>,
}

#[derive(Deserialize)]
struct ContentInfo {
    path: String,
    sha: String,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct ExistingFile {
    sha: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Base64 of the UTF-8 bytes, as the contents API expects.
pub fn encode_content(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

/// Map a failed response to an error, consuming the body for its message.
async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    let body = response.text().await.unwrap_or_default();
    classify(status, rate_limited, &body)
}

fn classify(status: StatusCode, rate_limited: bool, body: &str) -> AppError {
    let status_code = status.as_u16();
    if status_code == 429 || (status_code == 403 && rate_limited) {
        return AppError::RateLimitExceeded;
    }

    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));

    AppError::UploadError {
        message,
        status_code,
        retryable: status.is_server_error(),
    }
}

impl Uploader for GitHubUploader {
    async fn upload(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<UploadReceipt, AppError> {
        let mut body = PutContents {
            message,
            content: encode_content(content),
            branch: &self.branch,
            sha: None,
        };

        let mut response = self.put(path, &body).await?;
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            tracing::info!(%path, "File exists, overwriting");
            body.sha = Some(self.existing_sha(path).await?);
            response = self.put(path, &body).await?;
        }

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let created: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse upload response: {e}")))?;

        Ok(match created.content {
            Some(info) => UploadReceipt {
                path: info.path,
                sha: Some(info.sha),
                location: info.html_url,
            },
            None => UploadReceipt {
                path: path.to_string(),
                sha: None,
                location: None,
            },
        })
    }
}
