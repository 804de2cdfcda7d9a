use std::time::Duration;

use harvest_core::error::AppError;
use harvest_core::traits::FeedSource;
use reqwest::Client;

const USER_AGENT: &str = "harvest/0.1 (feed collector)";

/// Feed source that re-fetches a server-rendered feed page over HTTP.
///
/// A static render has no viewport, so [`FeedSource::scroll_by`] does
/// nothing; every snapshot is a fresh GET, and newly published posts show
/// up on later cycles. Use the `browser` feature for infinite-scroll feeds.
#[derive(Clone)]
pub struct HttpFeed {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        Self::with_timeout(url, Duration::from_secs(30))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedSource for HttpFeed {
    async fn scroll_by(&mut self, pixels: u32) -> Result<(), AppError> {
        tracing::trace!(%pixels, "Static feed, scroll ignored");
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String, AppError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                self.url
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;
        tracing::debug!(bytes = html.len(), "Fetched feed page");
        Ok(html)
    }
}
