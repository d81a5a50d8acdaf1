use crate::feed::rss::parse_feed;
use crate::feed::FeedProvider;
use crate::state::Snapshot;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const BASE_URL: &str = "https://secure.logmein.com";

/// Polls the LogMeIn profile RSS feed over HTTPS.
///
/// The secret key is sent as a query parameter and never logged.
pub struct LogMeInFeed {
    profile_id: u64,
    secret_key: String,
    base_url: String,
    http_client: Client,
}

impl LogMeInFeed {
    /// Create a feed against the real LogMeIn endpoint.
    pub fn new(profile_id: u64, secret_key: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(profile_id, secret_key, BASE_URL.to_string(), timeout)
    }

    /// Create a feed with a custom base URL (for testing with a mock server).
    pub fn with_base_url(
        profile_id: u64,
        secret_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("hostwatch/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            profile_id,
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn profile_id(&self) -> u64 {
        self.profile_id
    }
}

#[async_trait]
impl FeedProvider for LogMeInFeed {
    fn name(&self) -> &str {
        "logmein"
    }

    async fn fetch_observations(&self) -> Result<Vec<Snapshot>> {
        let url = format!("{}/usershortcut.asp", self.base_url);
        let profile_id = self.profile_id.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.secret_key.as_str()),
                ("profileid", profile_id.as_str()),
                ("showoffline", "1"),
                ("lmiextensions", "1"),
            ])
            .send()
            .await
            .context("Failed to send feed request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Feed request returned error status {}", status);
        }

        let body = response
            .text()
            .await
            .context("Failed to read feed response body")?;

        parse_feed(&body)
    }
}
