use crate::feed::rss::parse_feed;
use crate::feed::FeedProvider;
use crate::state::Snapshot;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Replays a feed document saved on disk. The file is re-read on every
/// fetch, so replacing it between polls simulates feed changes.
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedProvider for FileFeed {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_observations(&self) -> Result<Vec<Snapshot>> {
        let xml = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read feed file {}", self.path.display()))?;
        parse_feed(&xml)
    }
}
