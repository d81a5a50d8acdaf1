//! Feed providers - sources of host observations.
//!
//! A provider turns some remote or local document into an ordered batch of
//! [`Snapshot`]s. Providers never hand the core an observation without a
//! usable host id; malformed entries are dropped during parsing.
//!
//! ```text
//! LogMeIn RSS (HTTP)  |  saved feed document (file)
//!          ↓
//!     rss::parse_feed
//!          ↓
//!   Vec<Snapshot>  →  Scheduler  →  Registry
//! ```

mod file;
mod logmein;
pub mod rss;

pub use file::FileFeed;
pub use logmein::{LogMeInFeed, BASE_URL};
pub use rss::parse_feed;

use crate::state::Snapshot;
use anyhow::Result;
use async_trait::async_trait;

/// Source of host observations polled by the [`Scheduler`](crate::watch::Scheduler).
///
/// # Example
/// ```no_run
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use hostwatch::feed::FeedProvider;
/// use hostwatch::state::Snapshot;
///
/// struct StaticFeed(Vec<Snapshot>);
///
/// #[async_trait]
/// impl FeedProvider for StaticFeed {
///     fn name(&self) -> &str {
///         "static"
///     }
///
///     async fn fetch_observations(&self) -> Result<Vec<Snapshot>> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Fetch one batch of observations, in feed order.
    ///
    /// # Returns
    /// * `Ok(snapshots)` - every well-formed observation in the feed
    /// * `Err(...)` - network or document-level failure; the scheduler logs
    ///   it and treats the cycle as empty
    async fn fetch_observations(&self) -> Result<Vec<Snapshot>>;
}
