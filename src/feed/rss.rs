//! LogMeIn host RSS document parsing.
//!
//! Expected shape:
//!
//! ```xml
//! <rss version="2.0">
//!   <channel>
//!     <lastBuildDate>Mon, 2 Jan 2006 15:04:05 MST</lastBuildDate>
//!     <item>
//!       <lmihostinfo>
//!         <description>build-server</description>
//!         <ip>10.0.0.5</ip>
//!         <status>1</status>
//!         <link>https://secure.logmein.com/...?hostid=42</link>
//!       </lmihostinfo>
//!     </item>
//!   </channel>
//! </rss>
//! ```

use crate::state::{Snapshot, StatusValue};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::net::IpAddr;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "lastBuildDate", default)]
    last_build_date: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    lmihostinfo: Option<HostInfo>,
}

#[derive(Debug, Deserialize)]
struct HostInfo {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// Parse a feed document into snapshots, in document order.
///
/// All snapshots share the document's `lastBuildDate` (or the current time
/// when it is missing or unparsable). Items without a numeric `hostid` in
/// their link, or without a numeric status, are skipped.
///
/// # Errors
/// The document is not well-formed or has no `<channel>`.
pub fn parse_feed(xml: &str) -> Result<Vec<Snapshot>> {
    let rss: Rss = quick_xml::de::from_str(xml).context("Failed to parse feed document")?;

    let timestamp = rss
        .channel
        .last_build_date
        .as_deref()
        .and_then(parse_build_date)
        .unwrap_or_else(Utc::now);

    let total = rss.channel.items.len();
    let snapshots: Vec<Snapshot> = rss
        .channel
        .items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| item_to_snapshot(index, item, timestamp))
        .collect();

    debug!(
        items = total,
        accepted = snapshots.len(),
        "Parsed feed document"
    );

    Ok(snapshots)
}

fn item_to_snapshot(index: usize, item: Item, timestamp: DateTime<Utc>) -> Option<Snapshot> {
    let Some(info) = item.lmihostinfo else {
        debug!(item = index, "Feed item has no host info, skipping");
        return None;
    };

    let Some(host_id) = info.link.as_deref().and_then(host_id_from_link) else {
        debug!(item = index, link = ?info.link, "Feed item has no usable hostid, skipping");
        return None;
    };

    let Some(status) = info.status.as_deref().and_then(|s| s.trim().parse::<i32>().ok()) else {
        debug!(item = index, host_id = host_id, status = ?info.status, "Feed item has no usable status, skipping");
        return None;
    };

    let address = info
        .ip
        .as_deref()
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    Some(Snapshot {
        host_id,
        timestamp,
        name: info.description.unwrap_or_default().trim().to_string(),
        address,
        status: StatusValue(status),
    })
}

/// `Mon, 2 Jan 2006 15:04:05 MST` and friends
fn parse_build_date(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc2822(value.trim()) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            debug!(value = %value, error = %e, "Unparsable lastBuildDate, using current time");
            None
        }
    }
}

/// Extract the `hostid` query parameter from a host link
fn host_id_from_link(link: &str) -> Option<u64> {
    let (_, query) = link.trim().split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("hostid="))
        .filter(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|value| value.parse::<u64>().ok())
}
