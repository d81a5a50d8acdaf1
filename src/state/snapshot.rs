use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Host status as reported by the feed.
///
/// The domain is a small, non-contiguous integer set. Only equality is
/// meaningful to change detection; the named constants are for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusValue(pub i32);

impl StatusValue {
    pub const OFFLINE: StatusValue = StatusValue(0);
    pub const ONLINE: StatusValue = StatusValue(1);
    pub const IN_SESSION: StatusValue = StatusValue(4);

    /// Human-readable label for known values
    pub fn label(&self) -> Option<&'static str> {
        match *self {
            Self::OFFLINE => Some("offline"),
            Self::ONLINE => Some("online"),
            Self::IN_SESSION => Some("in-session"),
            _ => None,
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{} ({})", self.0, label),
            None => write!(f, "{}", self.0),
        }
    }
}

/// One observation of one host at one point in time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable identity key
    pub host_id: u64,

    /// Capture time of the feed document this observation came from
    pub timestamp: DateTime<Utc>,

    /// Host description
    pub name: String,

    /// Last known address (absent when the feed reports none or garbage)
    pub address: Option<IpAddr>,

    /// Reported status
    pub status: StatusValue,
}

impl Snapshot {
    pub fn new(
        host_id: u64,
        timestamp: DateTime<Utc>,
        name: impl Into<String>,
        address: Option<IpAddr>,
        status: StatusValue,
    ) -> Self {
        Self {
            host_id,
            timestamp,
            name: name.into(),
            address,
            status,
        }
    }
}

/// Network-address equality: an IPv4-mapped IPv6 address equals its IPv4 form.
pub(crate) fn same_address(a: Option<IpAddr>, b: Option<IpAddr>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.to_canonical() == b.to_canonical(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(StatusValue::ONLINE.to_string(), "1 (online)");
        assert_eq!(StatusValue(7).to_string(), "7");
        assert_eq!(StatusValue::default(), StatusValue::OFFLINE);
    }

    #[test]
    fn test_same_address_mapped_v4() {
        let v4: IpAddr = "10.0.0.5".parse().unwrap();
        let mapped: IpAddr = "::ffff:10.0.0.5".parse().unwrap();
        let other: IpAddr = "10.0.0.6".parse().unwrap();

        assert!(same_address(Some(v4), Some(mapped)));
        assert!(!same_address(Some(v4), Some(other)));
        assert!(!same_address(Some(v4), None));
        assert!(same_address(None, None));
    }
}
