//! # Temporal Types — Unix-Second Timestamps
//!
//! Defines `UnixTime`, the header timestamp. The root chain stores
//! `createdAt` as a `uint` of whole seconds since the Unix epoch and hashes
//! it as such, so the child chain carries exactly that representation: no
//! sub-second precision, no time zone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTime(u64);

impl UnixTime {
    /// The current wall-clock time, truncated to seconds.
    ///
    /// A clock set before the epoch yields zero.
    pub fn now() -> Self {
        Self(u64::try_from(Utc::now().timestamp()).unwrap_or(0))
    }

    /// Create a timestamp from epoch seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the epoch seconds.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Convert to a `chrono` UTC datetime, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl From<u64> for UnixTime {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl std::fmt::Display for UnixTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            None => write!(f, "{}s", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_2020() {
        assert!(UnixTime::now().as_secs() > 1_577_836_800);
    }

    #[test]
    fn test_display_is_utc_iso8601() {
        assert_eq!(UnixTime::from_secs(0).to_string(), "1970-01-01T00:00:00Z");
        assert_eq!(
            UnixTime::from_secs(1_700_000_000).to_string(),
            "2023-11-14T22:13:20Z"
        );
    }

    #[test]
    fn test_serde_transparent() {
        let t = UnixTime::from_secs(1234);
        assert_eq!(serde_json::to_string(&t).unwrap(), "1234");
        let back: UnixTime = serde_json::from_str("1234").unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_ordering() {
        assert!(UnixTime::from_secs(1) < UnixTime::from_secs(2));
    }
}
