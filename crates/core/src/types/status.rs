//! Status enums for inventory entities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of an inventory batch.
///
/// `Expired` is an administrative marker set by an explicit sweep; the
/// allocator detects expiry by date independently, since this flag is not
/// guaranteed to be kept in sync with the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Batch has remaining units available for allocation.
    #[default]
    Active,
    /// Batch was administratively marked as past its expiry date.
    Expired,
    /// Batch quantity reached zero through allocation.
    Depleted,
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Error)]
#[error("unknown batch status: {0}")]
pub struct ParseBatchStatusError(String);

impl BatchStatus {
    /// Database/wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Expired => "EXPIRED",
            Self::Depleted => "DEPLETED",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = ParseBatchStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "EXPIRED" => Ok(Self::Expired),
            "DEPLETED" => Ok(Self::Depleted),
            other => Err(ParseBatchStatusError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            BatchStatus::Active,
            BatchStatus::Expired,
            BatchStatus::Depleted,
        ] {
            let parsed: BatchStatus = status.as_str().parse().expect("parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_unknown_string_is_rejected() {
        assert!("RECEIVED".parse::<BatchStatus>().is_err());
    }

    #[test]
    fn test_status_serde_screaming_snake_case() {
        let json = serde_json::to_string(&BatchStatus::Depleted).expect("serialize");
        assert_eq!(json, "\"DEPLETED\"");
    }
}
