//! Issue lifecycle values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a reported issue.
///
/// Wire format is the Russian literal stored in the `issues.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueStatus {
    #[serde(rename = "есть проблема")]
    Open,
    #[serde(rename = "в обработке")]
    InProgress,
    #[serde(rename = "выполнено")]
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown issue status: {0}")]
pub struct UnknownStatus(pub String);

impl IssueStatus {
    pub const ALL: [IssueStatus; 3] = [Self::Open, Self::InProgress, Self::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "есть проблема",
            Self::InProgress => "в обработке",
            Self::Done => "выполнено",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

/// Granularity for the issues-over-time rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeBucket {
    #[default]
    Day,
    Week,
    Month,
}

impl TimeBucket {
    /// Field name understood by Postgres `date_trunc`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}
