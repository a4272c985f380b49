//! Wire models for the Sonarr v3 queue endpoint.
//!
//! `GET /api/v3/queue` answers with a paged envelope:
//!
//! ```json
//! {
//!   "page": 1,
//!   "pageSize": 100,
//!   "totalRecords": 2,
//!   "records": [
//!     {
//!       "id": 1187,
//!       "title": "Show.S01E01.1080p.WEB-DL",
//!       "status": "completed",
//!       "errorMessage": "Release is not an upgrade for existing episode file(s)",
//!       "qualityCutoffNotMet": false
//!     }
//!   ]
//! }
//! ```
//!
//! Only the fields the sweeper reads are modelled; everything else is ignored.
//! A modelled field that is null or of the wrong type decodes as absent, so one
//! odd record never fails the whole page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a queue entry, numeric on current servers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum QueueId {
    Number(i64),
    Text(String),
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueId::Number(n) => write!(f, "{}", n),
            QueueId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for QueueId {
    fn from(value: i64) -> Self {
        QueueId::Number(value)
    }
}

impl From<&str> for QueueId {
    fn from(value: &str) -> Self {
        QueueId::Text(value.to_string())
    }
}

/// Download state reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueueStatus {
    Queued,
    Paused,
    Downloading,
    Completed,
    Delay,
    DownloadClientUnavailable,
    Warning,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "queued",
            QueueStatus::Paused => "paused",
            QueueStatus::Downloading => "downloading",
            QueueStatus::Completed => "completed",
            QueueStatus::Delay => "delay",
            QueueStatus::DownloadClientUnavailable => "downloadClientUnavailable",
            QueueStatus::Warning => "warning",
            QueueStatus::Failed => "failed",
            QueueStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode `T`, falling back to its default on null or a mismatched type
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// One entry of the server's download queue
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub id: QueueId,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: QueueStatus,
    #[serde(default, deserialize_with = "lenient")]
    pub error_message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quality_cutoff_not_met: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_upgrade: Option<bool>,
}

impl QueueRecord {
    /// Record with only an id and status; every optional field absent
    pub fn new(id: impl Into<QueueId>, status: QueueStatus) -> Self {
        Self {
            id: id.into(),
            title: None,
            status,
            error_message: None,
            quality_cutoff_not_met: None,
            is_upgrade: None,
        }
    }
}

/// Paged response envelope of `GET /api/v3/queue`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePage {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total_records: Option<u64>,
    #[serde(default)]
    pub records: Vec<QueueRecord>,
}
