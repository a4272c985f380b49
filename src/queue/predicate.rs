//! Classification of queue records that finished downloading but will never
//! be imported.

use std::fmt;

use super::models::{QueueRecord, QueueStatus};

/// Error-message fragments the server logs when it refuses an import.
/// Matching is case-sensitive.
pub const REJECTION_MARKERS: &[&str] = &["Custom format score", "not an upgrade"];

/// Which signal made a record removable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// `errorMessage` carries one of [`REJECTION_MARKERS`]
    ErrorMessage,
    /// `qualityCutoffNotMet` is explicitly true
    QualityCutoffNotMet,
    /// `isUpgrade` is explicitly false
    NotAnUpgrade,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::ErrorMessage => "import rejected",
            RemovalReason::QualityCutoffNotMet => "quality cutoff not met",
            RemovalReason::NotAnUpgrade => "not an upgrade",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First matching removal signal, or `None` when the record must stay.
///
/// Only completed records qualify. Absent optional fields never count as a
/// signal.
pub fn removal_reason(record: &QueueRecord) -> Option<RemovalReason> {
    if record.status != QueueStatus::Completed {
        return None;
    }

    if record
        .error_message
        .as_deref()
        .is_some_and(|msg| REJECTION_MARKERS.iter().any(|marker| msg.contains(marker)))
    {
        return Some(RemovalReason::ErrorMessage);
    }

    if record.quality_cutoff_not_met == Some(true) {
        return Some(RemovalReason::QualityCutoffNotMet);
    }

    if record.is_upgrade == Some(false) {
        return Some(RemovalReason::NotAnUpgrade);
    }

    None
}

pub fn should_remove(record: &QueueRecord) -> bool {
    removal_reason(record).is_some()
}
