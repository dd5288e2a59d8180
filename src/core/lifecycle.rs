use chrono::{DateTime, Duration, Utc};

use crate::models::RecommendationRecord;

/// Age after which a recommendation list is regenerated regardless of flags
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Why a record has to be regenerated before it is served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationReason {
    Requested,
    MarkedStale,
    Empty,
    Expired,
}

impl RegenerationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenerationReason::Requested => "requested",
            RegenerationReason::MarkedStale => "marked_stale",
            RegenerationReason::Empty => "empty",
            RegenerationReason::Expired => "expired",
        }
    }
}

/// Decide whether `record` must be regenerated at `now`
pub fn regeneration_reason(
    record: &RecommendationRecord,
    force: bool,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Option<RegenerationReason> {
    if force {
        Some(RegenerationReason::Requested)
    } else if record.is_stale {
        Some(RegenerationReason::MarkedStale)
    } else if record.entries.is_empty() {
        Some(RegenerationReason::Empty)
    } else if now - record.refreshed_at > max_age {
        Some(RegenerationReason::Expired)
    } else {
        None
    }
}

/// Flag a record for regeneration, e.g. after the tenant edits preferences
pub fn mark_stale(mut record: RecommendationRecord) -> RecommendationRecord {
    record.is_stale = true;
    record
}

/// Mark one recommended listing as viewed; unknown ids leave the record as is
pub fn mark_viewed(mut record: RecommendationRecord, listing_id: &str) -> RecommendationRecord {
    if let Some(entry) = record.entries.iter_mut().find(|e| e.listing_id == listing_id) {
        entry.viewed = true;
    }
    record
}

/// Count helpful / not helpful feedback on the list
pub fn record_feedback(mut record: RecommendationRecord, helpful: bool) -> RecommendationRecord {
    if helpful {
        record.helpful_count = record.helpful_count.saturating_add(1);
    } else {
        record.not_helpful_count = record.not_helpful_count.saturating_add(1);
    }
    record
}
