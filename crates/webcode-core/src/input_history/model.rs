//! Input history models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of entries returned by a recent-history query.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Default number of entries returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// A previously submitted prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputHistoryItem {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}
