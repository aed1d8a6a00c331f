//! Input history repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::InputHistoryItem;
use crate::error::Result;
use crate::owner::Owner;

#[async_trait]
pub trait InputHistoryRepository: Send + Sync {
    /// Newest entries first.
    async fn recent(&self, owner: &Owner, limit: usize) -> Result<Vec<InputHistoryItem>>;

    /// Entries whose text contains `query`, newest first.
    async fn search(&self, owner: &Owner, query: &str, limit: usize)
    -> Result<Vec<InputHistoryItem>>;

    /// Appends an entry and returns its id.
    async fn insert(&self, owner: &Owner, text: &str, timestamp: DateTime<Utc>) -> Result<i64>;

    /// Removes all entries of the owner. Returns the number removed.
    async fn clear(&self, owner: &Owner) -> Result<usize>;

    async fn count(&self, owner: &Owner) -> Result<usize>;
}
