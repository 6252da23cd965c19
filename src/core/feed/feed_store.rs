use super::feed_models::TrackedAccount;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-channel persistence for follow-lists.
#[async_trait]
pub trait FollowStore: Send + Sync {
    /// Accounts followed in a channel. Empty when nothing is stored.
    async fn load(&self, channel_id: u64) -> Result<Vec<TrackedAccount>, StoreError>;
    /// Replace a channel's list. An empty list removes the channel entirely.
    async fn save(&self, channel_id: u64, accounts: &[TrackedAccount]) -> Result<(), StoreError>;
    /// Stop tracking a channel. Missing channels are not an error.
    async fn delete(&self, channel_id: u64) -> Result<(), StoreError>;
    /// Every channel with a stored list, ascending.
    async fn channels(&self) -> Result<Vec<u64>, StoreError>;
}
