use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;

use super::feed_models::{FeedUpdate, FollowOutcome, Post, TrackedAccount, UnfollowOutcome};
use super::feed_store::{FollowStore, StoreError};
use super::poll_cursor::PollWindow;

/// Errors raised by follow-list management and polling.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Twitter API error: {0}")]
    Api(String),
    #[error("Failed to persist follow list: {0}")]
    Store(#[from] StoreError),
    #[error("None of the given accounts exist or are public")]
    NoValidAccounts,
    #[error("Nothing is tracked in this channel")]
    NothingTracked,
    #[error("No tracked account matched the given handles")]
    NoneMatched,
}

/// The two upstream calls the bot relies on.
#[async_trait]
pub trait TimelineClient: Send + Sync {
    /// Batch lookup by handle. Unknown handles are simply absent from the result.
    async fn lookup_accounts(&self, handles: &[String]) -> Result<Vec<TrackedAccount>, FeedError>;
    /// Most recent posts of an account, newest first.
    async fn recent_posts(&self, handle: &str, count: u32) -> Result<Vec<Post>, FeedError>;
}

/// Follow-list management plus the per-channel half of the poll cycle.
///
/// The Discord layer owns webhooks and the timer; everything that decides
/// *what* gets posted lives here so it can be tested without Discord or HTTP.
pub struct FeedService<C: TimelineClient, S: FollowStore> {
    client: C,
    store: S,
    timeline_count: u32,
    // Serializes read-modify-write of one channel's list between command
    // handlers and the poll loop.
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl<C, S> FeedService<C, S>
where
    C: TimelineClient,
    S: FollowStore,
{
    pub fn new(client: C, store: S, timeline_count: u32) -> Self {
        Self {
            client,
            store,
            timeline_count,
            locks: DashMap::new(),
        }
    }

    fn channel_lock(&self, channel_id: u64) -> Arc<Mutex<()>> {
        self.locks.entry(channel_id).or_default().clone()
    }

    /// Resolve handles upstream and keep only public accounts.
    pub async fn verify(&self, handles: &[String]) -> Result<Vec<TrackedAccount>, FeedError> {
        let handles = unique_handles(handles);
        if handles.is_empty() {
            return Ok(Vec::new());
        }

        let mut accounts = self.client.lookup_accounts(&handles).await?;
        accounts.retain(|a| !a.protected);
        Ok(accounts)
    }

    /// Verify the handles and add the new ones to the channel's list.
    pub async fn follow(
        &self,
        channel_id: u64,
        handles: &[String],
    ) -> Result<FollowOutcome, FeedError> {
        let verified = self.verify(handles).await?;
        if verified.is_empty() {
            return Err(FeedError::NoValidAccounts);
        }

        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;

        let mut following = self.store.load(channel_id).await?;
        let mut added = Vec::new();
        for account in verified {
            if following.iter().any(|a| a.matches_handle(&account.handle)) {
                continue;
            }
            following.push(account.clone());
            added.push(account);
        }

        if !added.is_empty() {
            self.store.save(channel_id, &following).await?;
        }

        tracing::info!(
            channel_id,
            added = added.len(),
            total = following.len(),
            "Updated follow list"
        );

        Ok(FollowOutcome { added, following })
    }

    /// Drop every tracked account whose handle matches one of `handles`.
    /// Removing the last account deletes the channel's list.
    pub async fn unfollow(
        &self,
        channel_id: u64,
        handles: &[String],
    ) -> Result<UnfollowOutcome, FeedError> {
        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;

        let current = self.store.load(channel_id).await?;
        if current.is_empty() {
            return Err(FeedError::NothingTracked);
        }

        let (removed, remaining): (Vec<_>, Vec<_>) = current
            .into_iter()
            .partition(|account| handles.iter().any(|h| account.matches_handle(h)));

        if removed.is_empty() {
            return Err(FeedError::NoneMatched);
        }

        self.store.save(channel_id, &remaining).await?;
        tracing::info!(
            channel_id,
            removed = removed.len(),
            remaining = remaining.len(),
            "Removed accounts from follow list"
        );

        Ok(UnfollowOutcome { removed, remaining })
    }

    pub async fn following(&self, channel_id: u64) -> Result<Vec<TrackedAccount>, FeedError> {
        Ok(self.store.load(channel_id).await?)
    }

    pub async fn tracked_channels(&self) -> Result<Vec<u64>, FeedError> {
        Ok(self.store.channels().await?)
    }

    /// Forget a channel entirely, e.g. when the bot cannot post there.
    ///
    /// The channel's lock entry stays in the map: callers already waiting on
    /// it must keep sharing one mutex with later callers.
    pub async fn stop_tracking(&self, channel_id: u64) -> Result<(), FeedError> {
        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;
        self.store.delete(channel_id).await?;
        Ok(())
    }

    /// Fetch every account followed in `channel_id` and return the posts that
    /// fall inside `window`, oldest first.
    ///
    /// A failed timeline fetch only skips that account for this cycle.
    pub async fn collect_channel_updates(
        &self,
        channel_id: u64,
        window: PollWindow,
    ) -> Result<Vec<FeedUpdate>, FeedError> {
        let accounts = {
            let lock = self.channel_lock(channel_id);
            let _guard = lock.lock().await;
            self.store.load(channel_id).await?
        };

        let mut updates = Vec::new();
        for account in accounts {
            let posts = match self
                .client
                .recent_posts(&account.handle, self.timeline_count)
                .await
            {
                Ok(posts) => posts,
                Err(err) => {
                    tracing::warn!(
                        channel_id,
                        handle = %account.handle,
                        error = %err,
                        "Skipping timeline for this cycle"
                    );
                    continue;
                }
            };

            let mut fresh = collect_new_posts(posts, window);
            fresh.sort_by_key(|p| p.created_at);
            updates.extend(fresh.into_iter().map(|post| FeedUpdate {
                channel_id,
                account: account.clone(),
                post,
            }));
        }

        Ok(updates)
    }
}

/// Drop repeated handles, ignoring case, keeping first-seen order.
fn unique_handles(handles: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(handles.len());
    for handle in handles {
        if !unique.iter().any(|h| h.eq_ignore_ascii_case(handle)) {
            unique.push(handle.clone());
        }
    }
    unique
}

/// Keep only posts created inside the poll window.
fn collect_new_posts(posts: Vec<Post>, window: PollWindow) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|post| window.contains(post.created_at))
        .collect()
}
