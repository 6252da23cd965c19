use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Twitter account that one or more channels follow.
///
/// Field names match Twitter's user object so follow files written from raw
/// API payloads still deserialize; extra fields in those files are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAccount {
    #[serde(rename = "id_str", default)]
    pub id: String,
    #[serde(rename = "screen_name")]
    pub handle: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "profile_image_url_https", default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub protected: bool,
}

impl TrackedAccount {
    /// Handles are case-insensitive on Twitter.
    pub fn matches_handle(&self, handle: &str) -> bool {
        self.handle.eq_ignore_ascii_case(handle)
    }
}

/// A single post from an account's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Canonical web URL for this post. Discord unfurls it into a preview.
    pub fn url(&self, handle: &str) -> String {
        format!("https://twitter.com/{}/status/{}", handle, self.id)
    }
}

/// A post routed to the channel that should receive it.
#[derive(Debug, Clone)]
pub struct FeedUpdate {
    pub channel_id: u64,
    pub account: TrackedAccount,
    pub post: Post,
}

impl FeedUpdate {
    pub fn content(&self) -> String {
        self.post.url(&self.account.handle)
    }
}

/// Result of merging newly verified accounts into a channel's list.
#[derive(Debug, Clone)]
pub struct FollowOutcome {
    /// Accounts that were not already on the list.
    pub added: Vec<TrackedAccount>,
    /// The full list after the merge.
    pub following: Vec<TrackedAccount>,
}

/// Result of removing handles from a channel's list.
#[derive(Debug, Clone)]
pub struct UnfollowOutcome {
    pub removed: Vec<TrackedAccount>,
    pub remaining: Vec<TrackedAccount>,
}

/// Join handles as `a, b, c` for chat replies.
pub fn join_handles(accounts: &[TrackedAccount]) -> String {
    accounts
        .iter()
        .map(|a| a.handle.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
