// Discord layer - message routing, webhook dispatch and shared bot data.

use std::sync::Arc;

use crate::core::feed::FeedService;
use crate::infra::feed::{JsonFollowStore, TwitterApiClient};

#[path = "feed/mod.rs"]
pub mod feed;

pub type FeedServiceImpl = FeedService<TwitterApiClient, JsonFollowStore>;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared state handed to every event handler.
pub struct Data {
    pub feed: Arc<FeedServiceImpl>,
    pub webhook: Arc<feed::dispatcher::WebhookProfile>,
}
