pub mod commands;
pub mod feed_models;
pub mod feed_service;
pub mod feed_store;
pub mod handles;
pub mod poll_cursor;

pub use commands::{CommandAuthor, FeedCommand};
pub use feed_models::{join_handles, FeedUpdate, Post, TrackedAccount};
pub use feed_service::{FeedError, FeedService, TimelineClient};
pub use feed_store::{FollowStore, StoreError};
pub use poll_cursor::{PollCursor, PollWindow};
