// Feed infra layer.
// - `twitter_client.rs` talks to the Twitter HTTP API.
// - `json_follow_store.rs` persists per-channel follow lists to disk.

#[path = "twitter_client.rs"]
pub mod twitter_client;

#[path = "json_follow_store.rs"]
pub mod json_follow_store;

pub use json_follow_store::JsonFollowStore;
pub use twitter_client::{TwitterApiClient, TwitterAuth};
