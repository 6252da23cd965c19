// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "feed/mod.rs"]
pub mod feed;
