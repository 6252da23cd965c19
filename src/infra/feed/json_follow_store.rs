use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lazy_regex::lazy_regex;
use tokio::fs;

use crate::core::feed::{FollowStore, StoreError, TrackedAccount};

static RE_CHANNEL_FILE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"^(\d+)\.json$");

/// One JSON array per channel, stored as `<dir>/<channel_id>.json`.
pub struct JsonFollowStore {
    dir: PathBuf,
}

impl JsonFollowStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn channel_path(&self, channel_id: u64) -> PathBuf {
        self.dir.join(format!("{channel_id}.json"))
    }
}

#[async_trait]
impl FollowStore for JsonFollowStore {
    async fn load(&self, channel_id: u64) -> Result<Vec<TrackedAccount>, StoreError> {
        let path = self.channel_path(channel_id);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&text)?)
    }

    async fn save(&self, channel_id: u64, accounts: &[TrackedAccount]) -> Result<(), StoreError> {
        if accounts.is_empty() {
            return self.delete(channel_id).await;
        }

        fs::create_dir_all(&self.dir).await?;
        let text = serde_json::to_string_pretty(accounts)?;
        fs::write(self.channel_path(channel_id), text).await?;
        Ok(())
    }

    async fn delete(&self, channel_id: u64) -> Result<(), StoreError> {
        match fs::remove_file(self.channel_path(channel_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn channels(&self) -> Result<Vec<u64>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut channels = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = RE_CHANNEL_FILE
                .captures(name)
                .and_then(|caps| caps[1].parse::<u64>().ok())
            {
                channels.push(id);
            }
        }

        channels.sort_unstable();
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn account(handle: &str) -> TrackedAccount {
        TrackedAccount {
            id: "1".to_string(),
            handle: handle.to_string(),
            name: handle.to_string(),
            avatar_url: Some(format!("https://pbs.twimg.com/{handle}.png")),
            protected: false,
        }
    }

    #[tokio::test]
    async fn test_json_persistence_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFollowStore::new(tmp.path().join("follows"));

        assert!(store.load(42).await.unwrap().is_empty());

        store
            .save(42, &[account("jack"), account("TwitterDev")])
            .await
            .unwrap();

        // Reload through a fresh store
        let store2 = JsonFollowStore::new(tmp.path().join("follows"));
        let loaded = store2.load(42).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].handle, "jack");
        assert_eq!(loaded[1].handle, "TwitterDev");
    }

    #[tokio::test]
    async fn test_empty_save_deletes_file() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFollowStore::new(tmp.path());

        store.save(7, &[account("jack")]).await.unwrap();
        assert!(tmp.path().join("7.json").exists());

        store.save(7, &[]).await.unwrap();
        assert!(!tmp.path().join("7.json").exists());

        // Deleting again is fine
        store.delete(7).await.unwrap();
    }

    #[tokio::test]
    async fn test_channels_only_lists_channel_files() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFollowStore::new(tmp.path());

        store.save(300, &[account("a")]).await.unwrap();
        store.save(20, &[account("b")]).await.unwrap();
        std::fs::write(tmp.path().join("config.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("12.json.bak"), "[]").unwrap();

        assert_eq!(store.channels().await.unwrap(), vec![20, 300]);
    }

    #[tokio::test]
    async fn test_missing_directory_has_no_channels() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFollowStore::new(tmp.path().join("nope"));
        assert!(store.channels().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("5.json"), "not json").unwrap();
        let store = JsonFollowStore::new(tmp.path());

        assert!(matches!(
            store.load(5).await,
            Err(StoreError::Serialization(_))
        ));
    }
}
