// Startup configuration.
//
// Values come from an optional JSON file (same shape as the legacy
// `config/config.json` deployments) and are overridden by environment
// variables, which may themselves come from a `.env` file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::infra::feed::TwitterAuth;

const DEFAULT_CONFIG_FILE: &str = "config/config.json";
const DEFAULT_WEBHOOK_NAME: &str = "Twitter Feed";
const DEFAULT_DATA_DIR: &str = "data/follows";
const DEFAULT_POLL_SECS: u64 = 60;
const MAX_TIMELINE_COUNT: u32 = 200;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub twitter_auth: TwitterAuth,
    /// Display name for webhooks the bot creates.
    pub webhook_name: String,
    /// http(s) URL or local path of the webhook avatar.
    pub webhook_avatar: Option<String>,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub timeline_count: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FileConfig {
    #[serde(alias = "Twitter")]
    twitter: FileTwitter,
    #[serde(alias = "Discord")]
    discord: FileDiscord,
    data_dir: Option<String>,
    poll_interval_secs: Option<u64>,
    timeline_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileTwitter {
    #[serde(alias = "BearerToken", alias = "bearerToken")]
    bearer_token: Option<String>,
    #[serde(alias = "ConsumerKey", alias = "consumerKey")]
    consumer_key: Option<String>,
    #[serde(alias = "ConsumerSecret", alias = "consumerSecret")]
    consumer_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileDiscord {
    #[serde(alias = "Token")]
    token: Option<String>,
    #[serde(alias = "Username")]
    username: Option<String>,
    #[serde(alias = "Avatar")]
    avatar: Option<String>,
}

impl BotConfig {
    /// Load `.env`, the JSON file named by `FEED_CONFIG_FILE` (if present) and
    /// then the environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let path = std::env::var("FEED_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let file = read_file_config(Path::new(&path))?;

        Self::resolve(file, |key| {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        })
    }

    fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let discord_token = env("DISCORD_TOKEN")
            .or(file.discord.token)
            .context("Missing DISCORD_TOKEN! Set it in .env or the config file.")?;

        let bearer = env("TWITTER_BEARER_TOKEN").or(file.twitter.bearer_token);
        let consumer_key = env("TWITTER_CONSUMER_KEY").or(file.twitter.consumer_key);
        let consumer_secret = env("TWITTER_CONSUMER_SECRET").or(file.twitter.consumer_secret);
        let twitter_auth = match (bearer, consumer_key, consumer_secret) {
            (Some(token), _, _) => TwitterAuth::Bearer(token),
            (None, Some(key), Some(secret)) => TwitterAuth::Consumer { key, secret },
            _ => bail!(
                "Missing Twitter credentials: set TWITTER_BEARER_TOKEN or both \
                 TWITTER_CONSUMER_KEY and TWITTER_CONSUMER_SECRET"
            ),
        };

        let poll_secs = match env("FEED_POLL_INTERVAL_SECS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("FEED_POLL_INTERVAL_SECS is not a number: {v}"))?,
            None => file.poll_interval_secs.unwrap_or(DEFAULT_POLL_SECS),
        };
        if poll_secs == 0 {
            bail!("FEED_POLL_INTERVAL_SECS must be at least 1");
        }

        let timeline_count = match env("FEED_TIMELINE_COUNT") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("FEED_TIMELINE_COUNT is not a number: {v}"))?,
            None => file.timeline_count.unwrap_or(MAX_TIMELINE_COUNT),
        }
        .clamp(1, MAX_TIMELINE_COUNT);

        Ok(Self {
            discord_token,
            twitter_auth,
            webhook_name: env("WEBHOOK_NAME")
                .or(file.discord.username)
                .unwrap_or_else(|| DEFAULT_WEBHOOK_NAME.to_string()),
            webhook_avatar: env("WEBHOOK_AVATAR")
                .or(file.discord.avatar)
                .filter(|v| !v.trim().is_empty()),
            data_dir: PathBuf::from(
                env("FEED_DATA_DIR")
                    .or(file.data_dir)
                    .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            poll_interval: Duration::from_secs(poll_secs),
            timeline_count,
        })
    }
}

fn read_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_env_only_defaults() {
        let config = BotConfig::resolve(
            FileConfig::default(),
            env_from(&[("DISCORD_TOKEN", "abc"), ("TWITTER_BEARER_TOKEN", "xyz")]),
        )
        .unwrap();

        assert_eq!(config.discord_token, "abc");
        assert!(matches!(config.twitter_auth, TwitterAuth::Bearer(ref t) if t == "xyz"));
        assert_eq!(config.webhook_name, DEFAULT_WEBHOOK_NAME);
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.timeline_count, 200);
        assert!(config.webhook_avatar.is_none());
    }

    #[test]
    fn test_legacy_file_layout_with_env_override() {
        let file: FileConfig = serde_json::from_str(
            r#"{
                "Twitter": {"Token": "t", "Secret": "s", "ConsumerKey": "ck", "ConsumerSecret": "cs"},
                "Discord": {"Token": "from-file", "Username": "Birdwatch", "Avatar": "https://example.com/a.png"}
            }"#,
        )
        .unwrap();

        let config = BotConfig::resolve(
            file,
            env_from(&[("DISCORD_TOKEN", "from-env"), ("FEED_TIMELINE_COUNT", "500")]),
        )
        .unwrap();

        assert_eq!(config.discord_token, "from-env");
        assert!(matches!(
            config.twitter_auth,
            TwitterAuth::Consumer { ref key, ref secret } if key == "ck" && secret == "cs"
        ));
        assert_eq!(config.webhook_name, "Birdwatch");
        assert_eq!(
            config.webhook_avatar.as_deref(),
            Some("https://example.com/a.png")
        );
        assert_eq!(config.timeline_count, 200);
    }

    #[test]
    fn test_missing_credentials() {
        let err = BotConfig::resolve(FileConfig::default(), env_from(&[("DISCORD_TOKEN", "a")]))
            .unwrap_err();
        assert!(err.to_string().contains("Twitter credentials"));

        assert!(BotConfig::resolve(FileConfig::default(), env_from(&[])).is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = BotConfig::resolve(
            FileConfig::default(),
            env_from(&[
                ("DISCORD_TOKEN", "a"),
                ("TWITTER_BEARER_TOKEN", "b"),
                ("FEED_POLL_INTERVAL_SECS", "0"),
            ]),
        );
        assert!(result.is_err());
    }
}
