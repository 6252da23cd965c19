use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::core::feed::{FeedError, Post, TimelineClient, TrackedAccount};

const TWITTER_API: &str = "https://api.twitter.com";
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
/// `users/lookup` rejects more screen names than this in one call.
const LOOKUP_BATCH_SIZE: usize = 100;

/// Credentials for Twitter's application-only auth.
#[derive(Debug, Clone)]
pub enum TwitterAuth {
    Bearer(String),
    Consumer { key: String, secret: String },
}

/// Minimal Twitter v1.1 REST client covering user lookup and timelines.
pub struct TwitterApiClient {
    client: Client,
    base_url: String,
}

impl TwitterApiClient {
    /// Build a client, exchanging consumer credentials for a bearer token
    /// when no token was configured.
    pub async fn connect(auth: TwitterAuth) -> Result<Self, FeedError> {
        Self::connect_to(TWITTER_API, auth).await
    }

    pub async fn connect_to(base_url: &str, auth: TwitterAuth) -> Result<Self, FeedError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let token = match auth {
            TwitterAuth::Bearer(token) => token,
            TwitterAuth::Consumer { key, secret } => {
                Self::fetch_bearer_token(&base_url, &key, &secret).await?
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("TwitterFeedBot/1.0"),
        );
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| FeedError::Api(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FeedError::Api(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    async fn fetch_bearer_token(
        base_url: &str,
        key: &str,
        secret: &str,
    ) -> Result<String, FeedError> {
        let resp = Client::new()
            .post(format!("{}/oauth2/token", base_url))
            .basic_auth(key, Some(secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| FeedError::Api(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FeedError::Api(format!(
                "Twitter rejected consumer credentials: {}",
                resp.status()
            )));
        }

        let token: ApiToken = resp
            .json()
            .await
            .map_err(|e| FeedError::Api(e.to_string()))?;
        Ok(token.access_token)
    }

    fn check_status(status: StatusCode, what: &str) -> Result<(), FeedError> {
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::Api(format!(
                "Twitter rate limit hit while fetching {what}"
            )));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(FeedError::Api(format!(
                "Twitter refused {what}: account protected or token invalid"
            )));
        }
        Err(FeedError::Api(format!("Twitter returned {status} for {what}")))
    }
}

#[async_trait]
impl TimelineClient for TwitterApiClient {
    async fn lookup_accounts(&self, handles: &[String]) -> Result<Vec<TrackedAccount>, FeedError> {
        let url = format!("{}/1.1/users/lookup.json", self.base_url);
        let mut users = Vec::with_capacity(handles.len());

        for batch in lookup_batches(handles) {
            let resp = self
                .client
                .get(&url)
                .query(&[("screen_name", batch)])
                .send()
                .await
                .map_err(|e| FeedError::Api(e.to_string()))?;

            // Twitter answers 404 when none of the handles exist.
            if resp.status() == StatusCode::NOT_FOUND {
                continue;
            }
            Self::check_status(resp.status(), "users")?;

            let found: Vec<TrackedAccount> = resp
                .json()
                .await
                .map_err(|e| FeedError::Api(e.to_string()))?;
            users.extend(found);
        }

        Ok(users)
    }

    async fn recent_posts(&self, handle: &str, count: u32) -> Result<Vec<Post>, FeedError> {
        let url = format!("{}/1.1/statuses/user_timeline.json", self.base_url);
        let count = count.to_string();
        let resp = self
            .client
            .get(url)
            .query(&[
                ("screen_name", handle),
                ("count", count.as_str()),
                ("include_rts", "true"),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Api(e.to_string()))?;

        Self::check_status(resp.status(), "timeline")?;

        let tweets: Vec<ApiTweet> = resp
            .json()
            .await
            .map_err(|e| FeedError::Api(e.to_string()))?;

        Ok(tweets.into_iter().filter_map(map_tweet).collect())
    }
}

/// Tweets without a parseable timestamp cannot be placed in a poll window.
fn map_tweet(tweet: ApiTweet) -> Option<Post> {
    let created_at = parse_created_at(&tweet.created_at)?;
    Some(Post {
        id: tweet.id_str,
        created_at,
    })
}

/// Comma-joined `screen_name` values, at most `LOOKUP_BATCH_SIZE` per call.
fn lookup_batches(handles: &[String]) -> Vec<String> {
    handles
        .chunks(LOOKUP_BATCH_SIZE)
        .map(|chunk| chunk.join(","))
        .collect()
}

fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct ApiToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id_str: String,
    created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_created_at() {
        let parsed = parse_created_at("Wed Oct 10 20:19:24 +0000 2018").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2018, 10, 10, 20, 19, 24).unwrap());
        assert!(parse_created_at("2018-10-10T20:19:24Z").is_none());
    }

    #[test]
    fn test_map_timeline_payload() {
        let json = r#"[
            {"id": 1, "id_str": "1050118621198921728", "created_at": "Wed Oct 10 20:19:24 +0000 2018", "text": "hello"},
            {"id": 2, "id_str": "2", "created_at": "garbage"}
        ]"#;
        let tweets: Vec<ApiTweet> = serde_json::from_str(json).unwrap();
        let posts: Vec<Post> = tweets.into_iter().filter_map(map_tweet).collect();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "1050118621198921728");
    }

    #[test]
    fn test_lookup_is_split_into_batches() {
        let handles: Vec<String> = (0..250).map(|i| format!("user{i}")).collect();
        let batches = lookup_batches(&handles);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].split(',').count(), 100);
        assert_eq!(batches[1].split(',').count(), 100);
        assert_eq!(batches[2].split(',').count(), 50);
        assert!(batches[0].starts_with("user0,user1,"));
        assert!(batches[2].ends_with("user249"));

        assert!(lookup_batches(&[]).is_empty());
    }

    #[test]
    fn test_status_mapping() {
        assert!(TwitterApiClient::check_status(StatusCode::OK, "users").is_ok());
        let err = TwitterApiClient::check_status(StatusCode::TOO_MANY_REQUESTS, "timeline")
            .unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }
}
