use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use poise::serenity_prelude as serenity;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::core::feed::{FeedUpdate, PollCursor, PollWindow};
use crate::discord::FeedServiceImpl;

const MISSING_WEBHOOK_PERMISSION: &str = "**I need the MANAGE_WEBHOOKS permission in order to post!**\n\
I will automatically remove tracking from this channel for now. Once you have given me webhook \
permissions for this channel, please copy-paste the `~follow` command originally used.";

/// Name and avatar used when the bot creates a channel webhook.
pub struct WebhookProfile {
    pub name: String,
    pub avatar: Option<serenity::CreateAttachment>,
}

impl WebhookProfile {
    /// Resolve the configured avatar once at startup. An http(s) source is
    /// downloaded, anything else is read as a local file. A broken avatar only
    /// costs the picture, never the webhook.
    pub async fn load(name: &str, avatar: Option<&str>) -> Self {
        let avatar = match avatar {
            None => None,
            Some(src) if src.starts_with("http://") || src.starts_with("https://") => {
                match download_avatar(src).await {
                    Ok(attachment) => Some(attachment),
                    Err(err) => {
                        tracing::warn!(url = src, error = %err, "Failed to download webhook avatar");
                        None
                    }
                }
            }
            Some(path) => match serenity::CreateAttachment::path(path).await {
                Ok(attachment) => Some(attachment),
                Err(err) => {
                    tracing::warn!(path, error = %err, "Failed to read webhook avatar");
                    None
                }
            },
        };

        Self {
            name: name.to_string(),
            avatar,
        }
    }
}

async fn download_avatar(url: &str) -> Result<serenity::CreateAttachment, reqwest::Error> {
    let bytes = reqwest::get(url).await?.error_for_status()?.bytes().await?;
    Ok(serenity::CreateAttachment::bytes(bytes.to_vec(), "avatar.png"))
}

/// Background poller: every tick, relay new posts into each tracked channel.
pub struct FeedDispatcher {
    http: Arc<serenity::Http>,
    feed: Arc<FeedServiceImpl>,
    profile: Arc<WebhookProfile>,
    bot_id: serenity::UserId,
    cursor: PollCursor,
}

impl FeedDispatcher {
    pub fn new(
        http: Arc<serenity::Http>,
        feed: Arc<FeedServiceImpl>,
        profile: Arc<WebhookProfile>,
        bot_id: serenity::UserId,
    ) -> Self {
        Self {
            http,
            feed,
            profile,
            bot_id,
            cursor: PollCursor::new(Utc::now()),
        }
    }

    /// Poll forever. The first cycle runs one period after startup.
    pub async fn run(mut self, period: Duration) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            tracing::debug!(since = %self.cursor.since(), "Starting feed poll cycle...");
            self.poll_once().await;
        }
    }

    async fn poll_once(&mut self) {
        let window = self.cursor.window(Utc::now());

        let channels = match self.feed.tracked_channels().await {
            Ok(channels) => channels,
            Err(err) => {
                // Keep the cursor so the next cycle covers this window too.
                tracing::warn!(error = %err, "Failed to enumerate tracked channels");
                return;
            }
        };

        let mut sent = 0usize;
        for channel in channels {
            sent += self.poll_channel(channel, window).await;
        }

        if sent > 0 {
            tracing::info!(sent, "Relayed new posts");
        } else {
            tracing::debug!("No new posts found");
        }
        self.cursor.advance(window);
    }

    async fn poll_channel(&self, channel: u64, window: PollWindow) -> usize {
        let channel_id = serenity::ChannelId::new(channel);

        let webhook = match self.ensure_webhook(channel_id).await {
            Ok(webhook) => webhook,
            Err(err) if is_unusable_channel(&err) => {
                tracing::warn!(
                    channel_id = channel,
                    error = %err,
                    "Cannot use webhooks here, dropping channel from tracking"
                );
                self.abandon_channel(channel_id).await;
                return 0;
            }
            Err(err) => {
                tracing::warn!(channel_id = channel, error = %err, "Failed to get webhook");
                return 0;
            }
        };

        let updates = match self.feed.collect_channel_updates(channel, window).await {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(channel_id = channel, error = %err, "Failed to collect posts");
                return 0;
            }
        };

        let mut sent = 0;
        for update in updates {
            match self.send_update(&webhook, &update).await {
                Ok(()) => sent += 1,
                Err(err) => tracing::warn!(
                    channel_id = update.channel_id,
                    handle = %update.account.handle,
                    post_id = %update.post.id,
                    error = %err,
                    "Failed to relay post"
                ),
            }
        }
        sent
    }

    /// Reuse a webhook this bot created, then any webhook we hold a token for,
    /// and only create a new one when neither exists.
    async fn ensure_webhook(
        &self,
        channel_id: serenity::ChannelId,
    ) -> Result<serenity::Webhook, serenity::Error> {
        let mut webhooks = channel_id.webhooks(&self.http).await?;
        let candidates: Vec<WebhookCandidate> = webhooks
            .iter()
            .map(|w| WebhookCandidate {
                creator: w.user.as_ref().map(|u| u.id),
                has_token: w.token.is_some(),
            })
            .collect();
        if let Some(index) = pick_webhook(&candidates, self.bot_id) {
            return Ok(webhooks.swap_remove(index));
        }

        let mut builder = serenity::CreateWebhook::new(&self.profile.name);
        if let Some(avatar) = &self.profile.avatar {
            builder = builder.avatar(avatar);
        }
        let webhook = channel_id.create_webhook(&self.http, builder).await?;
        tracing::info!(channel_id = channel_id.get(), "Created feed webhook");
        Ok(webhook)
    }

    /// Tell the channel once why posting stopped, then forget it.
    async fn abandon_channel(&self, channel_id: serenity::ChannelId) {
        if let Err(err) = channel_id.say(&self.http, MISSING_WEBHOOK_PERMISSION).await {
            tracing::warn!(
                channel_id = channel_id.get(),
                error = %err,
                "Failed to send missing-permission notice"
            );
        }
        if let Err(err) = self.feed.stop_tracking(channel_id.get()).await {
            tracing::error!(
                channel_id = channel_id.get(),
                error = %err,
                "Failed to remove follow list"
            );
        }
    }

    async fn send_update(
        &self,
        webhook: &serenity::Webhook,
        update: &FeedUpdate,
    ) -> Result<(), serenity::Error> {
        let mut builder = serenity::ExecuteWebhook::new()
            .content(update.content())
            .username(&update.account.handle);
        if let Some(avatar) = &update.account.avatar_url {
            builder = builder.avatar_url(avatar);
        }

        webhook.execute(&self.http, false, builder).await?;
        tracing::debug!(
            channel_id = update.channel_id,
            post_id = %update.post.id,
            "Relayed post"
        );
        Ok(())
    }
}

fn is_unusable_channel(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(http_err) => {
            is_unusable_status(http_err.status_code().map(|status| status.as_u16()))
        }
        _ => false,
    }
}

/// Forbidden (no MANAGE_WEBHOOKS) or unknown channel. Anything else,
/// including errors without a status, is retried next cycle.
fn is_unusable_status(status: Option<u16>) -> bool {
    matches!(status, Some(403 | 404))
}

/// The parts of a webhook that decide whether we can post through it.
#[derive(Debug, Clone, Copy)]
struct WebhookCandidate {
    creator: Option<serenity::UserId>,
    has_token: bool,
}

fn pick_webhook(candidates: &[WebhookCandidate], bot_id: serenity::UserId) -> Option<usize> {
    candidates
        .iter()
        .position(|c| c.has_token && c.creator == Some(bot_id))
        .or_else(|| candidates.iter().position(|c| c.has_token))
}
