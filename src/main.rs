// This is the entry point of the Twitter feed bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Twitter API, JSON files)
// - `discord/` = Discord-specific adapters (message routing, webhooks)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework and the background poller
// 4. Shut down cleanly on SIGINT/SIGTERM

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;

use crate::config::BotConfig;
use crate::core::feed::FeedService;
use crate::discord::feed::dispatcher::{FeedDispatcher, WebhookProfile};
use crate::discord::feed::{presence, router};
use crate::discord::{Data, Error};
use crate::infra::feed::{JsonFollowStore, TwitterApiClient};

/// Event handler for non-command Discord events.
/// Every `~` command arrives here as a plain message.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        if let Err(e) = router::handle_message(ctx, new_message, data).await {
            tracing::error!(
                channel_id = new_message.channel_id.get(),
                "Error handling feed command: {}",
                e
            );
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    let config = BotConfig::load()?;

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create follow list directory {}",
            config.data_dir.display()
        )
    })?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let twitter = TwitterApiClient::connect(config.twitter_auth.clone())
        .await
        .context("Failed to create Twitter API client")?;
    let follow_store = JsonFollowStore::new(&config.data_dir);
    let feed_service = Arc::new(FeedService::new(
        twitter,
        follow_store,
        config.timeline_count,
    ));

    let webhook_profile = Arc::new(
        WebhookProfile::load(&config.webhook_name, config.webhook_avatar.as_deref()).await,
    );

    let data = Data {
        feed: Arc::clone(&feed_service),
        webhook: Arc::clone(&webhook_profile),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read `~` commands
        | serenity::GatewayIntents::GUILDS;

    let poll_interval = config.poll_interval;
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "Twitter feed bot is now online");
                presence::on_ready(ctx);

                let dispatcher = FeedDispatcher::new(
                    ctx.http.clone(),
                    Arc::clone(&data.feed),
                    Arc::clone(&data.webhook),
                    ready.user.id,
                );
                tokio::spawn(dispatcher.run(poll_interval));

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, closing Discord session");
        shard_manager.shutdown_all().await;
    });

    client.start().await.context("Error running bot")?;
    Ok(())
}
