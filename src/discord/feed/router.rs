// Routes `~` chat commands to the feed service.
//
// **Notice the pattern:**
// 1. Extract primitive data from the Discord message
// 2. Call the core service
// 3. Reply with plain text based on the result

use poise::serenity_prelude as serenity;

use super::help;
use super::permissions;
use crate::core::feed::{join_handles, FeedCommand, FeedError, TrackedAccount};
use crate::discord::{Data, Error};

const NOT_PRIVILEGED: &str = "You must either be an owner, administrator, or server manager";
const NO_GUILD_INFO: &str = "could not get server information";
const NO_HANDLES: &str =
    "No user IDs given! Please link the accounts, or give the user handle!";
const NOTHING_TRACKED_INFO: &str = "No tracking for this channel currently!";
const NOTHING_TRACKED_REMOVE: &str = "No users being tracked in this channel currently!";
const NONE_REMOVED: &str = "Was not able to remove anyone with the given IDs!";
const STORE_FAILURE: &str = "Something went wrong updating this channel's follow list.";

/// Entry point for every non-bot message.
pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    // Ignore bots, including our own webhook posts
    if msg.author.bot || msg.webhook_id.is_some() {
        return Ok(());
    }

    let bot_id = ctx.cache.current_user().id;
    let bot_mentioned_first = msg.mentions.first().is_some_and(|u| u.id == bot_id);
    let Some(command) = FeedCommand::parse(&msg.content, bot_mentioned_first) else {
        return Ok(());
    };

    tracing::debug!(
        channel_id = msg.channel_id.get(),
        author_id = msg.author.id.get(),
        ?command,
        "Feed command received"
    );

    if command.requires_privilege() {
        match permissions::command_author(ctx, msg).await {
            Ok(author) if author.can_manage_follows() => {}
            Ok(_) => {
                msg.channel_id.say(&ctx.http, NOT_PRIVILEGED).await?;
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(
                    guild_id = ?msg.guild_id,
                    error = %err,
                    "Failed to resolve command author permissions"
                );
                msg.channel_id.say(&ctx.http, NO_GUILD_INFO).await?;
                return Ok(());
            }
        }
    }

    let channel_id = msg.channel_id.get();
    let reply = match command {
        FeedCommand::Help => {
            help::send_help(ctx, msg.channel_id).await?;
            return Ok(());
        }
        FeedCommand::Follow(handles) => follow_reply(data, channel_id, &handles).await,
        FeedCommand::FollowInfo => follow_info_reply(data, channel_id).await,
        FeedCommand::FollowRemove(handles) => follow_remove_reply(data, channel_id, &handles).await,
    };

    msg.channel_id.say(&ctx.http, reply).await?;
    Ok(())
}

async fn follow_reply(data: &Data, channel_id: u64, handles: &[String]) -> String {
    if handles.is_empty() {
        return NO_HANDLES.to_string();
    }

    match data.feed.follow(channel_id, handles).await {
        Ok(outcome) => {
            tracing::debug!(
                channel_id,
                added = %join_handles(&outcome.added),
                "Follow command applied"
            );
            format_following(&outcome.following)
        }
        Err(FeedError::Store(err)) => {
            tracing::error!(channel_id, error = %err, "Failed to save follow list");
            STORE_FAILURE.to_string()
        }
        Err(err) => {
            if let FeedError::Api(reason) = &err {
                tracing::warn!(channel_id, %reason, "Account verification failed");
            }
            format_unknown_accounts(handles)
        }
    }
}

async fn follow_info_reply(data: &Data, channel_id: u64) -> String {
    match data.feed.following(channel_id).await {
        Ok(accounts) if accounts.is_empty() => NOTHING_TRACKED_INFO.to_string(),
        Ok(accounts) => format!("This channel is following: **{}**", join_handles(&accounts)),
        Err(err) => {
            tracing::error!(channel_id, error = %err, "Failed to load follow list");
            STORE_FAILURE.to_string()
        }
    }
}

async fn follow_remove_reply(data: &Data, channel_id: u64, handles: &[String]) -> String {
    if handles.is_empty() {
        return NO_HANDLES.to_string();
    }

    match data.feed.unfollow(channel_id, handles).await {
        Ok(outcome) => {
            tracing::debug!(
                channel_id,
                remaining = outcome.remaining.len(),
                "Unfollow command applied"
            );
            format!(
                "Removed the following people: **{}**",
                join_handles(&outcome.removed)
            )
        }
        Err(FeedError::NothingTracked) => NOTHING_TRACKED_REMOVE.to_string(),
        Err(FeedError::NoneMatched) => NONE_REMOVED.to_string(),
        Err(err) => {
            tracing::error!(channel_id, error = %err, "Failed to update follow list");
            STORE_FAILURE.to_string()
        }
    }
}

fn format_following(accounts: &[TrackedAccount]) -> String {
    format!(
        "Now following: **{}**. Please make sure I have the **MANAGE_WEBHOOKS** permission \
         in this channel, otherwise I cannot post and will stop tracking it!",
        join_handles(accounts)
    )
}

fn format_unknown_accounts(handles: &[String]) -> String {
    format!(
        "The users **{}** either do not exist, or are protected.",
        handles.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(handle: &str) -> TrackedAccount {
        TrackedAccount {
            id: String::new(),
            handle: handle.to_string(),
            name: String::new(),
            avatar_url: None,
            protected: false,
        }
    }

    #[test]
    fn test_following_reply_lists_everyone() {
        let reply = format_following(&[account("jack"), account("TwitterDev")]);
        assert!(reply.starts_with("Now following: **jack, TwitterDev**."));
        assert!(reply.contains("MANAGE_WEBHOOKS"));
    }

    #[test]
    fn test_unknown_accounts_reply() {
        let reply = format_unknown_accounts(&["ghost".to_string(), "locked".to_string()]);
        assert_eq!(
            reply,
            "The users **ghost, locked** either do not exist, or are protected."
        );
    }
}
