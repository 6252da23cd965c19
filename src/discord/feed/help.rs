use poise::serenity_prelude as serenity;

const DESCRIPTION: &str = "This bot follows Twitter accounts and posts every new tweet they make, \
including retweets.\n\
To follow an account, use `~follow <link to user|user handle>`.\n\
To follow multiple accounts, separate the links/user handles with a space.\n\
To remove accounts, use `~followremove` instead of `~follow`. It works the same way.\n\
To see which accounts are being followed, post `~followinfo`.\n\
Following and unfollowing needs the server owner, an administrator, or a server manager.";

const FOLLOW_EXAMPLES: &str = "~follow https://twitter.com/Twitter https://twitter.com/TwitterAPI?s=09 https://twitter.com/TwitterDev\n\
~follow https://twitter.com/jack\n\
~follow jack twitter";

const UNFOLLOW_EXAMPLES: &str = "~followremove https://twitter.com/Twitter https://twitter.com/TwitterAPI?s=09 https://twitter.com/TwitterDev\n\
~followremove https://twitter.com/jack\n\
~followremove jack twitter";

/// Build the `~help` embed, authored as the bot itself.
pub fn build_help_embed(bot_name: &str, bot_avatar: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .author(serenity::CreateEmbedAuthor::new(bot_name).icon_url(bot_avatar))
        .description(DESCRIPTION)
        .color(serenity::Colour::from_rgb(29, 161, 242))
        .field("Example of **following** accounts", FOLLOW_EXAMPLES, false)
        .field("Example of **unfollowing** accounts", UNFOLLOW_EXAMPLES, false)
}

pub async fn send_help(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
) -> Result<(), serenity::Error> {
    let (name, avatar) = {
        let me = ctx.cache.current_user();
        (me.name.clone(), me.face())
    };

    channel_id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new().embed(build_help_embed(&name, &avatar)),
        )
        .await?;
    Ok(())
}
