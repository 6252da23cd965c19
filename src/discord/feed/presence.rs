// Bot presence. Discord-layer glue only.

use poise::serenity_prelude as serenity;

/// Called once the bot is ready so the status line points people at `~help`.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("~help");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
