// Resolve who sent a message into the platform-agnostic `CommandAuthor`.

use std::collections::HashMap;

use poise::serenity_prelude as serenity;

use crate::core::feed::CommandAuthor;

/// Look up guild ownership and whether the author holds a manager role.
///
/// Prefers the gateway cache and only falls back to HTTP when the guild or
/// member is not cached.
pub async fn command_author(
    ctx: &serenity::Context,
    msg: &serenity::Message,
) -> Result<CommandAuthor, serenity::Error> {
    let Some(guild_id) = msg.guild_id else {
        return Ok(CommandAuthor::DirectMessage);
    };

    let cached = ctx
        .cache
        .guild(guild_id)
        .map(|guild| (guild.owner_id, role_permissions(&guild.roles)));
    let (owner_id, roles) = match cached {
        Some(found) => found,
        None => {
            let guild = guild_id.to_partial_guild(&ctx.http).await?;
            (guild.owner_id, role_permissions(&guild.roles))
        }
    };

    let member_roles = match msg.member.as_ref() {
        Some(member) => member.roles.clone(),
        None => guild_id.member(ctx, msg.author.id).await?.roles,
    };

    Ok(CommandAuthor::GuildMember {
        is_owner: owner_id == msg.author.id,
        has_manager_role: member_roles
            .iter()
            .filter_map(|id| roles.get(id).copied())
            .any(grants_follow_management),
    })
}

fn role_permissions(
    roles: &HashMap<serenity::RoleId, serenity::Role>,
) -> HashMap<serenity::RoleId, serenity::Permissions> {
    roles
        .iter()
        .map(|(id, role)| (*id, role.permissions))
        .collect()
}

/// ADMINISTRATOR or MANAGE_GUILD lets a role edit follow lists.
fn grants_follow_management(permissions: serenity::Permissions) -> bool {
    permissions
        .intersects(serenity::Permissions::ADMINISTRATOR | serenity::Permissions::MANAGE_GUILD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use self::serenity::Permissions;

    #[test]
    fn test_manager_permissions() {
        assert!(grants_follow_management(Permissions::ADMINISTRATOR));
        assert!(grants_follow_management(
            Permissions::MANAGE_GUILD | Permissions::SEND_MESSAGES
        ));
    }

    #[test]
    fn test_regular_permissions() {
        assert!(!grants_follow_management(Permissions::empty()));
        assert!(!grants_follow_management(
            Permissions::SEND_MESSAGES | Permissions::MANAGE_MESSAGES
        ));
    }
}
