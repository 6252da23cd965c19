// Chat command recognition and the permission rule for follow-list edits.
//
// Nothing here knows about Discord types: the router hands us the raw text
// plus a couple of flags, and gets back a command to run.

use lazy_regex::lazy_regex;

use super::handles::extract_handles;

static RE_HELP: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"~help");
static RE_FOLLOW: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"~follow\s+(.+)");
static RE_FOLLOW_INFO: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"~followinfo");
static RE_FOLLOW_REMOVE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"~followremove\s+(.+)");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    Help,
    Follow(Vec<String>),
    FollowInfo,
    FollowRemove(Vec<String>),
}

impl FeedCommand {
    /// Match a message against the known commands. First match wins, in the
    /// order help, follow, follow-info, follow-remove. Mentioning the bot as
    /// the first mention is an alias for help.
    pub fn parse(content: &str, bot_mentioned_first: bool) -> Option<Self> {
        if RE_HELP.is_match(content) || bot_mentioned_first {
            return Some(Self::Help);
        }
        if let Some(caps) = RE_FOLLOW.captures(content) {
            return Some(Self::Follow(extract_handles(&caps[1])));
        }
        if RE_FOLLOW_INFO.is_match(content) {
            return Some(Self::FollowInfo);
        }
        if let Some(caps) = RE_FOLLOW_REMOVE.captures(content) {
            return Some(Self::FollowRemove(extract_handles(&caps[1])));
        }
        None
    }

    /// Whether running this command changes a channel's follow-list.
    pub fn requires_privilege(&self) -> bool {
        matches!(self, Self::Follow(_) | Self::FollowRemove(_))
    }
}

/// Who sent a command, reduced to what the permission rule needs.
#[derive(Debug, Clone)]
pub enum CommandAuthor {
    DirectMessage,
    GuildMember {
        is_owner: bool,
        /// Holds a role with ADMINISTRATOR or MANAGE_GUILD.
        has_manager_role: bool,
    },
}

impl CommandAuthor {
    /// Direct messages are always allowed. In a guild the author must own it
    /// or hold a role with ADMINISTRATOR or MANAGE_GUILD.
    pub fn can_manage_follows(&self) -> bool {
        match self {
            Self::DirectMessage => true,
            Self::GuildMember {
                is_owner,
                has_manager_role,
            } => *is_owner || *has_manager_role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_command() {
        assert_eq!(FeedCommand::parse("~help", false), Some(FeedCommand::Help));
        assert_eq!(
            FeedCommand::parse("~follow jack https://twitter.com/TwitterDev", false),
            Some(FeedCommand::Follow(vec![
                "jack".to_string(),
                "TwitterDev".to_string()
            ]))
        );
        assert_eq!(
            FeedCommand::parse("~followinfo", false),
            Some(FeedCommand::FollowInfo)
        );
        assert_eq!(
            FeedCommand::parse("~followremove jack", false),
            Some(FeedCommand::FollowRemove(vec!["jack".to_string()]))
        );
        assert_eq!(FeedCommand::parse("hello there", false), None);
    }

    #[test]
    fn test_followinfo_is_not_a_follow() {
        // `~follow\s+` needs whitespace right after the keyword
        assert_eq!(
            FeedCommand::parse("~followinfo please", false),
            Some(FeedCommand::FollowInfo)
        );
    }

    #[test]
    fn test_help_takes_priority() {
        assert_eq!(
            FeedCommand::parse("~follow jack ~help", false),
            Some(FeedCommand::Help)
        );
        assert_eq!(
            FeedCommand::parse("~follow jack", true),
            Some(FeedCommand::Help)
        );
    }

    #[test]
    fn test_follow_without_arguments_is_ignored() {
        assert_eq!(FeedCommand::parse("~follow", false), None);
        assert_eq!(FeedCommand::parse("~followremove", false), None);
    }

    #[test]
    fn test_privileged_commands() {
        assert!(FeedCommand::Follow(vec![]).requires_privilege());
        assert!(FeedCommand::FollowRemove(vec![]).requires_privilege());
        assert!(!FeedCommand::FollowInfo.requires_privilege());
        assert!(!FeedCommand::Help.requires_privilege());
    }

    #[test]
    fn test_permission_rule() {
        assert!(CommandAuthor::DirectMessage.can_manage_follows());

        let owner = CommandAuthor::GuildMember {
            is_owner: true,
            has_manager_role: false,
        };
        assert!(owner.can_manage_follows());

        let manager = CommandAuthor::GuildMember {
            is_owner: false,
            has_manager_role: true,
        };
        assert!(manager.can_manage_follows());

        let regular = CommandAuthor::GuildMember {
            is_owner: false,
            has_manager_role: false,
        };
        assert!(!regular.can_manage_follows());
    }
}
