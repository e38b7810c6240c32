use {
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{Recipient, UserId},
    },
    tracing::warn,
};

/// Outcome of the membership precondition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Satisfied,
    NotMember,
}

/// Build a `get_chat_member` recipient from a configured channel reference
/// (numeric chat id or public `@username`, with or without the `@`).
pub fn channel_recipient(channel: &str) -> Recipient {
    if let Ok(id) = channel.parse::<i64>() {
        Recipient::Id(ChatId(id))
    } else if channel.starts_with('@') {
        Recipient::ChannelUsername(channel.to_string())
    } else {
        Recipient::ChannelUsername(format!("@{channel}"))
    }
}

/// Check the requester's membership in the gating channel.
///
/// No configured channel means no check at all. A reachable API answering
/// "left", "kicked", or "user not found" is the only path to `NotMember`;
/// any other failure (network, transient platform error) fails OPEN so a
/// flaky collaborator never locks users out. The trade-off is deliberate:
/// availability over strictness.
pub async fn check_membership(
    bot: &Bot,
    channel: Option<&str>,
    user_id: UserId,
) -> GateStatus {
    let Some(channel) = channel else {
        return GateStatus::Satisfied;
    };

    match bot.get_chat_member(channel_recipient(channel), user_id).await {
        Ok(member) => {
            if member.kind.is_present() {
                GateStatus::Satisfied
            } else {
                GateStatus::NotMember
            }
        },
        Err(RequestError::Api(ApiError::UserNotFound)) => GateStatus::NotMember,
        Err(e) => {
            warn!(channel, user_id = user_id.0, error = %e, "gate check failed, failing open");
            GateStatus::Satisfied
        },
    }
}

/// Address a non-member can use to join the gating channel.
///
/// Prefers the live invite link (covers private channels); falls back to the
/// derivable t.me address.
pub async fn join_url(bot: &Bot, channel: &str) -> String {
    if let Ok(chat) = bot.get_chat(channel_recipient(channel)).await
        && let Some(link) = chat.invite_link()
    {
        return link.to_string();
    }
    format!("https://t.me/{}", channel.trim_start_matches('@'))
}
