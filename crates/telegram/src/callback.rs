use {
    teloxide::{
        payloads::AnswerCallbackQuerySetters,
        prelude::*,
        types::{CallbackQuery, ParseMode},
    },
    tracing::{debug, warn},
};

use crate::{Result, Services, gate, views};

/// Closed set of callback tokens the bot emits on its own keyboards.
///
/// Free text never drives these transitions; unknown tokens are acknowledged
/// and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    AboutBot,
    MoreTools,
    BackToStart,
    CheckSubscribe,
}

impl CallbackAction {
    /// Wire token carried in `callback_data`.
    pub fn token(self) -> String {
        match self {
            Self::AboutBot => "about_bot",
            Self::MoreTools => "more_tools",
            Self::BackToStart => "back_to_start",
            Self::CheckSubscribe => "check_subscribe",
        }
        .to_string()
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "about_bot" => Some(Self::AboutBot),
            "more_tools" => Some(Self::MoreTools),
            "back_to_start" => Some(Self::BackToStart),
            "check_subscribe" => Some(Self::CheckSubscribe),
            _ => None,
        }
    }
}

/// Handle an inline keyboard button press.
///
/// The platform shows a pending indicator until the callback is answered, so
/// every path through here ends in `answer_callback_query` — including
/// unrecognized tokens and queries without a reachable source message.
pub async fn handle_callback_query(query: CallbackQuery, services: &Services) -> Result<()> {
    let bot = &services.bot;

    let action = query.data.as_deref().and_then(CallbackAction::parse);
    let Some(action) = action else {
        debug!(data = ?query.data, "ignoring unrecognized callback token");
        bot.answer_callback_query(&query.id).await?;
        return Ok(());
    };

    let message = query
        .message
        .as_ref()
        .map(|m| (m.chat().id, m.id()));
    let Some((chat_id, message_id)) = message else {
        bot.answer_callback_query(&query.id).await?;
        return Ok(());
    };

    match action {
        CallbackAction::AboutBot => {
            let edit = bot
                .edit_message_caption(chat_id, message_id)
                .caption(views::about_caption(&services.config.bot_name))
                .parse_mode(ParseMode::Html)
                .reply_markup(views::about_keyboard())
                .await;
            if let Err(e) = edit {
                warn!(error = %e, "failed to render about view");
            }
            bot.answer_callback_query(&query.id).await?;
        },
        CallbackAction::MoreTools => {
            let edit = bot
                .edit_message_caption(chat_id, message_id)
                .caption(views::more_tools_caption())
                .parse_mode(ParseMode::Html)
                .reply_markup(views::more_tools_keyboard(&services.links))
                .await;
            if let Err(e) = edit {
                warn!(error = %e, "failed to render more-tools view");
            }
            bot.answer_callback_query(&query.id).await?;
        },
        CallbackAction::BackToStart => {
            let caption =
                views::welcome_caption(&services.config.bot_name, &query.from.first_name);
            let edit = bot
                .edit_message_caption(chat_id, message_id)
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .reply_markup(views::welcome_keyboard(&services.links))
                .await;
            if let Err(e) = edit {
                warn!(error = %e, "failed to render welcome view");
            }
            bot.answer_callback_query(&query.id).await?;
        },
        CallbackAction::CheckSubscribe => {
            let status = gate::check_membership(
                bot,
                services.config.gate_channel.as_deref(),
                query.from.id,
            )
            .await;

            match status {
                gate::GateStatus::Satisfied => {
                    bot.answer_callback_query(&query.id)
                        .text("Thank you for joining! You can now use the bot.")
                        .show_alert(true)
                        .await?;
                    // The prompt has served its purpose.
                    if let Err(e) = bot.delete_message(chat_id, message_id).await {
                        warn!(error = %e, "failed to dismiss gate prompt");
                    }
                    let user_id = query.from.id.0 as i64;
                    if let Err(e) = services.ledger.mark_gate_satisfied(user_id).await {
                        warn!(user_id, error = %e, "failed to persist gate flag");
                    }
                },
                gate::GateStatus::NotMember => {
                    bot.answer_callback_query(&query.id)
                        .text("You have not joined the channel yet. Please join to continue.")
                        .show_alert(true)
                        .await?;
                },
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        for action in [
            CallbackAction::AboutBot,
            CallbackAction::MoreTools,
            CallbackAction::BackToStart,
            CallbackAction::CheckSubscribe,
        ] {
            assert_eq!(CallbackAction::parse(&action.token()), Some(action));
        }
    }

    #[test]
    fn unknown_token_is_none() {
        assert!(CallbackAction::parse("sessions_switch:3").is_none());
        assert!(CallbackAction::parse("").is_none());
    }
}
