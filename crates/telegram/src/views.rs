//! Rendered view content: captions and inline keyboards.
//!
//! Pure builders — no API calls, no state. Callback tokens on buttons are the
//! only way the interactive state machine moves (see `callback`).

use {
    teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup},
    url::Url,
};

use crate::{
    callback::CallbackAction,
    extract::VideoId,
    state::ViewLinks,
    thumbnail::ThumbnailVariant,
};

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Welcome caption for the start view.
pub fn welcome_caption(bot_name: &str, first_name: &str) -> String {
    format!(
        "<b>\u{1F44B} Hello, {}!</b>\n\n\
         I am the <b>{}</b>, your reliable assistant for downloading YouTube \
         video thumbnails.\n\n\
         Simply send me any YouTube video link to get started!",
        escape_html(first_name),
        escape_html(bot_name),
    )
}

/// 2x2 start keyboard: two callback actions, two external links.
pub fn welcome_keyboard(links: &ViewLinks) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![
            InlineKeyboardButton::callback("\u{1F4A1} About Bot", CallbackAction::AboutBot.token()),
            InlineKeyboardButton::url(
                "\u{1F4E2} Updates Channel",
                links.updates_channel.clone(),
            ),
        ],
        vec![
            InlineKeyboardButton::callback(
                "\u{1F6E0} More Tools",
                CallbackAction::MoreTools.token(),
            ),
            InlineKeyboardButton::url("\u{1F91D} Support", links.support.clone()),
        ],
    ])
}

pub fn about_caption(bot_name: &str) -> String {
    format!(
        "<b>About This Bot</b>\n\n\
         <b>{}</b> helps you quickly download high-quality thumbnails from any \
         YouTube video.\n\n\
         <b>Features:</b>\n\
         \u{2705} HD &amp; SD quality\n\
         \u{2705} Fast &amp; reliable\n\
         \u{2705} Easy to use",
        escape_html(bot_name),
    )
}

pub fn about_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([vec![back_button()]])
}

pub fn more_tools_caption() -> String {
    "<b>Discover More Tools</b>\n\n\
     Explore our collection of other useful bots and tools designed to make \
     your life easier!\n\n\
     Visit our main channel to see what else we have to offer."
        .to_string()
}

pub fn more_tools_keyboard(links: &ViewLinks) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![InlineKeyboardButton::url(
            "\u{1F916} Explore Bots",
            links.updates_channel.clone(),
        )],
        vec![back_button()],
    ])
}

/// Gate prompt shown when the membership precondition is not satisfied.
pub fn gate_prompt_caption() -> String {
    "<b>\u{26A0} Access denied!</b>\n\n\
     To use this bot, you must join our updates channel. This helps us keep \
     you posted on new features and important announcements."
        .to_string()
}

pub fn gate_prompt_keyboard(join_url: Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![InlineKeyboardButton::url(
            "\u{27A1} Join Channel",
            join_url,
        )],
        vec![InlineKeyboardButton::callback(
            "\u{2705} I Have Joined",
            CallbackAction::CheckSubscribe.token(),
        )],
    ])
}

/// Caption for a delivered thumbnail.
pub fn result_caption(id: &VideoId) -> String {
    format!("\u{1F5BC} Thumbnails for <b>{id}</b>")
}

/// Direct-download links for the top two tiers, attached to every result.
pub fn result_keyboard(id: &VideoId) -> crate::Result<InlineKeyboardMarkup> {
    let hd = Url::parse(&ThumbnailVariant::MaxRes.url(id))?;
    let sd = Url::parse(&ThumbnailVariant::Sd.url(id))?;
    Ok(InlineKeyboardMarkup::new([vec![
        InlineKeyboardButton::url("\u{1F4E5} Download HD", hd),
        InlineKeyboardButton::url("\u{1F4E5} Download SD", sd),
    ]]))
}

pub fn invalid_link_notice() -> &'static str {
    "\u{274C} <b>Invalid link!</b> Please send a valid YouTube video link."
}

pub fn resolution_failed_notice() -> &'static str {
    "Could not fetch the thumbnail. Please check the video link."
}

fn back_button() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("\u{2B05} Back", CallbackAction::BackToStart.token())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::extract::extract_video_id};

    #[test]
    fn welcome_caption_escapes_html() {
        let caption = welcome_caption("Bot <3", "A & B");
        assert!(caption.contains("A &amp; B"));
        assert!(caption.contains("Bot &lt;3"));
    }

    #[test]
    fn result_keyboard_links_to_top_tiers() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let kb = result_keyboard(&id).unwrap();
        let row = &kb.inline_keyboard[0];
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].text, "\u{1F4E5} Download HD");
        assert_eq!(row[1].text, "\u{1F4E5} Download SD");
    }

    #[test]
    fn gate_prompt_has_join_and_recheck_controls() {
        let kb = gate_prompt_keyboard(Url::parse("https://t.me/updates").unwrap());
        assert_eq!(kb.inline_keyboard.len(), 2);
        assert_eq!(kb.inline_keyboard[1][0].text, "\u{2705} I Have Joined");
    }
}
