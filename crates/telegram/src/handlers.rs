use {
    teloxide::{
        RequestError,
        payloads::{SendMessageSetters, SendPhotoSetters},
        prelude::*,
        types::{InputFile, ParseMode, User},
    },
    tracing::{debug, error, info, warn},
    url::Url,
};

use thumbgrab_ledger::{NewRequester, RegisterOutcome};

use crate::{
    Error, Result, Services,
    extract::{self, VideoId},
    gate::{self, GateStatus},
    thumbnail::ThumbnailVariant,
    views,
};

/// Handle a single inbound message (called from the polling loop).
pub async fn handle_message(msg: Message, services: &Services) -> Result<()> {
    let Some(user) = msg.from.clone() else {
        debug!("ignoring message without a sender");
        return Ok(());
    };
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };
    let text = text.trim();

    if text == "/start" || text.starts_with("/start ") {
        return handle_start(&msg, &user, services).await;
    }
    if text == "/stats" {
        return handle_stats(&msg, &user, services).await;
    }

    handle_link_request(&msg, &user, text, services).await
}

/// `/start`: register (or touch) the requester, then render the welcome view.
async fn handle_start(msg: &Message, user: &User, services: &Services) -> Result<()> {
    let requester = NewRequester {
        user_id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    };

    // Registration is telemetry, not a precondition: a store failure must
    // not block the welcome view.
    match services.ledger.register_or_touch(requester).await {
        Ok(RegisterOutcome::Created) => {
            info!(user_id = user.id.0, "new requester registered");
            notify_operator(user, services).await;
        },
        Ok(RegisterOutcome::Existing) => {},
        Err(e) => warn!(user_id = user.id.0, error = %e, "requester registration failed"),
    }

    services
        .bot
        .send_photo(
            msg.chat.id,
            InputFile::url(services.links.start_image.clone()),
        )
        .caption(views::welcome_caption(
            &services.config.bot_name,
            &user.first_name,
        ))
        .parse_mode(ParseMode::Html)
        .reply_markup(views::welcome_keyboard(&services.links))
        .await?;

    Ok(())
}

/// One-time "new requester" notification to the operator channel.
async fn notify_operator(user: &User, services: &Services) {
    let Some(log_channel) = services.config.log_channel else {
        return;
    };
    let handle = user.username.as_deref().unwrap_or("none");
    let text = format!(
        "\u{2728} <b>New requester</b>\n\n\
         Name: {}\n\
         ID: <code>{}</code>\n\
         Handle: @{handle}\n\
         Bot: {}",
        user.first_name, user.id.0, services.config.bot_name,
    );
    if let Err(e) = services
        .bot
        .send_message(ChatId(log_channel), text)
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!(log_channel, error = %e, "failed to send new-requester notification");
    }
}

/// `/stats`: aggregate counts, admin allow-list only.
async fn handle_stats(msg: &Message, user: &User, services: &Services) -> Result<()> {
    if !services.is_admin(user.id.0) {
        // Not an error: unauthorized use is expected noise.
        debug!(user_id = user.id.0, "ignoring /stats from non-admin");
        return Ok(());
    }

    let stats = services.ledger.stats().await?;
    services
        .bot
        .send_message(
            msg.chat.id,
            format!(
                "\u{1F4CA} <b>Stats</b>\n\n\
                 Requesters: <code>{}</code>\n\
                 Thumbnails delivered: <code>{}</code>",
                stats.requesters, stats.usage_events,
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Free text: ban check, gate, extraction, tiered delivery, usage recording.
async fn handle_link_request(
    msg: &Message,
    user: &User,
    text: &str,
    services: &Services,
) -> Result<()> {
    let user_id = user.id.0 as i64;

    // Banned requesters are dropped before any other work, regardless of
    // what they sent.
    match services.ledger.is_banned(user_id).await {
        Ok(true) => {
            debug!(user_id, "dropping message from banned requester");
            return Ok(());
        },
        Ok(false) => {},
        Err(e) => warn!(user_id, error = %e, "ban lookup failed, proceeding"),
    }

    // Membership gate, re-checked fresh on every request.
    let status =
        gate::check_membership(&services.bot, services.config.gate_channel.as_deref(), user.id)
            .await;
    if status == GateStatus::NotMember {
        return send_gate_prompt(msg, services).await;
    }

    let Some(video_id) = extract::extract_video_id(text) else {
        services
            .bot
            .send_message(msg.chat.id, views::invalid_link_notice())
            .parse_mode(ParseMode::Html)
            .await?;
        return Ok(());
    };

    match deliver_thumbnail(&services.bot, msg.chat.id, &video_id).await {
        Ok(tier) => {
            info!(user_id, video_id = %video_id, tier = tier.label(), "thumbnail delivered");
            // Telemetry only; the artifact is already with the user.
            if let Err(e) = services.ledger.record_usage(user_id, video_id.as_str()).await {
                warn!(user_id, error = %e, "failed to record usage");
            }
        },
        Err(e) => {
            error!(video_id = %video_id, error = %e, "thumbnail resolution exhausted");
            services
                .bot
                .send_message(msg.chat.id, views::resolution_failed_notice())
                .await?;
        },
    }

    Ok(())
}

async fn send_gate_prompt(msg: &Message, services: &Services) -> Result<()> {
    // check_membership already returned NotMember, so a channel is configured.
    let Some(channel) = services.config.gate_channel.as_deref() else {
        return Ok(());
    };
    let join = gate::join_url(&services.bot, channel).await;
    let join = Url::parse(&join)?;

    services
        .bot
        .send_message(msg.chat.id, views::gate_prompt_caption())
        .parse_mode(ParseMode::Html)
        .reply_markup(views::gate_prompt_keyboard(join))
        .await?;
    Ok(())
}

/// Attempt delivery tier by tier, highest fidelity first.
///
/// Sequential on purpose: a missing high-resolution asset usually means the
/// lower tiers are the only ones that exist, and racing all tiers would send
/// redundant outbound calls for a resource likely to fail uniformly.
pub async fn deliver_thumbnail(
    bot: &Bot,
    chat_id: ChatId,
    video_id: &VideoId,
) -> Result<ThumbnailVariant> {
    let caption = views::result_caption(video_id);
    let keyboard = views::result_keyboard(video_id)?;

    let mut last_err: Option<RequestError> = None;
    for tier in ThumbnailVariant::ordered() {
        let photo = InputFile::url(Url::parse(&tier.url(video_id))?);
        match bot
            .send_photo(chat_id, photo)
            .caption(caption.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) => return Ok(tier),
            Err(e) => {
                debug!(video_id = %video_id, tier = tier.label(), error = %e, "tier failed, falling back");
                last_err = Some(e);
            },
        }
    }

    match last_err {
        Some(source) => Err(Error::ResolutionExhausted {
            video_id: video_id.to_string(),
            source,
        }),
        // ordered() is never empty.
        None => unreachable!("no thumbnail tier was attempted"),
    }
}
