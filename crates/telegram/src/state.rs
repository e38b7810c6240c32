use std::sync::Arc;

use {secrecy::ExposeSecret, teloxide::Bot, url::Url};

use {thumbgrab_config::BotConfig, thumbgrab_ledger::RequesterLedger};

/// Everything a handler needs, built once at startup and shared immutably.
///
/// There is deliberately no mutable state here: per-requester state lives in
/// the ledger, and the gate is re-checked against the platform on every
/// request.
pub struct Services {
    pub bot: Bot,
    pub config: BotConfig,
    pub ledger: Arc<dyn RequesterLedger>,
    /// Pre-parsed view link targets; parsing once at startup keeps the
    /// render paths infallible.
    pub links: ViewLinks,
}

/// External link targets used by rendered views.
#[derive(Debug, Clone)]
pub struct ViewLinks {
    pub start_image: Url,
    pub updates_channel: Url,
    pub support: Url,
}

impl Services {
    /// Assemble the services bundle. Fails fast on malformed configured URLs
    /// rather than erroring mid-pipeline.
    pub fn new(config: BotConfig, ledger: Arc<dyn RequesterLedger>) -> anyhow::Result<Self> {
        // Client timeout longer than the long-polling timeout (30s) so the
        // HTTP client doesn't abort the request before Telegram responds.
        let client = teloxide::net::default_reqwest_settings()
            .timeout(std::time::Duration::from_secs(45))
            .build()?;
        let bot = Bot::with_client(config.token.expose_secret(), client);
        Self::with_bot(bot, config, ledger)
    }

    /// Like [`Services::new`] but with a caller-supplied bot (tests point it
    /// at a mock API).
    pub fn with_bot(
        bot: Bot,
        config: BotConfig,
        ledger: Arc<dyn RequesterLedger>,
    ) -> anyhow::Result<Self> {
        let links = ViewLinks {
            start_image: Url::parse(&config.start_image)?,
            updates_channel: Url::parse(&config.updates_channel_url)?,
            support: Url::parse(&config.support_url)?,
        };
        Ok(Self {
            bot,
            config,
            ledger,
            links,
        })
    }

    /// Whether the requester may run admin commands.
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.config.admins.contains(&user_id)
    }
}
