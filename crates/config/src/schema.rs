use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration for a single bot process.
///
/// Every field has a default so a partial config file (or none at all, with
/// `${ENV}` overrides) still produces a usable value. The configuration is
/// assembled once at startup and treated as immutable afterwards.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Channel users must join before the bot serves them (e.g. "@updates").
    /// When unset, no membership check is performed at all.
    pub gate_channel: Option<String>,

    /// User IDs allowed to run the /stats command.
    pub admins: Vec<u64>,

    /// Chat that receives the "new requester" operator notification.
    pub log_channel: Option<i64>,

    /// Display name used in rendered views.
    pub bot_name: String,

    /// Image shown with the welcome view.
    pub start_image: String,

    /// Public channel advertised in the welcome and more-tools views.
    pub updates_channel_url: String,

    /// Support chat advertised in the welcome view.
    pub support_url: String,

    /// SQLite database path. Defaults to `thumbgrab.db` in the data dir.
    pub database_path: Option<PathBuf>,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("gate_channel", &self.gate_channel)
            .field("admins", &self.admins)
            .field("log_channel", &self.log_channel)
            .field("bot_name", &self.bot_name)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            gate_channel: None,
            admins: Vec::new(),
            log_channel: None,
            bot_name: "YT Thumbnail Downloader".into(),
            start_image: "https://telegra.ph/file/1b2df9f3014633f679544.jpg".into(),
            updates_channel_url: "https://t.me/BotClusters".into(),
            support_url: "https://t.me/BC_Support".into(),
            database_path: None,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = BotConfig::default();
        assert!(cfg.gate_channel.is_none());
        assert!(cfg.admins.is_empty());
        assert_eq!(cfg.bot_name, "YT Thumbnail Downloader");
    }

    #[test]
    fn deserialize_from_toml() {
        let raw = r#"
            token = "123:ABC"
            gate_channel = "@updates"
            admins = [42, 99]
        "#;
        let cfg: BotConfig = toml::from_str(raw).expect("parse");
        assert_eq!(cfg.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.gate_channel.as_deref(), Some("@updates"));
        assert_eq!(cfg.admins, vec![42, 99]);
        // defaults for unspecified fields
        assert!(cfg.log_channel.is_none());
        assert!(!cfg.start_image.is_empty());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = BotConfig {
            token: Secret::new("super-secret".into()),
            ..Default::default()
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn serialize_roundtrip() {
        let cfg = BotConfig {
            token: Secret::new("tok".into()),
            gate_channel: Some("@gate".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).expect("serialize");
        let cfg2: BotConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(cfg2.token.expose_secret(), "tok");
        assert_eq!(cfg2.gate_channel.as_deref(), Some("@gate"));
    }
}
