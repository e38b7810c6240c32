use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::BotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "thumbgrab.toml",
    "thumbgrab.yaml",
    "thumbgrab.yml",
    "thumbgrab.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<BotConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./thumbgrab.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/thumbgrab/thumbgrab.{toml,yaml,yml,json}` (user-global)
///
/// Returns `BotConfig::default()` if no config file is found.
pub fn discover_and_load() -> BotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    BotConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/thumbgrab/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "thumbgrab") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/thumbgrab/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "thumbgrab").map(|d| d.config_dir().to_path_buf())
}

/// Default location for the SQLite database when the config does not set one.
pub fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "thumbgrab")
        .map(|d| d.data_dir().join("thumbgrab.db"))
        .unwrap_or_else(|| PathBuf::from("thumbgrab.db"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<BotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
