//! Configuration loading, env substitution, and file discovery.
//!
//! Config files: `thumbgrab.toml`, `thumbgrab.yaml`, or `thumbgrab.json`
//! Searched in `./` then `~/.config/thumbgrab/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, default_database_path, discover_and_load, load_config},
    schema::BotConfig,
};
