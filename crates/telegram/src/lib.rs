//! Telegram front end for thumbgrab.
//!
//! Receives chat messages via the Bot API, extracts YouTube video ids,
//! enforces the channel-membership gate, and delivers thumbnail artifacts
//! with tiered fallback and inline follow-up actions.

pub mod bot;
pub mod callback;
pub mod extract;
pub mod gate;
pub mod handlers;
pub mod state;
pub mod thumbnail;
pub mod views;

pub use {extract::VideoId, state::Services};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Ledger(#[from] thumbgrab_ledger::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Every thumbnail tier was attempted and the platform rejected each one.
    #[error("no thumbnail variant deliverable for {video_id}")]
    ResolutionExhausted {
        video_id: String,
        #[source]
        source: teloxide::RequestError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
