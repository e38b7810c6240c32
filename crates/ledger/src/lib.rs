//! Durable per-requester state: registration, usage counting, ban flags.
//!
//! The ledger owns the `requesters` and `usage_events` tables exclusively;
//! all mutation goes through [`RequesterLedger`]. Concurrency discipline is
//! enforced at the store level (atomic upsert / atomic increment), never by
//! application-side read-then-write.

pub mod sqlite;

use async_trait::async_trait;

pub use sqlite::SqliteLedger;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A registered requester.
#[derive(Debug, Clone)]
pub struct Requester {
    pub user_id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub joined_at: i64,
    pub last_active_at: i64,
    pub usage_count: i64,
    pub banned: bool,
    pub gate_satisfied: bool,
}

/// Identity fields captured from the first inbound message.
#[derive(Debug, Clone)]
pub struct NewRequester {
    pub user_id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

/// Whether `register_or_touch` created a record or touched an existing one.
///
/// `Created` is reported at most once per `user_id`, even under concurrent
/// registration attempts — the caller may safely key one-time side effects
/// (like the operator notification) off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created,
    Existing,
}

/// Read-only aggregates for the admin stats command.
#[derive(Debug, Clone, Copy)]
pub struct LedgerStats {
    pub requesters: i64,
    pub usage_events: i64,
}

/// Durable requester state, keyed by platform user id.
#[async_trait]
pub trait RequesterLedger: Send + Sync {
    /// Atomic find-or-create. A new record starts with `usage_count` 0 and
    /// `banned` false; an existing record only has `last_active_at` refreshed.
    async fn register_or_touch(&self, requester: NewRequester) -> Result<RegisterOutcome>;

    /// Ban-flag lookup. An absent record is not banned.
    async fn is_banned(&self, user_id: i64) -> Result<bool>;

    /// Atomically increments the usage counter, refreshes `last_active_at`,
    /// and appends one usage event. Only called after a confirmed delivery.
    async fn record_usage(&self, user_id: i64, video_id: &str) -> Result<()>;

    /// Idempotent flag set, kept for analytics; the gate itself is re-checked
    /// fresh on every request regardless of this flag.
    async fn mark_gate_satisfied(&self, user_id: i64) -> Result<()>;

    /// Admin moderation toggle.
    async fn set_banned(&self, user_id: i64, banned: bool) -> Result<()>;

    /// Full record lookup.
    async fn requester(&self, user_id: i64) -> Result<Option<Requester>>;

    /// Aggregate counts.
    async fn stats(&self) -> Result<LedgerStats>;
}
