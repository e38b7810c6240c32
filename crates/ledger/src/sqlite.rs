use {async_trait::async_trait, sqlx::SqlitePool, tracing::debug};

use crate::{
    LedgerStats, NewRequester, RegisterOutcome, Requester, RequesterLedger, Result,
};

/// SQLite-backed requester ledger.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the ledger schema if it does not exist.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS requesters (
                user_id        INTEGER PRIMARY KEY,
                first_name     TEXT    NOT NULL,
                username       TEXT,
                joined_at      INTEGER NOT NULL,
                last_active_at INTEGER NOT NULL,
                usage_count    INTEGER NOT NULL DEFAULT 0,
                banned         INTEGER NOT NULL DEFAULT 0,
                gate_satisfied INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS usage_events (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    INTEGER NOT NULL,
                video_id   TEXT    NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_usage_events_user
             ON usage_events (user_id, created_at DESC)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[async_trait]
impl RequesterLedger for SqliteLedger {
    async fn register_or_touch(&self, requester: NewRequester) -> Result<RegisterOutcome> {
        let now = Self::now();

        // Conflict-free create: under concurrent registration for the same
        // user_id exactly one INSERT reports an affected row.
        let inserted = sqlx::query(
            "INSERT INTO requesters (user_id, first_name, username, joined_at, last_active_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(requester.user_id)
        .bind(&requester.first_name)
        .bind(&requester.username)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            debug!(user_id = requester.user_id, "registered new requester");
            return Ok(RegisterOutcome::Created);
        }

        sqlx::query("UPDATE requesters SET last_active_at = ? WHERE user_id = ?")
            .bind(now)
            .bind(requester.user_id)
            .execute(&self.pool)
            .await?;

        Ok(RegisterOutcome::Existing)
    }

    async fn is_banned(&self, user_id: i64) -> Result<bool> {
        let banned: Option<(bool,)> =
            sqlx::query_as("SELECT banned FROM requesters WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(banned.is_some_and(|(b,)| b))
    }

    async fn record_usage(&self, user_id: i64, video_id: &str) -> Result<()> {
        let now = Self::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE requesters
             SET usage_count = usage_count + 1, last_active_at = ?
             WHERE user_id = ?",
        )
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO usage_events (user_id, video_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(video_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn mark_gate_satisfied(&self, user_id: i64) -> Result<()> {
        sqlx::query("UPDATE requesters SET gate_satisfied = 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_banned(&self, user_id: i64, banned: bool) -> Result<()> {
        sqlx::query("UPDATE requesters SET banned = ? WHERE user_id = ?")
            .bind(banned)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn requester(&self, user_id: i64) -> Result<Option<Requester>> {
        let row: Option<(i64, String, Option<String>, i64, i64, i64, bool, bool)> = sqlx::query_as(
            "SELECT user_id, first_name, username, joined_at, last_active_at,
                    usage_count, banned, gate_satisfied
             FROM requesters
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Requester {
            user_id: r.0,
            first_name: r.1,
            username: r.2,
            joined_at: r.3,
            last_active_at: r.4,
            usage_count: r.5,
            banned: r.6,
            gate_satisfied: r.7,
        }))
    }

    async fn stats(&self) -> Result<LedgerStats> {
        let (requesters,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM requesters")
            .fetch_one(&self.pool)
            .await?;
        let (usage_events,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM usage_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(LedgerStats {
            requesters,
            usage_events,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn test_ledger() -> SqliteLedger {
        // A plain `sqlite::memory:` pool hands each connection its own empty
        // database; cap the pool at one connection so every query sees the
        // same schema.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteLedger::init(&pool).await.unwrap();
        SqliteLedger::new(pool)
    }

    fn alice() -> NewRequester {
        NewRequester {
            user_id: 1001,
            first_name: "Alice".into(),
            username: Some("alice".into()),
        }
    }

    #[tokio::test]
    async fn first_registration_creates() {
        let ledger = test_ledger().await;
        let outcome = ledger.register_or_touch(alice()).await.unwrap();
        assert_eq!(outcome, RegisterOutcome::Created);

        let rec = ledger.requester(1001).await.unwrap().unwrap();
        assert_eq!(rec.first_name, "Alice");
        assert_eq!(rec.usage_count, 0);
        assert!(!rec.banned);
        assert!(!rec.gate_satisfied);
    }

    #[tokio::test]
    async fn second_registration_is_a_touch() {
        let ledger = test_ledger().await;
        assert_eq!(
            ledger.register_or_touch(alice()).await.unwrap(),
            RegisterOutcome::Created
        );
        assert_eq!(
            ledger.register_or_touch(alice()).await.unwrap(),
            RegisterOutcome::Existing
        );

        // Still exactly one record, counter untouched.
        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.requesters, 1);
        assert_eq!(ledger.requester(1001).await.unwrap().unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn concurrent_registration_creates_once() {
        let ledger = std::sync::Arc::new(test_ledger().await);

        let a = tokio::spawn({
            let l = std::sync::Arc::clone(&ledger);
            async move { l.register_or_touch(alice()).await.unwrap() }
        });
        let b = tokio::spawn({
            let l = std::sync::Arc::clone(&ledger);
            async move { l.register_or_touch(alice()).await.unwrap() }
        });

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        let created = [ra, rb]
            .iter()
            .filter(|o| **o == RegisterOutcome::Created)
            .count();
        assert_eq!(created, 1, "exactly one concurrent insert may win");
        assert_eq!(ledger.stats().await.unwrap().requesters, 1);
    }

    #[tokio::test]
    async fn usage_increments_and_appends_event() {
        let ledger = test_ledger().await;
        ledger.register_or_touch(alice()).await.unwrap();

        ledger.record_usage(1001, "dQw4w9WgXcQ").await.unwrap();
        ledger.record_usage(1001, "jNQXAC9IVRw").await.unwrap();

        let rec = ledger.requester(1001).await.unwrap().unwrap();
        assert_eq!(rec.usage_count, 2);

        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.usage_events, 2);
    }

    #[tokio::test]
    async fn absent_record_is_not_banned() {
        let ledger = test_ledger().await;
        assert!(!ledger.is_banned(99999).await.unwrap());
    }

    #[tokio::test]
    async fn ban_toggle() {
        let ledger = test_ledger().await;
        ledger.register_or_touch(alice()).await.unwrap();

        ledger.set_banned(1001, true).await.unwrap();
        assert!(ledger.is_banned(1001).await.unwrap());

        ledger.set_banned(1001, false).await.unwrap();
        assert!(!ledger.is_banned(1001).await.unwrap());
    }

    #[tokio::test]
    async fn gate_flag_is_idempotent() {
        let ledger = test_ledger().await;
        ledger.register_or_touch(alice()).await.unwrap();

        ledger.mark_gate_satisfied(1001).await.unwrap();
        ledger.mark_gate_satisfied(1001).await.unwrap();

        assert!(ledger.requester(1001).await.unwrap().unwrap().gate_satisfied);
    }

    #[tokio::test]
    async fn empty_ledger_stats() {
        let ledger = test_ledger().await;
        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.requesters, 0);
        assert_eq!(stats.usage_events, 0);
    }
}
