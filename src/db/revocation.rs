//! Revocation markers for bearer tokens.
//!
//! Logout writes a presence marker keyed by `jti`; the guard rejects any
//! token whose `jti` has a live marker, regardless of the token's own
//! expiry. Markers carry a fixed TTL independent of the revoked token's
//! remaining lifetime and are swept by the cleanup scheduler.

use sqlx::sqlite::SqlitePool;
use std::time::Duration;

use crate::jwt::unix_now;

/// Store for revoked token markers.
pub struct RevocationStore {
    pool: SqlitePool,
}

impl RevocationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a marker for `jti` lasting `ttl` from now.
    ///
    /// Idempotent: re-adding an already-present `jti` refreshes the marker.
    pub async fn add(&self, jti: &str, ttl: Duration) -> Result<(), sqlx::Error> {
        let expires_at = now_secs()? + ttl.as_secs() as i64;

        sqlx::query("INSERT OR REPLACE INTO revoked_tokens (jti, expires_at) VALUES (?, ?)")
            .bind(jti)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// True iff a non-expired marker exists for `jti`.
    pub async fn contains(&self, jti: &str) -> Result<bool, sqlx::Error> {
        let now = now_secs()?;

        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM revoked_tokens WHERE jti = ? AND expires_at > ?")
                .bind(jti)
                .bind(now)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Delete all lapsed markers. Returns the number removed.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let now = now_secs()?;

        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn now_secs() -> Result<i64, sqlx::Error> {
    unix_now()
        .map(|n| n as i64)
        .map_err(|e| sqlx::Error::Protocol(e.to_string()))
}
