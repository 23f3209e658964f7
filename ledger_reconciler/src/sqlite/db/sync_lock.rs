use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::traits::TransactionStoreError;

/// Takes the lock if it is free or if the current holder took it before `stale_before`. Returns whether the lock was
/// taken.
pub async fn try_acquire(
    now: DateTime<Utc>,
    stale_before: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, TransactionStoreError> {
    let result = sqlx::query(
        r#"
            UPDATE sync_lock SET locked = TRUE, acquired_at = $1
            WHERE id = 1 AND (locked = FALSE OR acquired_at IS NULL OR acquired_at < $2)
        "#,
    )
    .bind(now)
    .bind(stale_before)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn release(conn: &mut SqliteConnection) -> Result<(), TransactionStoreError> {
    sqlx::query("UPDATE sync_lock SET locked = FALSE, acquired_at = NULL WHERE id = 1").execute(conn).await?;
    Ok(())
}

pub async fn is_locked(conn: &mut SqliteConnection) -> Result<bool, TransactionStoreError> {
    let locked: Option<bool> = sqlx::query_scalar("SELECT locked FROM sync_lock WHERE id = 1").fetch_optional(conn).await?;
    Ok(locked.unwrap_or(false))
}
