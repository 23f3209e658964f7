use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::traits::TransactionStoreError;

pub async fn fetch(conn: &mut SqliteConnection) -> Result<Option<String>, TransactionStoreError> {
    let id: Option<Option<String>> =
        sqlx::query_scalar("SELECT transaction_id FROM sync_checkpoint WHERE id = 1").fetch_optional(conn).await?;
    Ok(id.flatten())
}

pub async fn save(id: &str, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<(), TransactionStoreError> {
    sqlx::query(
        r#"
            INSERT INTO sync_checkpoint (id, transaction_id, saved_at) VALUES (1, $1, $2)
            ON CONFLICT (id) DO UPDATE SET transaction_id = excluded.transaction_id, saved_at = excluded.saved_at
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}
