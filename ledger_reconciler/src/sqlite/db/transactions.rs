use sqlx::SqliteConnection;

use crate::{db_types::ReconciledTransaction, traits::TransactionStoreError};

pub async fn fetch_transaction(
    id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ReconciledTransaction>, TransactionStoreError> {
    let tx = sqlx::query_as("SELECT * FROM ledger_transactions WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(tx)
}

pub async fn insert_transaction(
    tx: &ReconciledTransaction,
    conn: &mut SqliteConnection,
) -> Result<(), TransactionStoreError> {
    sqlx::query(
        r#"
            INSERT INTO ledger_transactions (
                id, account, transaction_type, status, amount, reward_amount, posted_amount, running_balance,
                order_id, reward_id, transaction_date, sell_transaction_date, balance_before_reward, unpaired
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(&tx.id)
    .bind(&tx.account)
    .bind(tx.transaction_type)
    .bind(&tx.status)
    .bind(tx.amount)
    .bind(tx.reward_amount)
    .bind(tx.posted_amount)
    .bind(tx.running_balance)
    .bind(&tx.order_id)
    .bind(&tx.reward_id)
    .bind(tx.transaction_date)
    .bind(tx.sell_transaction_date)
    .bind(tx.balance_before_reward)
    .bind(tx.unpaired)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update_transaction(
    tx: &ReconciledTransaction,
    conn: &mut SqliteConnection,
) -> Result<(), TransactionStoreError> {
    let result = sqlx::query(
        r#"
            UPDATE ledger_transactions SET
                account = $2,
                transaction_type = $3,
                status = $4,
                amount = $5,
                reward_amount = $6,
                posted_amount = $7,
                running_balance = $8,
                order_id = $9,
                reward_id = $10,
                transaction_date = $11,
                sell_transaction_date = $12,
                balance_before_reward = $13,
                unpaired = $14,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
        "#,
    )
    .bind(&tx.id)
    .bind(&tx.account)
    .bind(tx.transaction_type)
    .bind(&tx.status)
    .bind(tx.amount)
    .bind(tx.reward_amount)
    .bind(tx.posted_amount)
    .bind(tx.running_balance)
    .bind(&tx.order_id)
    .bind(&tx.reward_id)
    .bind(tx.transaction_date)
    .bind(tx.sell_transaction_date)
    .bind(tx.balance_before_reward)
    .bind(tx.unpaired)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(TransactionStoreError::DatabaseError(format!("Transaction {} does not exist", tx.id)));
    }
    Ok(())
}

pub async fn fetch_unpaired_sells(
    conn: &mut SqliteConnection,
) -> Result<Vec<ReconciledTransaction>, TransactionStoreError> {
    let sells = sqlx::query_as(
        "SELECT * FROM ledger_transactions WHERE transaction_type = 'sell' AND unpaired = TRUE ORDER BY \
         transaction_date ASC, id ASC",
    )
    .fetch_all(conn)
    .await?;
    Ok(sells)
}

/// The latest transaction, dated by the sell entry for sells.
pub async fn latest_transaction_id(conn: &mut SqliteConnection) -> Result<Option<String>, TransactionStoreError> {
    let id = sqlx::query_scalar(
        "SELECT id FROM ledger_transactions ORDER BY COALESCE(sell_transaction_date, transaction_date) DESC, id DESC \
         LIMIT 1",
    )
    .fetch_optional(conn)
    .await?;
    Ok(id)
}

/// Paired sells were built from two ledger entries; everything else from one.
pub async fn ledger_entry_count(conn: &mut SqliteConnection) -> Result<u64, TransactionStoreError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(CASE WHEN transaction_type = 'sell' AND unpaired = FALSE THEN 2 ELSE 1 END), 0) FROM \
         ledger_transactions",
    )
    .fetch_one(conn)
    .await?;
    Ok(count.max(0) as u64)
}
