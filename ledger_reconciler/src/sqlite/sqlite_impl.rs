//! `SqliteDatabase` is a concrete implementation of a reconciliation backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, sync_checkpoint, sync_lock, transactions};
use crate::{
    db_types::ReconciledTransaction,
    traits::{SyncLock, TransactionStore, TransactionStoreError, UpsertResult},
};

/// How long (in seconds) a sync lock may be held before another process is allowed to break it.
pub const DEFAULT_LOCK_TIMEOUT_SECS: i64 = 3600;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    lock_timeout: Duration,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl TransactionStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn upsert_transaction(
        &self,
        transaction: &ReconciledTransaction,
    ) -> Result<UpsertResult, TransactionStoreError> {
        transaction.validate().map_err(|e| TransactionStoreError::ValidationError {
            id: transaction.id.clone(),
            reason: e.to_string(),
        })?;
        let mut tx = self.pool.begin().await?;
        let result = match transactions::fetch_transaction(&transaction.id, &mut tx).await? {
            None => {
                transactions::insert_transaction(transaction, &mut tx).await?;
                UpsertResult::Inserted
            },
            Some(existing) if existing == *transaction => UpsertResult::Unchanged,
            Some(_) => {
                transactions::update_transaction(transaction, &mut tx).await?;
                UpsertResult::Updated
            },
        };
        tx.commit().await?;
        trace!("🗃️ Transaction {} {result}", transaction.id);
        Ok(result)
    }

    async fn fetch_transaction(&self, id: &str) -> Result<Option<ReconciledTransaction>, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction(id, &mut conn).await
    }

    async fn fetch_unpaired_sells(&self) -> Result<Vec<ReconciledTransaction>, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_unpaired_sells(&mut conn).await
    }

    async fn latest_transaction_id(&self) -> Result<Option<String>, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::latest_transaction_id(&mut conn).await
    }

    async fn ledger_entry_count(&self) -> Result<u64, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::ledger_entry_count(&mut conn).await
    }

    async fn sync_checkpoint(&self) -> Result<Option<String>, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        sync_checkpoint::fetch(&mut conn).await
    }

    async fn save_sync_checkpoint(&self, id: &str) -> Result<(), TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        sync_checkpoint::save(id, Utc::now(), &mut conn).await?;
        debug!("🗃️ Sync checkpoint moved to {id}");
        Ok(())
    }
}

impl SyncLock for SqliteDatabase {
    async fn try_acquire_sync_lock(&self) -> Result<bool, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        let now = Utc::now();
        let acquired = sync_lock::try_acquire(now, now - self.lock_timeout, &mut conn).await?;
        if acquired {
            debug!("🗃️ Sync lock acquired");
        } else {
            debug!("🗃️ Sync lock is held by another process");
        }
        Ok(acquired)
    }

    async fn release_sync_lock(&self) -> Result<(), TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        sync_lock::release(&mut conn).await?;
        debug!("🗃️ Sync lock released");
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, lock_timeout: Duration::seconds(DEFAULT_LOCK_TIMEOUT_SECS) })
    }

    /// Sets how long a sync lock may be held before it is considered abandoned.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn is_sync_locked(&self) -> Result<bool, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        sync_lock::is_locked(&mut conn).await
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}
