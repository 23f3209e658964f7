use super::TransactionStoreError;

/// A store-wide mutex that keeps two syncs from interleaving their writes.
#[allow(async_fn_in_trait)]
pub trait SyncLock {
    /// Takes the lock if nobody holds it. Returns `false` if it is already held.
    async fn try_acquire_sync_lock(&self) -> Result<bool, TransactionStoreError>;

    async fn release_sync_lock(&self) -> Result<(), TransactionStoreError>;
}
