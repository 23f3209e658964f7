use coins_api::CoinsApi;
use ledger_reconciler::{
    events::{EventHandlers, EventHooks, SyncCompletedEvent, TransactionSyncedEvent},
    SqliteDatabase,
    SyncFlowApi,
};
use log::*;

use crate::{
    config::SyncServerConfig,
    errors::SyncServerError,
    integrations::coins::CoinsLedger,
    sync_worker::{run_sync, start_sync_worker, LedgerSyncApi},
};

const EVENT_BUFFER_SIZE: usize = 100;

pub async fn run_service(config: SyncServerConfig) -> Result<(), SyncServerError> {
    if !config.coins_config.has_credentials() {
        return Err(SyncServerError::ConfigurationError(
            "COINS_API_KEY and COINS_API_SECRET must both be set".to_string(),
        ));
    }
    let db = SqliteDatabase::new_with_url(&config.database_url, 5)
        .await
        .map_err(|e| SyncServerError::InitializeError(e.to_string()))?
        .with_lock_timeout(config.lock_timeout);
    db.migrate().await.map_err(|e| SyncServerError::DatabaseError(e.to_string()))?;
    let api = create_sync_api(&config, db).await?;
    if config.run_once {
        run_sync(&api).await?;
        return Ok(());
    }
    let mut worker = start_sync_worker(api, config.sync_interval);
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("🚀️ Shutting down");
            worker.abort();
            Ok(())
        },
        res = &mut worker => res.map_err(|e| SyncServerError::Unspecified(e.to_string())),
    }
}

pub async fn create_sync_api(config: &SyncServerConfig, db: SqliteDatabase) -> Result<LedgerSyncApi, SyncServerError> {
    let source = CoinsLedger::new(CoinsApi::new(config.coins_config.clone())?);
    let handlers = create_logging_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    Ok(SyncFlowApi::new(source, db, config.sync_options.clone(), producers))
}

/// Delivering notifications is out of scope, so the hooks just log what happened.
pub fn create_logging_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_transaction_synced(|ev: TransactionSyncedEvent| {
        Box::pin(async move {
            let tx = ev.transaction;
            debug!(
                "📬️ {} {} {}. Order: {}. Amount: {}",
                ev.change,
                tx.transaction_type,
                tx.id,
                tx.order_id.as_deref().unwrap_or("none"),
                tx.amount
            );
        })
    });
    hooks.on_sync_completed(|ev: SyncCompletedEvent| {
        Box::pin(async move {
            debug!("📬️ Sync completed: {}", ev.report);
        })
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}
