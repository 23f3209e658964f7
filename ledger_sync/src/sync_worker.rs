use std::time::Duration;

use ledger_reconciler::{LedgerSource, SqliteDatabase, SyncError, SyncFlowApi, SyncLock, SyncReport, TransactionStore};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::coins::CoinsLedger;

pub type LedgerSyncApi = SyncFlowApi<CoinsLedger, SqliteDatabase>;

/// Runs one sync and logs the result.
pub async fn run_sync<S, B>(api: &SyncFlowApi<S, B>) -> Result<SyncReport, SyncError>
where
    S: LedgerSource,
    B: TransactionStore + SyncLock,
{
    info!("🕰️ Running ledger sync");
    match api.sync().await {
        Ok(report) => {
            info!("🕰️ Ledger sync complete. {report}");
            if !report.orphaned_candidates.is_empty() {
                warn!(
                    "🕰️ {} rewards or refunds did not match any sell order: {}",
                    report.orphaned_candidates.len(),
                    report.orphaned_candidates.join(", ")
                );
            }
            if report.failed > 0 {
                error!("🕰️ {} transactions could not be saved. Check the logs above for details.", report.failed);
            }
            Ok(report)
        },
        Err(e) => {
            error!("🕰️ Error running ledger sync: {e}");
            Err(e)
        },
    }
}

/// Starts the sync worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Runs do not overlap: if a sync takes longer than `interval`, the next tick fires as soon as it finishes.
pub fn start_sync_worker(api: LedgerSyncApi, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("🕰️ Ledger sync worker started. Syncing every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            let _ = run_sync(&api).await;
        }
    })
}
