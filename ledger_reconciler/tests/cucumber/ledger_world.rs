use cucumber::{gherkin::Step, World};
use ledger_reconciler::{
    db_types::{ReconciledTransaction, WireEntry},
    grouper::{EntryGrouper, GroupedPage},
    test_utils::{
        entries::{buy, entry, refund, reward, sell},
        prepare_env::{prepare_test_env, random_db_path},
        ScriptedLedger,
    },
    RetryPolicy,
    SqliteDatabase,
    SyncFlowApi,
    SyncOptions,
    SyncReport,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub grouper: Option<EntryGrouper>,
    pub last_page: Option<GroupedPage>,
    pub emitted: Vec<ReconciledTransaction>,
    pub orphaned: Vec<String>,
    pub system: Option<SyncSystem>,
}

impl LedgerWorld {
    pub fn grouper(&mut self) -> &mut EntryGrouper {
        self.grouper.as_mut().expect("Entry grouper not initialised")
    }

    pub fn system(&mut self) -> &mut SyncSystem {
        self.system.as_mut().expect("Sync system not initialised")
    }

    pub fn emitted(&self, id: &str) -> &ReconciledTransaction {
        self.emitted
            .iter()
            .find(|t| t.id == id)
            .unwrap_or_else(|| panic!("Transaction {id} was not emitted. Emitted: {:?}", self.emitted))
    }
}

#[derive(Debug)]
pub struct SyncSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub ledger: ScriptedLedger,
    pub api: SyncFlowApi<ScriptedLedger, SqliteDatabase>,
    pub last_report: Option<SyncReport>,
}

impl SyncSystem {
    pub async fn new(initial_page_size: u32, incremental_page_size: u32) -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("🚀️ Created database: {db_path}");
        let ledger = ScriptedLedger::default();
        let options = SyncOptions {
            initial_page_size,
            incremental_page_size,
            retry: RetryPolicy::new(3, 1, 5, 0.0),
            ..Default::default()
        };
        let api = SyncFlowApi::new(ledger.clone(), db.clone(), options, Default::default());
        Self { db_path, db, ledger, api, last_report: None }
    }

    pub fn report(&self) -> &SyncReport {
        self.last_report.as_ref().expect("No sync has been run")
    }
}

/// Reads a gherkin table with the columns `id | kind | amount | running_balance | minute` and the optional columns
/// `posted_amount` and `status`. Rows are returned in table order.
pub fn entries_from_table(step: &Step) -> Vec<WireEntry> {
    let table = step.table.as_ref().expect("Step has no table");
    let header = &table.rows[0];
    let column = |row: &Vec<String>, name: &str| -> Option<String> {
        header.iter().position(|h| h == name).map(|i| row[i].trim().to_string())
    };
    table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let id = column(row, "id").expect("id column is required");
            let kind = column(row, "kind").expect("kind column is required");
            let amount = column(row, "amount").expect("amount column is required");
            let balance = column(row, "running_balance").expect("running_balance column is required");
            let minute = column(row, "minute").expect("minute column is required").parse::<i64>().expect("bad minute");
            let mut wire = match kind.as_str() {
                "sell" => sell(&id, &amount, &balance, minute),
                "buy" => buy(&id, &amount, &balance, minute),
                "reward" => reward(&id, &amount, &balance, minute),
                "refund" => refund(&id, &amount, &balance, minute),
                "malformed" => {
                    let mut e = entry(&id, "sell_order", None, &amount, &amount, &balance, minute);
                    e.reference = None;
                    e
                },
                other => panic!("Unknown entry kind: {other}"),
            };
            if let Some(posted) = column(row, "posted_amount").filter(|p| !p.is_empty()) {
                wire.posted_amount = posted;
            }
            if let Some(status) = column(row, "status").filter(|s| !s.is_empty()) {
                wire.status = status;
            }
            wire
        })
        .collect()
}
