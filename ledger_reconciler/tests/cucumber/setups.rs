use cucumber::given;
use ledger_reconciler::grouper::{EntryGrouper, GrouperConfig};

use crate::cucumber::{ledger_world::SyncSystem, LedgerWorld};

#[given("a fresh entry grouper")]
async fn fresh_grouper(world: &mut LedgerWorld) {
    world.grouper = Some(EntryGrouper::default());
}

#[given(expr = "an entry grouper that gives up on a sell after {int} pages")]
async fn grouper_with_limit(world: &mut LedgerWorld, max_deferrals: u32) {
    world.grouper = Some(EntryGrouper::new(GrouperConfig { max_deferrals: Some(max_deferrals) }));
}

#[given(expr = "an empty store that syncs {int} entries per page at first and {int} after that")]
async fn fresh_system(world: &mut LedgerWorld, initial: u32, incremental: u32) {
    world.system = Some(SyncSystem::new(initial, incremental).await);
}
