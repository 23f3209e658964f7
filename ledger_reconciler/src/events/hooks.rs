use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, SyncCompletedEvent, TransactionSyncedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub transaction_synced_producer: Vec<EventProducer<TransactionSyncedEvent>>,
    pub sync_completed_producer: Vec<EventProducer<SyncCompletedEvent>>,
}

pub struct EventHandlers {
    pub on_transaction_synced: Option<EventHandler<TransactionSyncedEvent>>,
    pub on_sync_completed: Option<EventHandler<SyncCompletedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_transaction_synced = hooks.on_transaction_synced.map(|f| EventHandler::new(buffer_size, f));
        let on_sync_completed = hooks.on_sync_completed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_transaction_synced, on_sync_completed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_transaction_synced {
            result.transaction_synced_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_sync_completed {
            result.sync_completed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_transaction_synced {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_sync_completed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_transaction_synced: Option<Handler<TransactionSyncedEvent>>,
    pub on_sync_completed: Option<Handler<SyncCompletedEvent>>,
}

impl EventHooks {
    pub fn on_transaction_synced<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TransactionSyncedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_transaction_synced = Some(Arc::new(f));
        self
    }

    pub fn on_sync_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SyncCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_sync_completed = Some(Arc::new(f));
        self
    }
}
