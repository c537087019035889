use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, TransactionEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub transaction_changed_producer: Vec<EventProducer<TransactionEvent>>,
}

pub struct EventHandlers {
    pub on_transaction_changed: Option<EventHandler<TransactionEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_transaction_changed = hooks.on_transaction_changed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_transaction_changed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_transaction_changed {
            result.transaction_changed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_transaction_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_transaction_changed: Option<Handler<TransactionEvent>>,
}

impl EventHooks {
    pub fn on_transaction_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TransactionEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_transaction_changed = Some(Arc::new(f));
        self
    }
}
