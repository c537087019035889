use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use billing_engine::{
    events::{EventHandlers, EventHooks, EventProducers, TransactionEvent},
    notify::SubscriberRegistry,
    SqliteDatabase,
    TransactionApi,
};
use futures::future::BoxFuture;
use log::*;

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::{json_payload_config, ServerError},
    routes::{
        health,
        CreateTransactionRoute,
        TransactionByIdRoute,
        TransactionHistoryRoute,
        UpdateTransactionStatusRoute,
    },
    ws::transaction_stream,
};

/// Event channel depth between the engine and the fan-out handler.
const EVENT_BUFFER_SIZE: usize = 100;
/// Per-connection delivery channel depth. A websocket client this far behind loses events.
const SUBSCRIBER_BUFFER_SIZE: usize = 50;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Database at {} is ready", config.database_url);
    let registry = Arc::new(SubscriberRegistry::new(SUBSCRIBER_BUFFER_SIZE));
    let producers = start_notification_fanout(Arc::clone(&registry));
    let srv = create_server_instance(config, db, registry, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Wires the `on_transaction_changed` hook to the subscriber registry and starts the handler
/// task. The returned producers are injected into every `TransactionApi` instance, so each
/// accepted write ends up as a fan-out.
pub fn start_notification_fanout(registry: Arc<SubscriberRegistry>) -> EventProducers {
    let mut hooks = EventHooks::default();
    hooks.on_transaction_changed(move |event: TransactionEvent| {
        let registry = Arc::clone(&registry);
        let fut: BoxFuture<'static, ()> = Box::pin(async move {
            let delivered = registry.publish(event.user_id, event.notification);
            trace!("📣️ Transaction event for user #{} delivered to {delivered} connection(s)", event.user_id);
        });
        fut
    });
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    tokio::spawn(handlers.start_handlers());
    producers
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    registry: Arc<SubscriberRegistry>,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let api = TransactionApi::new(db.clone(), producers.clone());
        let verifier = TokenVerifier::new(&config.auth);
        let api_scope = web::scope("/api")
            .service(CreateTransactionRoute::<SqliteDatabase>::new())
            .service(TransactionHistoryRoute::<SqliteDatabase>::new())
            .service(TransactionByIdRoute::<SqliteDatabase>::new())
            .service(UpdateTransactionStatusRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("billing::access_log"))
            .app_data(json_payload_config())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::from(Arc::clone(&registry)))
            .service(api_scope)
            .service(web::resource("/ws/transactions").route(web::get().to(transaction_stream)))
            .service(health)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
