//! End-to-end checks for the live transaction stream, over a real server and a real websocket
//! client. The engine is not involved; events are pushed straight into the registry.
use std::{sync::Arc, time::Duration};

use actix_web::{web, App};
use awc::ws::{Frame, Message};
use billing_common::Money;
use billing_engine::{
    db_types::TransactionStatus,
    events::TransactionNotification,
    notify::SubscriberRegistry,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};

use super::helpers::{get_auth_config, issue_token};
use crate::{
    auth::{JwtClaims, TokenVerifier},
    ws::transaction_stream,
};

fn start_ws_server(registry: Arc<SubscriberRegistry>) -> actix_test::TestServer {
    actix_test::start(move || {
        App::new()
            .app_data(web::Data::new(TokenVerifier::new(&get_auth_config())))
            .app_data(web::Data::from(Arc::clone(&registry)))
            .service(web::resource("/ws/transactions").route(web::get().to(transaction_stream)))
    })
}

/// Registry bookkeeping happens on the server's own tasks, so give it a moment.
async fn wait_for(mut cond: impl FnMut() -> bool, what: &str) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Timed out waiting for {what}");
}

fn notification(status: TransactionStatus) -> TransactionNotification {
    TransactionNotification {
        transaction_id: 1,
        invoice_id: 10,
        amount: Money::from_cents(3000),
        status,
        transaction_date: Utc::now(),
    }
}

#[actix_web::test]
async fn the_stream_is_bound_to_the_tokens_user() {
    let _ = env_logger::try_init();
    let registry = Arc::new(SubscriberRegistry::new(8));
    let mut srv = start_ws_server(Arc::clone(&registry));

    let token = issue_token(JwtClaims { user_id: 5, is_staff: false });
    let mut conn = srv.ws_at(&format!("/ws/transactions?token={token}")).await.expect("websocket upgrade failed");

    // The subscription lands on the user id inside the token, nowhere else
    wait_for(|| registry.subscriber_count(5) == 1, "the subscription to register").await;
    assert_eq!(registry.connection_count(), 1);
    assert_eq!(registry.subscriber_count(6), 0);

    assert_eq!(registry.publish(5, notification(TransactionStatus::Pending)), 1);
    let frame = conn.next().await.expect("stream ended early").expect("websocket error");
    let Frame::Text(payload) = frame else { panic!("Expected a text frame, got {frame:?}") };
    let payload: serde_json::Value = serde_json::from_slice(&payload).expect("frame was not JSON");
    assert_eq!(payload["transaction_id"], 1);
    assert_eq!(payload["invoice_id"], 10);
    assert_eq!(payload["amount"], "30.00");
    assert_eq!(payload["status"], "PENDING");

    // Closing the socket reaps the registry entry
    conn.send(Message::Close(None)).await.expect("close failed");
    wait_for(|| registry.connection_count() == 0, "the connection to be reaped").await;
}

#[actix_web::test]
async fn the_stream_rejects_missing_and_bad_tokens() {
    let _ = env_logger::try_init();
    let registry = Arc::new(SubscriberRegistry::new(8));
    let mut srv = start_ws_server(Arc::clone(&registry));

    let err = srv.ws_at("/ws/transactions").await.err().expect("upgrade without a token must fail");
    let err = format!("{err:?}");
    assert!(err.contains("401"), "expected a 401 rejection, got {err}");

    let err = srv.ws_at("/ws/transactions?token=garbage").await.err().expect("upgrade with garbage must fail");
    let err = format!("{err:?}");
    assert!(err.contains("400") || err.contains("401"), "expected a rejection, got {err}");

    assert_eq!(registry.connection_count(), 0);
}
