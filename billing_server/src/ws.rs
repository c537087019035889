//! The live transaction stream.
//!
//! `GET /ws/transactions` upgrades the connection and subscribes it to the caller's own user id
//! in the subscriber registry. The stream carries server-to-client JSON frames only; the only
//! client input that matters is ping and close. Every exit path unsubscribes the connection.
use actix_web::{rt, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use billing_engine::{events::TransactionNotification, notify::SubscriberRegistry};
use futures::StreamExt;
use log::*;
use tokio::sync::mpsc;

use crate::{auth::JwtClaims, errors::ServerError};

pub async fn transaction_stream(
    req: HttpRequest,
    stream: web::Payload,
    claims: JwtClaims,
    registry: web::Data<SubscriberRegistry>,
) -> Result<HttpResponse, ServerError> {
    let (response, session, msg_stream) = actix_ws::handle(&req, stream)
        .map_err(|e| ServerError::Unspecified(format!("Could not establish websocket connection. {e}")))?;
    // The stream is bound to the authenticated user. There is deliberately no way to ask for
    // somebody else's events.
    let user_id = claims.user_id;
    let registry = registry.into_inner();
    let (conn_id, receiver) = registry.subscribe(user_id);
    rt::spawn(async move {
        stream_events(session, msg_stream, receiver).await;
        registry.unsubscribe(user_id, conn_id);
    });
    Ok(response)
}

async fn stream_events(
    mut session: Session,
    mut msg_stream: MessageStream,
    mut receiver: mpsc::Receiver<TransactionNotification>,
) {
    loop {
        tokio::select! {
            notification = receiver.recv() => {
                let Some(notification) = notification else { break };
                match serde_json::to_string(&notification) {
                    Ok(frame) => {
                        if session.text(frame).await.is_err() {
                            break;
                        }
                    },
                    Err(e) => warn!("📣️ Could not serialize a transaction notification. {e}"),
                }
            },
            msg = msg_stream.next() => {
                match msg {
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    },
                    Some(Ok(Message::Close(reason))) => {
                        debug!("📣️ Client closed the transaction stream. {reason:?}");
                        break;
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        debug!("📣️ WebSocket protocol error on the transaction stream. {e}");
                        break;
                    },
                    None => break,
                }
            },
        }
    }
    let _ = session.close(None).await;
}
