//! Subscription registry for the notification fan-out.
//!
//! Tracks which live connections are listening to which user's transaction stream. The registry
//! is shared between the connection lifecycle (subscribe on join, unsubscribe on disconnect) and
//! the fan-out hook running inside transaction-write requests, so all bookkeeping goes through a
//! concurrent map with per-user buckets.
//!
//! Delivery is fire-and-forget. A full channel drops the event for that connection only; a
//! closed channel gets the connection reaped on the spot. Nothing is queued or replayed.
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use log::*;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::events::TransactionNotification;

pub type ConnectionId = u64;

struct Subscriber {
    conn_id: ConnectionId,
    sender: mpsc::Sender<TransactionNotification>,
}

pub struct SubscriberRegistry {
    subscribers: DashMap<i64, Vec<Subscriber>>,
    next_conn_id: AtomicU64,
    buffer_size: usize,
}

impl SubscriberRegistry {
    /// `buffer_size` bounds the per-connection delivery channel. A connection that falls this
    /// far behind starts losing events rather than blocking the publisher.
    pub fn new(buffer_size: usize) -> Self {
        Self { subscribers: DashMap::new(), next_conn_id: AtomicU64::new(1), buffer_size }
    }

    /// Registers a new connection under `user_id` and returns the receiving half of its
    /// delivery channel. A user may hold any number of concurrent connections.
    pub fn subscribe(&self, user_id: i64) -> (ConnectionId, mpsc::Receiver<TransactionNotification>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        self.subscribers.entry(user_id).or_default().push(Subscriber { conn_id, sender });
        debug!("📣️ Connection {conn_id} subscribed to user #{user_id}'s transaction stream");
        (conn_id, receiver)
    }

    /// Removes the connection from the registry. Safe to call more than once; called on every
    /// disconnect path.
    pub fn unsubscribe(&self, user_id: i64, conn_id: ConnectionId) {
        if let Some(mut subs) = self.subscribers.get_mut(&user_id) {
            subs.retain(|sub| sub.conn_id != conn_id);
            let empty = subs.is_empty();
            drop(subs);
            if empty {
                self.subscribers.remove_if(&user_id, |_, subs| subs.is_empty());
            }
        }
        debug!("📣️ Connection {conn_id} unsubscribed from user #{user_id}'s transaction stream");
    }

    /// Delivers the notification to every live connection for `user_id`, independently. Returns
    /// the number of connections the event was handed to. Connections whose channel has closed
    /// are removed immediately.
    pub fn publish(&self, user_id: i64, notification: TransactionNotification) -> usize {
        let mut delivered = 0;
        if let Some(mut subs) = self.subscribers.get_mut(&user_id) {
            subs.retain(|sub| match sub.sender.try_send(notification.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                },
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "📣️ Connection {} for user #{user_id} is not keeping up. Event dropped.",
                        sub.conn_id
                    );
                    true
                },
                Err(TrySendError::Closed(_)) => {
                    debug!("📣️ Connection {} for user #{user_id} is gone. Reaping it.", sub.conn_id);
                    false
                },
            });
            let empty = subs.is_empty();
            drop(subs);
            if empty {
                self.subscribers.remove_if(&user_id, |_, subs| subs.is_empty());
            }
        }
        trace!("📣️ Delivered transaction update to {delivered} connection(s) for user #{user_id}");
        delivered
    }

    /// The number of live connections registered for `user_id`.
    pub fn subscriber_count(&self, user_id: i64) -> usize {
        self.subscribers.get(&user_id).map(|subs| subs.len()).unwrap_or_default()
    }

    /// Total connections across all users.
    pub fn connection_count(&self) -> usize {
        self.subscribers.iter().map(|entry| entry.value().len()).sum()
    }
}
