// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live document change streaming.
//!
//! Every committed write is forwarded to connected WebSocket clients as a
//! notification. Notifications are informational only: clients re-read the
//! documents they care about over HTTP.
//!
//! # Architecture
//!
//! - Each connection subscribes to the store's change feed on connect
//! - A `collection` query parameter narrows the stream to one collection
//! - No commands are accepted over the socket
//! - A client that falls behind receives a `lagged` event and should resync

use axum::{
    extract::{
        Query, State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shiftdesk_persistence::{DocumentChange, DocumentStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Live event types sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Connection confirmation (sent on initial connect).
    Connected {
        /// Server timestamp (RFC 3339).
        timestamp: String,
        /// The collection filter in effect, if any.
        collection: Option<String>,
    },
    /// A document was written or deleted.
    DocumentChanged {
        /// The document path.
        path: String,
        /// The commit version.
        version: u64,
        /// The body after the write; absent for a deletion.
        data: Option<Value>,
    },
    /// Notifications were dropped because the client fell behind.
    Lagged {
        /// How many notifications were skipped.
        skipped: u64,
    },
}

impl From<DocumentChange> for LiveEvent {
    fn from(change: DocumentChange) -> Self {
        Self::DocumentChanged {
            path: change.path.to_string(),
            version: change.version,
            data: change.data,
        }
    }
}

/// Query parameters of the live endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveQuery {
    /// Only forward changes in this collection.
    pub collection: Option<String>,
}

/// Source of live change notifications.
#[derive(Clone)]
pub struct LiveFeed {
    store: Arc<dyn DocumentStore>,
}

impl LiveFeed {
    /// Creates a feed over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.store.subscribe()
    }
}

/// Handles WebSocket upgrade requests for live change streaming.
///
/// # Arguments
///
/// * `ws` - WebSocket upgrade request
/// * `query` - Optional collection filter
/// * `feed` - The live feed from application state
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<LiveQuery>,
    AxumState(feed): AxumState<LiveFeed>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, feed, query.collection))
}

fn forwards(change: &DocumentChange, collection: Option<&str>) -> bool {
    collection.is_none_or(|collection| change.in_collection(collection))
}

async fn handle_socket(socket: WebSocket, feed: LiveFeed, collection: Option<String>) {
    info!(collection = ?collection, "Client connected to live change stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<DocumentChange> = feed.subscribe();

    let connected_event: LiveEvent = LiveEvent::Connected {
        timestamp: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| String::from("unknown")),
        collection: collection.clone(),
    };

    if let Ok(json) = serde_json::to_string(&connected_event)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let event: LiveEvent = match rx.recv().await {
                Ok(change) if forwards(&change, collection.as_deref()) => change.into(),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live client lagged behind the change feed");
                    LiveEvent::Lagged { skipped }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize live event");
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live change stream");
}
