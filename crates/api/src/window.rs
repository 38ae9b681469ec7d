// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Submission window access.
//!
//! A month without a window document is `NotConfigured`, which is distinct
//! from a locked window.

use shiftdesk::{Document, WriteBatch, WriteOp};
use shiftdesk_domain::{Capability, DocPath, MonthKey, ShiftWindow, WindowState};
use shiftdesk_persistence::{CommitReceipt, DocumentChange, DocumentStore};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;

/// Reads submission windows, once or continuously.
#[derive(Clone)]
pub struct ShiftWindowGate {
    store: Arc<dyn DocumentStore>,
}

impl ShiftWindowGate {
    /// Creates a gate over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Reads the current window for `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the window document is malformed.
    pub async fn refresh(&self, month: MonthKey) -> Result<WindowState, ApiError> {
        let path: DocPath = DocPath::submit_window(month)?;
        let document: Option<Document> = self.store.get(&path).await?;
        window_state(document.as_ref())
    }

    /// Stores the window for `month`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if `actor` may not manage windows, the window's range
    /// is inverted, or the write fails.
    pub async fn configure(
        &self,
        month: MonthKey,
        window: ShiftWindow,
        actor: &AuthenticatedActor,
    ) -> Result<WindowState, ApiError> {
        AuthorizationService::authorize(actor, Capability::ManageSubmitWindow, "configure_window")?;
        window.validate()?;
        let path: DocPath = DocPath::submit_window(month)?;
        let data: serde_json::Value = serde_json::to_value(&window).map_err(|err| ApiError::InvalidInput {
            field: String::from("window"),
            message: err.to_string(),
        })?;
        let receipt: CommitReceipt = self
            .store
            .commit(WriteBatch::new().write(WriteOp::Set { path, data }))
            .await?;
        info!(
            %month,
            locked = window.locked,
            actor = %actor.id,
            version = receipt.version,
            "Configured submission window"
        );
        Ok(WindowState::Configured(window))
    }

    /// Keeps a window state current for `month` until the watch is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial read fails.
    pub async fn watch(&self, month: MonthKey) -> Result<WindowWatch, ApiError> {
        let path: DocPath = DocPath::submit_window(month)?;
        // Subscribe before the first read so no change falls between them.
        let mut changes: broadcast::Receiver<DocumentChange> = self.store.subscribe();
        let initial: WindowState = self.refresh(month).await?;
        let (tx, rx) = watch::channel(initial);
        let store: Arc<dyn DocumentStore> = Arc::clone(&self.store);

        let task: JoinHandle<()> = tokio::spawn(async move {
            loop {
                let next: Result<WindowState, ApiError> = match changes.recv().await {
                    Ok(change) if change.path == path => {
                        let document: Option<Document> = change.data.map(|data| Document {
                            path: change.path,
                            data,
                            version: change.version,
                        });
                        window_state(document.as_ref())
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(%month, skipped, "Window listener lagged; re-reading");
                        match store.get(&path).await {
                            Ok(document) => window_state(document.as_ref()),
                            Err(err) => Err(err.into()),
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                match next {
                    Ok(state) => {
                        if tx.send(state).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%month, error = %err, "Ignoring unreadable window update"),
                }
            }
        });

        Ok(WindowWatch { rx, task })
    }
}

fn window_state(document: Option<&Document>) -> Result<WindowState, ApiError> {
    match document {
        None => Ok(WindowState::NotConfigured),
        Some(document) => {
            let window: ShiftWindow = document.decode()?;
            Ok(WindowState::Configured(window))
        }
    }
}

/// A live view of one month's window.
///
/// The background listener stops when this is dropped.
pub struct WindowWatch {
    rx: watch::Receiver<WindowState>,
    task: JoinHandle<()>,
}

impl WindowWatch {
    /// The latest known state.
    #[must_use]
    pub fn current(&self) -> WindowState {
        self.rx.borrow().clone()
    }

    /// A receiver that observes every update.
    #[must_use]
    pub fn receiver(&self) -> watch::Receiver<WindowState> {
        self.rx.clone()
    }

    /// Waits for the next update and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener has stopped.
    pub async fn changed(&mut self) -> Result<WindowState, ApiError> {
        self.rx.changed().await.map_err(|_| ApiError::Transport {
            message: String::from("window listener stopped"),
        })?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

impl Drop for WindowWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
