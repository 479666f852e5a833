//! Workspace removal events
//!
//! In-process removal event stream in front of the cleanup handlers. The
//! platform guarantees at-least-once delivery per permanently removed
//! workspace, so every handler must tolerate duplicates. Dispatch is
//! concurrent across events and failures are isolated per event: one
//! workspace's failed teardown never blocks another's.

use crate::error::Result;
use crate::metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

// =============================================================================
// Removal Event
// =============================================================================

/// Notification that a workspace has been permanently deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceRemovedEvent {
    /// Id of the removed workspace
    pub workspace_id: String,
    /// When the removal was published
    pub occurred_at: DateTime<Utc>,
}

impl WorkspaceRemovedEvent {
    /// Create an event stamped with the current time
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            occurred_at: Utc::now(),
        }
    }
}

// =============================================================================
// Removal Handler
// =============================================================================

/// Capability implemented by cleanup subscribers
#[async_trait]
pub trait RemovalHandler: Send + Sync {
    /// React to one workspace removal
    async fn handle(&self, event: WorkspaceRemovedEvent) -> Result<()>;

    /// Name used in dispatch logs and metrics labels
    fn name(&self) -> &'static str;
}

pub type RemovalHandlerRef = Arc<dyn RemovalHandler>;

// =============================================================================
// Removal Event Bus
// =============================================================================

/// Broadcast-backed removal event stream
pub struct RemovalEventBus {
    sender: broadcast::Sender<WorkspaceRemovedEvent>,
}

impl RemovalEventBus {
    /// Create a bus buffering up to `capacity` undelivered events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a workspace removal.
    ///
    /// Returns the number of subscriptions the event reached.
    pub fn publish(&self, workspace_id: impl Into<String>) -> usize {
        let event = WorkspaceRemovedEvent::new(workspace_id);
        debug!(workspace = %event.workspace_id, "publishing workspace removal");
        self.sender.send(event).unwrap_or(0)
    }

    /// Register a cleanup handler against the stream.
    ///
    /// Each received event runs in its own task; a handler error is reported
    /// and counted, and the dispatch loop moves on to the next event.
    pub fn subscribe(&self, handler: RemovalHandlerRef) -> JoinHandle<()> {
        let mut receiver = self.sender.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            let workspace_id = event.workspace_id.clone();
                            match handler.handle(event).await {
                                Ok(()) => {
                                    metrics::cleanups()
                                        .with_label_values(&[handler.name()])
                                        .inc();
                                }
                                Err(err) => {
                                    metrics::cleanup_failures()
                                        .with_label_values(&[handler.name()])
                                        .inc();
                                    error!(
                                        handler = handler.name(),
                                        workspace = %workspace_id,
                                        %err,
                                        "workspace cleanup failed"
                                    );
                                }
                            }
                        });
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "removal subscriber lagged, events were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
