//! Report Store Client
//!
//! The dashboard never talks to a backend SDK directly. It depends on the
//! [`ReportStore`] trait:
//!
//! - `list_reports` reads every report, newest first
//! - `mark_resolved` updates exactly one record
//! - `subscribe` opens a change feed that only says "something changed";
//!   consumers re-run `list_reports` to resynchronize
//!
//! ## Implementations
//!
//! - [`RestStore`]: PostgREST over HTTP, with a Phoenix-channel realtime feed
//! - [`MemoryStore`]: in-process store for demo mode and tests

mod error;
mod memory;
mod realtime;
mod rest;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use realtime::{RealtimeConfig, RealtimeListener};
pub use rest::{RestStore, RestStoreConfig};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::report::{Report, ReportId};

/// Access to the externally-owned report collection
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Short name for logs and health output
    fn name(&self) -> &str;

    /// All reports ordered by `created_at` descending
    async fn list_reports(&self) -> StoreResult<Vec<Report>>;

    /// Set `resolved = true` on the single report matching `id`
    async fn mark_resolved(&self, id: &ReportId) -> StoreResult<()>;

    /// Open a change feed on the reports collection
    async fn subscribe(&self) -> StoreResult<Subscription>;
}

/// Kind of change reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    Unknown,
}

impl ChangeKind {
    pub fn from_wire(kind: &str) -> Self {
        match kind.to_ascii_uppercase().as_str() {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            _ => ChangeKind::Unknown,
        }
    }
}

/// A change notification. Carries no row data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
        }
    }
}

/// Handle to a live change feed.
///
/// The feed ends (`next` returns `None`) when the backend closes it.
/// `unsubscribe` consumes the handle, so release happens at most once;
/// dropping the handle also stops the listener task.
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a listener task. The task must exit once `stop` fires or is dropped.
    pub fn new(
        events: mpsc::Receiver<ChangeEvent>,
        stop: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// Next change notification, or `None` once the feed has ended
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Release server and client resources and wait for the listener to exit
    pub async fn unsubscribe(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Subscription task ended abnormally");
            }
        }
        tracing::debug!("Subscription released");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Dropping `stop` wakes the listener; it sends its own leave message.
        if self.stop.take().is_some() {
            tracing::debug!("Subscription dropped without unsubscribe");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.stop.is_some())
            .finish()
    }
}
