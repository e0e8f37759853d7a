//! In-memory report store
//!
//! Backs the server's demo mode and the test suite. Every mutation is
//! broadcast to live subscriptions the same way the hosted backend would.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

use super::{ChangeEvent, ChangeKind, ReportStore, StoreError, StoreResult, Subscription};
use crate::report::{parse_timestamp, Report, ReportId};

const TABLE: &str = "reports";

/// Report store held entirely in process memory
pub struct MemoryStore {
    reports: RwLock<Vec<Report>>,
    changes: broadcast::Sender<ChangeEvent>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_reports(Vec::new())
    }

    /// Store pre-populated with `reports`
    pub fn with_reports(reports: Vec<Report>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            reports: RwLock::new(reports),
            changes,
            offline: AtomicBool::new(false),
        }
    }

    /// Store seeded with a handful of sample incidents relative to now
    pub fn demo() -> Self {
        let now = Utc::now();
        let ago = |hours: i64| (now - chrono::Duration::hours(hours)).to_rfc3339();

        Self::with_reports(vec![
            Report::new(1, "123 Main St", "Burst Pipe")
                .created_at(ago(1))
                .district("District A")
                .description("Severe water burst"),
            Report::new(2, "456 Park Ave", "Minor Leak")
                .created_at(ago(3))
                .district("District B")
                .description("Dripping tap")
                .resolved(true),
            Report::new(3, "78 Harbour Rd", "Broken Valve")
                .created_at(ago(20))
                .district("District C"),
            Report::new(4, "9 Elm Close", "Small Leak")
                .created_at(ago(30))
                .district("District A"),
            Report::new(5, "310 Station St", "Moderate Leak")
                .created_at(ago(52))
                .district("District B")
                .description("Water pooling at kerb"),
            Report::new(6, "15 Quarry Lane", "Burst Pipe")
                .created_at(ago(80))
                .district("District C")
                .resolved(true),
        ])
    }

    /// Add a report and notify subscribers
    pub async fn insert(&self, report: Report) {
        self.reports.write().await.push(report);
        self.notify(ChangeKind::Insert);
    }

    /// Remove a report and notify subscribers
    pub async fn remove(&self, id: &ReportId) -> StoreResult<Report> {
        let mut reports = self.reports.write().await;
        let pos = reports
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let removed = reports.remove(pos);
        drop(reports);

        self.notify(ChangeKind::Delete);
        Ok(removed)
    }

    /// Simulate the backend going away; every call fails until restored
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of live change feeds
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn notify(&self, kind: ChangeKind) {
        // No receivers is fine
        let _ = self.changes.send(ChangeEvent::new(kind, TABLE));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_reports(&self) -> StoreResult<Vec<Report>> {
        self.check_online()?;

        let mut reports = self.reports.read().await.clone();
        // Newest first; unparseable timestamps sort last
        reports.sort_by(|a, b| {
            let ta = a.created_at.as_deref().and_then(parse_timestamp);
            let tb = b.created_at.as_deref().and_then(parse_timestamp);
            tb.cmp(&ta)
        });
        Ok(reports)
    }

    async fn mark_resolved(&self, id: &ReportId) -> StoreResult<()> {
        self.check_online()?;

        let mut reports = self.reports.write().await;
        let report = reports
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        report.resolved = true;
        drop(reports);

        self.notify(ChangeKind::Update);
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        self.check_online()?;

        let mut changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    change = changes.recv() => match change {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // A single notification is enough to trigger a re-fetch
                            tracing::debug!(skipped, "Change feed lagged");
                            if tx.send(ChangeEvent::new(ChangeKind::Unknown, TABLE)).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(Subscription::new(rx, stop_tx, task))
    }
}
