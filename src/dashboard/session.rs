//! Background dashboard session
//!
//! One task per process drives the dashboard: initial load, a single change
//! subscription with re-fetch on every notification, the periodic clock
//! tick, and release of the subscription on shutdown.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::controller::DashboardController;
use crate::store::{ChangeEvent, Subscription};

/// Timing for the session loop
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Clock refresh period
    pub tick_period: Duration,
    /// Wait before re-subscribing after the feed ends or fails to open
    pub resubscribe_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(60),
            resubscribe_delay: Duration::from_secs(5),
        }
    }
}

pub struct DashboardSession {
    controller: Arc<DashboardController>,
    config: SessionConfig,
}

/// Running session; stop it with [`SessionHandle::shutdown`]
pub struct SessionHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Signal the session to stop and wait until its subscription is released
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Dashboard session ended abnormally");
        }
    }
}

impl DashboardSession {
    pub fn new(controller: Arc<DashboardController>, config: SessionConfig) -> Self {
        Self { controller, config }
    }

    pub fn spawn(self) -> SessionHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        SessionHandle { shutdown, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let store_name = self.controller.store().name().to_string();
        tracing::info!(store = %store_name, "Dashboard session started");

        let mut ticker = tokio::time::interval_at(
            Instant::now() + self.config.tick_period,
            self.config.tick_period,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut subscription: Option<Subscription> = None;
        let mut retry_at = Instant::now();
        let mut first_attempt = true;

        loop {
            if subscription.is_none() && Instant::now() >= retry_at {
                let opened = tokio::select! {
                    result = self.controller.store().subscribe() => result,
                    _ = shutdown.changed() => break,
                };

                match opened {
                    Ok(sub) => {
                        tracing::info!(store = %store_name, "Subscribed to report changes");
                        subscription = Some(sub);
                        // Changes made while no feed was open were never announced
                        self.resync().await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            retry_in = ?self.config.resubscribe_delay,
                            "Change subscription failed"
                        );
                        retry_at = Instant::now() + self.config.resubscribe_delay;
                        if first_attempt {
                            // Show what the store has, or its error, without waiting for the feed
                            self.resync().await;
                        }
                    }
                }
                first_attempt = false;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => self.controller.tick().await,
                event = next_event(&mut subscription) => match event {
                    Some(event) => {
                        tracing::debug!(kind = ?event.kind, table = %event.table, "Report change received");
                        // Failures are recorded on the dashboard
                        let _ = self.controller.refresh().await;
                    }
                    None => {
                        tracing::warn!("Change feed ended, will re-subscribe");
                        if let Some(sub) = subscription.take() {
                            sub.unsubscribe().await;
                        }
                        retry_at = Instant::now() + self.config.resubscribe_delay;
                    }
                },
                _ = tokio::time::sleep_until(retry_at), if subscription.is_none() => {}
            }
        }

        if let Some(sub) = subscription.take() {
            sub.unsubscribe().await;
        }
        tracing::info!("Dashboard session stopped");
    }

    /// Full re-read of the store
    async fn resync(&self) {
        if let Ok(outcome) = self.controller.refresh().await {
            tracing::info!(count = outcome.count, "Reports resynchronized");
        }
    }
}

/// Next event from the live feed; pends forever when there is none
async fn next_event(subscription: &mut Option<Subscription>) -> Option<ChangeEvent> {
    match subscription {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}
