//! Drives the poll-transform-dispatch cycle on a timer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::publisher::PresencePublisher;
use crate::error::PresenceError;
use crate::settings::PresenceConfig;
use crate::steam::ProfileFetcher;

/// What a single cycle ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// An activity was dispatched
    Published,
    /// Nothing is being played; whatever presence was shown stays
    Idle,
    /// Nothing is being played and the previous presence was cleared
    Cleared,
    /// Another cycle was still in flight
    Skipped,
}

pub struct PresenceManager {
    config: Arc<PresenceConfig>,
    fetcher: Arc<dyn ProfileFetcher>,
    publisher: PresencePublisher,
    cycle_lock: Mutex<()>,
    presence_active: AtomicBool,
}

impl PresenceManager {
    pub fn new(
        config: Arc<PresenceConfig>,
        fetcher: Arc<dyn ProfileFetcher>,
        publisher: PresencePublisher,
    ) -> Self {
        Self {
            config,
            fetcher,
            publisher,
            cycle_lock: Mutex::new(()),
            presence_active: AtomicBool::new(false),
        }
    }

    /// Fetch the profile once and publish the result. Only one cycle runs
    /// at a time; a call made while another is in flight returns
    /// [`CycleOutcome::Skipped`] immediately.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, PresenceError> {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            tracing::debug!("Presence cycle already in flight, skipping");
            return Ok(CycleOutcome::Skipped);
        };

        let profile = self.fetcher.fetch_profile(&self.config.steam_id).await?;

        match self.publisher.create_activity(&profile).await? {
            Some(activity) => {
                self.publisher.set_activity(Some(activity));
                self.presence_active.store(true, Ordering::SeqCst);
                Ok(CycleOutcome::Published)
            }
            None if self.config.clear_when_idle && self.clear_presence() => {
                Ok(CycleOutcome::Cleared)
            }
            None => {
                tracing::debug!("No game in progress");
                Ok(CycleOutcome::Idle)
            }
        }
    }

    /// Dispatch an empty activity if one of ours is showing. Returns whether
    /// anything was dispatched.
    pub fn clear_presence(&self) -> bool {
        if !self.presence_active.swap(false, Ordering::SeqCst) {
            return false;
        }

        tracing::debug!("Clearing presence");
        self.publisher.set_activity(None);
        true
    }
}

/// Handle to the running background task
pub struct PresenceTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    manager: Arc<PresenceManager>,
}

impl PresenceTask {
    /// Stop polling. A cycle that is still in flight is abandoned before it
    /// can dispatch.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.handle.await {
            tracing::error!("Presence task ended abnormally: {}", e);
        }

        if self.manager.config.clear_on_stop {
            self.manager.clear_presence();
        }

        tracing::info!("Presence task stopped");
    }
}

/// Start the background task that polls the profile on the configured
/// interval. The first cycle runs immediately.
pub fn start_presence_background_task(manager: Arc<PresenceManager>) -> PresenceTask {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let task_manager = Arc::clone(&manager);
    let period = manager.config.poll_interval;

    tracing::info!(
        "Starting presence task for {} every {:?}",
        manager.config.steam_id,
        period
    );

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = interval.tick() => {}
            }

            tokio::select! {
                _ = shutdown_rx.changed() => {
                    tracing::debug!("Abandoning in-flight presence cycle");
                    break;
                }
                result = task_manager.run_cycle() => match result {
                    Ok(outcome) => tracing::debug!("Presence cycle finished: {:?}", outcome),
                    Err(e) => tracing::warn!("Presence cycle failed: {}", e),
                }
            }
        }
    });

    PresenceTask {
        shutdown_tx,
        handle,
        manager,
    }
}
