//! Geolocation tracker.
//!
//! Runs one continuous position watch per session and publishes the latest
//! [`LocationStatus`] on a `watch` channel. Reconciliation reads whatever is
//! current and never waits for a fix. Acquisition errors replace the last fix,
//! are logged and raise a "Location Error" notification; they never stop
//! scanning.

use gatepass_core::LocationStatus;
use gatepass_hardware::devices::AnyGeolocation;
use gatepass_hardware::traits::{GeolocationProvider, PositionWatch};
use gatepass_hardware::types::PositionOptions;
use gatepass_storage::DisplayMessages;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::notify::{Notification, Notifier};

struct ActiveWatch {
    id: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct GeolocationTracker {
    status: watch::Sender<LocationStatus>,
    notifier: Arc<dyn Notifier>,
    active: Option<ActiveWatch>,
}

impl std::fmt::Debug for GeolocationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeolocationTracker")
            .field("status", &*self.status.borrow())
            .field("watch_id", &self.active.as_ref().map(|a| a.id))
            .finish_non_exhaustive()
    }
}

impl GeolocationTracker {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let (status, _) = watch::channel(LocationStatus::AwaitingFix);
        Self {
            status,
            notifier,
            active: None,
        }
    }

    /// Begin a continuous watch, replacing any running one.
    ///
    /// The status resets to `AwaitingFix` until the first update arrives.
    ///
    /// # Errors
    ///
    /// Propagates a provider that refuses to register the watch at all.
    pub async fn start(
        &mut self,
        provider: &mut AnyGeolocation,
        options: &PositionOptions,
    ) -> Result<()> {
        self.stop().await;

        let watch = provider.watch_position(options).await?;
        let id = watch.id();
        self.status.send_replace(LocationStatus::AwaitingFix);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_watch(
            watch,
            self.status.clone(),
            Arc::clone(&self.notifier),
            cancel.clone(),
        ));

        info!(watch_id = id, high_accuracy = options.high_accuracy, "position watch started");
        self.active = Some(ActiveWatch { id, cancel, task });
        Ok(())
    }

    /// Cancel the watch and wait for it to be cleared.
    ///
    /// The last status is kept; no further updates are applied.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.cancel.cancel();
        if let Err(e) = active.task.await {
            error!(watch_id = active.id, error = %e, "position watch task failed");
        }
        debug!(watch_id = active.id, "position watch cleared");
    }

    pub fn is_watching(&self) -> bool {
        self.active.is_some()
    }

    /// Snapshot of the current location status.
    pub fn status(&self) -> LocationStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationStatus> {
        self.status.subscribe()
    }
}

impl Drop for GeolocationTracker {
    fn drop(&mut self) {
        // Aborting drops the PositionWatch, which cancels it with the provider.
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            active.task.abort();
        }
    }
}

async fn run_watch(
    mut watch: PositionWatch,
    status: watch::Sender<LocationStatus>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
) {
    loop {
        let update = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            update = watch.next_update() => update,
        };

        match update {
            Some(Ok(fix)) => {
                debug!(%fix, "position updated");
                status.send_replace(LocationStatus::Fixed(fix));
            }
            Some(Err(e)) => {
                warn!(code = %e.code, error = %e, "position unavailable");
                notifier.notify(Notification::warning(
                    DisplayMessages::LOCATION_ERROR,
                    DisplayMessages::LOCATION_ERROR_DETAIL,
                ));
                status.send_replace(LocationStatus::Unavailable(e));
            }
            None => {
                debug!(watch_id = watch.id(), "provider ended position watch");
                break;
            }
        }
    }

    watch.clear();
}
