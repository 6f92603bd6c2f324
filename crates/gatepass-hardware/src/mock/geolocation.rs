//! Mock geolocation provider.

use crate::{
    Result,
    traits::{GeolocationProvider, PositionUpdate, PositionWatch},
    types::{DeviceInfo, PositionOptions},
};
use gatepass_core::{GeoError, GeoFix};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct ProviderState {
    watches: Mutex<Vec<(u64, mpsc::Sender<PositionUpdate>)>>,
    last_options: Mutex<Option<PositionOptions>>,
    next_id: AtomicU64,
    permission_denied: AtomicBool,
}

impl ProviderState {
    /// Deliver an update to every live watch, pruning cancelled ones.
    fn broadcast(&self, update: PositionUpdate) -> usize {
        let mut watches = self.watches.lock().unwrap_or_else(PoisonError::into_inner);
        watches.retain(|(_, tx)| !tx.is_closed());

        watches
            .iter()
            .filter(|(_, tx)| tx.try_send(update.clone()).is_ok())
            .count()
    }

    fn active(&self) -> usize {
        let mut watches = self.watches.lock().unwrap_or_else(PoisonError::into_inner);
        watches.retain(|(_, tx)| !tx.is_closed());
        watches.len()
    }
}

/// Mock position provider driven by a [`MockGeolocationHandle`].
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use gatepass_core::GeoFix;
/// use gatepass_hardware::mock::MockGeolocation;
/// use gatepass_hardware::traits::GeolocationProvider;
/// use gatepass_hardware::types::PositionOptions;
///
/// #[tokio::main]
/// async fn main() -> gatepass_hardware::Result<()> {
///     let (mut provider, handle) = MockGeolocation::new();
///     let mut watch = provider.watch_position(&PositionOptions::default()).await?;
///
///     let fix = GeoFix::new(-26.2, 28.0, 8.0, Utc::now()).unwrap();
///     assert_eq!(handle.push_fix(fix), 1);
///     assert_eq!(watch.next_update().await, Some(Ok(fix)));
///
///     watch.clear();
///     assert_eq!(handle.active_watches(), 0);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockGeolocation {
    state: Arc<ProviderState>,
    name: String,
}

impl MockGeolocation {
    pub fn new() -> (Self, MockGeolocationHandle) {
        let state = Arc::new(ProviderState::default());

        let provider = Self {
            state: Arc::clone(&state),
            name: "Mock Geolocation".to_string(),
        };

        (provider, MockGeolocationHandle { state })
    }
}

impl GeolocationProvider for MockGeolocation {
    async fn watch_position(&mut self, options: &PositionOptions) -> Result<PositionWatch> {
        let (tx, rx) = mpsc::channel(16);
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);

        *self
            .state
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(*options);

        // Browsers report a refused permission through the watch's error
        // callback, not by failing to register it.
        if self.state.permission_denied.load(Ordering::SeqCst) {
            let _ = tx.try_send(Err(GeoError::permission_denied(
                "User denied Geolocation",
            )));
        }

        self.state
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, tx));

        Ok(PositionWatch::new(id, rx))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(&self.name, "MockGeolocation"))
    }
}

/// Control handle for a [`MockGeolocation`].
#[derive(Debug, Clone)]
pub struct MockGeolocationHandle {
    state: Arc<ProviderState>,
}

impl MockGeolocationHandle {
    /// Send a fix to every active watch. Returns how many received it.
    pub fn push_fix(&self, fix: GeoFix) -> usize {
        self.state.broadcast(Ok(fix))
    }

    /// Send an acquisition error to every active watch.
    pub fn push_error(&self, error: GeoError) -> usize {
        self.state.broadcast(Err(error))
    }

    /// Make new watches start with a `PermissionDenied` error.
    pub fn deny_permission(&self) {
        self.state.permission_denied.store(true, Ordering::SeqCst);
    }

    /// Number of watches that have not been cleared.
    pub fn active_watches(&self) -> usize {
        self.state.active()
    }

    /// Options passed to the most recent `watch_position`.
    pub fn last_options(&self) -> Option<PositionOptions> {
        *self
            .state
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
