//! Scan session orchestration.
//!
//! A [`ScanSession`] owns everything one officer's scan screen needs: the
//! capture adapter and its cameras, a decoder, a geolocation watch and the
//! lifecycle state machine. It drives a scan from `Idle` through `Scanning`
//! to `Resolved` or `Failed` and hands decoded payloads to the reconciler.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Scanning --success--> Resolved --dismiss--> Idle
//!                    |  \--hard failure--> Failed --try again--> Idle
//!                    \--stop--> Idle
//! ```
//!
//! Soft misses never change state. Scan type and direction can only change
//! in `Idle` or `Resolved`; changing the scan type mid-scan stops capture
//! first, while the direction is locked until the scan settles.
//!
//! # Stale results
//!
//! Reconciliation can be driven in two steps
//! ([`begin_reconcile`](ScanSession::begin_reconcile) then
//! [`complete`](ScanSession::complete)) so a caller may run the store
//! round-trip elsewhere. Every ticket carries the session id and a scan
//! generation; a result that arrives after the session moved on is dropped.

use chrono::{DateTime, Utc};
use gatepass_core::{LocationStatus, ScanDirection, ScanType};
use gatepass_hardware::devices::AnyGeolocation;
use gatepass_storage::{
    DisplayMessages, MatchedEntity, ReconcileRequest, RegistryStore, ScanReconciler, ScanResult,
    Visitor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::capture::{CaptureAdapter, CaptureDevices, CaptureMode};
use crate::config::SessionConfig;
use crate::decoder::{DecodeErrorKind, DecodeEvent, Decoder, PlateRecognizer, SimulatedPlateRecognizer, SymbolEngine};
use crate::engine::MultiFormatEngine;
use crate::error::{Result, ScanError, ScanFailure};
use crate::geolocation::GeolocationTracker;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::presenter::{FollowUpAction, Presentation, available_actions};
use crate::state_machine::{ScanLifecycle, StateMachine, StateTransition};

/// Why the session is in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub class: ScanFailure,
    pub message: String,
}

/// Identity of one scan attempt within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanTicket {
    pub session_id: Uuid,
    pub generation: u64,
}

/// A decoded payload waiting for reconciliation.
#[derive(Debug, Clone)]
pub struct PendingScan {
    pub ticket: ScanTicket,
    pub request: ReconcileRequest,
}

/// What a follow-up action did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Registration is handled elsewhere; this is the scanned subject to
    /// prefill it with.
    Register { scan_type: ScanType, subject: String },
    CheckedIn(Visitor),
    CheckedOut(Visitor),
    /// Capture was reset and the session is `Idle`.
    Reset,
}

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub scan_type: ScanType,
    pub direction: ScanDirection,
    pub state: ScanLifecycle,
    pub started_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
    pub last_result: Option<ScanResult>,
    pub failure: Option<SessionFailure>,
    pub location: LocationStatus,
}

/// Builder for [`ScanSession`].
pub struct ScanSessionBuilder<R> {
    reconciler: Arc<ScanReconciler<R>>,
    engine: Arc<dyn SymbolEngine>,
    recognizer: Arc<dyn PlateRecognizer>,
    notifier: Arc<dyn Notifier>,
    devices: CaptureDevices,
    geolocation: Option<AnyGeolocation>,
    config: SessionConfig,
    scan_type: ScanType,
    direction: ScanDirection,
}

impl<R: RegistryStore> ScanSessionBuilder<R> {
    pub fn capture_devices(mut self, devices: CaptureDevices) -> Self {
        self.devices = devices;
        self
    }

    pub fn geolocation(mut self, provider: impl Into<AnyGeolocation>) -> Self {
        self.geolocation = Some(provider.into());
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn symbol_engine(mut self, engine: Arc<dyn SymbolEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn plate_recognizer(mut self, recognizer: Arc<dyn PlateRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scan_type(mut self, scan_type: ScanType) -> Self {
        self.scan_type = scan_type;
        self
    }

    pub fn direction(mut self, direction: ScanDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Create the session and start its position watch.
    ///
    /// A provider that refuses the watch is logged and leaves the location
    /// unknown; the session still opens.
    pub async fn open(self) -> ScanSession<R> {
        let mut tracker = GeolocationTracker::new(Arc::clone(&self.notifier));
        let mut geolocation = self.geolocation;

        if let Some(provider) = geolocation.as_mut() {
            if let Err(e) = tracker
                .start(provider, &self.config.geolocation.options)
                .await
            {
                warn!(error = %e, "position watch could not be started");
            }
        }

        let now = Utc::now();
        let session = ScanSession {
            id: Uuid::new_v4(),
            scan_type: self.scan_type,
            direction: self.direction,
            machine: StateMachine::new(),
            started_at: now,
            timestamp: now,
            last_result: None,
            failure: None,
            generation: 0,
            capture: CaptureAdapter::new(self.devices, self.config.capture),
            decoder: Decoder::new(self.scan_type, self.engine, self.recognizer),
            geolocation,
            tracker,
            reconciler: self.reconciler,
            notifier: self.notifier,
            config: self.config,
            events: None,
        };

        info!(
            session_id = %session.id,
            scan_type = %session.scan_type,
            direction = %session.direction,
            capture_mode = ?session.capture.mode(),
            "scan session opened"
        );
        session
    }
}

/// One officer's scan screen.
pub struct ScanSession<R> {
    id: Uuid,
    scan_type: ScanType,
    direction: ScanDirection,
    machine: StateMachine,
    started_at: DateTime<Utc>,
    timestamp: DateTime<Utc>,
    last_result: Option<ScanResult>,
    failure: Option<SessionFailure>,
    generation: u64,
    capture: CaptureAdapter,
    decoder: Decoder,
    geolocation: Option<AnyGeolocation>,
    tracker: GeolocationTracker,
    reconciler: Arc<ScanReconciler<R>>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
    events: Option<mpsc::Receiver<DecodeEvent>>,
}

impl<R> std::fmt::Debug for ScanSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("id", &self.id)
            .field("scan_type", &self.scan_type)
            .field("direction", &self.direction)
            .field("state", &self.machine.current_state())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<R: RegistryStore> ScanSession<R> {
    /// Start building a session around a reconciler.
    ///
    /// Symbols are read with [`MultiFormatEngine`] unless another engine is
    /// set through [`ScanSessionBuilder::symbol_engine`].
    pub fn builder(reconciler: Arc<ScanReconciler<R>>) -> ScanSessionBuilder<R> {
        ScanSessionBuilder {
            reconciler,
            engine: Arc::new(MultiFormatEngine::new()),
            recognizer: Arc::new(SimulatedPlateRecognizer::default()),
            notifier: Arc::new(TracingNotifier),
            devices: CaptureDevices::default(),
            geolocation: None,
            config: SessionConfig::default(),
            scan_type: ScanType::IdDocument,
            direction: ScanDirection::Ingress,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ScanLifecycle {
        self.machine.current_state()
    }

    pub fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    pub fn direction(&self) -> ScanDirection {
        self.direction
    }

    pub fn capture_mode(&self) -> Option<CaptureMode> {
        self.capture.mode()
    }

    /// When the session was opened.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Refreshed at every scan start and every decode resolution.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn last_result(&self) -> Option<&ScanResult> {
        self.last_result.as_ref()
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    pub fn location(&self) -> LocationStatus {
        self.tracker.status()
    }

    pub fn subscribe_location(&self) -> watch::Receiver<LocationStatus> {
        self.tracker.subscribe()
    }

    /// Replace the position watch, e.g. after location permission was granted.
    ///
    /// A session opened without a provider keeps its location unknown.
    pub async fn restart_location_watch(&mut self) -> Result<()> {
        if let Some(provider) = self.geolocation.as_mut() {
            self.tracker
                .start(provider, &self.config.geolocation.options)
                .await?;
        }
        Ok(())
    }

    pub fn history(&self, count: usize) -> Vec<StateTransition> {
        self.machine.last_transitions(count)
    }

    pub fn ticket(&self) -> ScanTicket {
        ScanTicket {
            session_id: self.id,
            generation: self.generation,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            scan_type: self.scan_type,
            direction: self.direction,
            state: self.state(),
            started_at: self.started_at,
            timestamp: self.timestamp,
            last_result: self.last_result.clone(),
            failure: self.failure.clone(),
            location: self.tracker.status(),
        }
    }

    /// What the officer should currently see.
    pub fn presentation(&self) -> Presentation {
        match (self.state(), &self.last_result, &self.failure) {
            (ScanLifecycle::Resolved | ScanLifecycle::Failed, Some(result), _) => {
                Presentation::for_result(result)
            }
            (ScanLifecycle::Failed, None, Some(failure)) => {
                Presentation::for_failure(failure.class, &failure.message)
            }
            (state, _, _) => Presentation::for_state(state, self.scan_type),
        }
    }

    /// Change the scan type.
    ///
    /// While `Scanning` the active capture is stopped and the session returns
    /// to `Idle` first.
    ///
    /// # Errors
    ///
    /// `NotAllowed` while `Failed`.
    pub async fn set_scan_type(&mut self, scan_type: ScanType) -> Result<()> {
        match self.state() {
            ScanLifecycle::Scanning => self.stop().await?,
            ScanLifecycle::Failed => {
                return Err(ScanError::not_allowed("Changing scan type", ScanLifecycle::Failed));
            }
            ScanLifecycle::Idle | ScanLifecycle::Resolved => {}
        }

        if scan_type != self.scan_type {
            debug!(session_id = %self.id, from = %self.scan_type, to = %scan_type, "scan type changed");
            self.scan_type = scan_type;
            self.decoder = self.decoder.for_scan_type(scan_type);
        }
        Ok(())
    }

    /// Change the direction.
    ///
    /// # Errors
    ///
    /// `NotAllowed` unless `Idle` or `Resolved`.
    pub fn set_direction(&mut self, direction: ScanDirection) -> Result<()> {
        let state = self.state();
        if !state.allows_reconfiguration() {
            return Err(ScanError::not_allowed("Changing direction", state));
        }

        if direction != self.direction {
            debug!(session_id = %self.id, to = %direction, "direction changed");
            self.direction = direction;
        }
        Ok(())
    }

    /// `Idle -> Scanning`: clear the previous result and start capture.
    ///
    /// A capture that cannot start at all (no camera) sends the session
    /// straight to `Failed` with a device failure rather than returning an
    /// error.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless `Idle`.
    pub async fn start(&mut self) -> Result<()> {
        self.machine.transition_to(ScanLifecycle::Scanning)?;

        self.last_result = None;
        self.failure = None;
        self.generation += 1;
        self.timestamp = Utc::now();

        match self.capture.start_capture(self.decoder.clone()).await {
            Ok(events) => {
                self.events = Some(events);
                info!(
                    session_id = %self.id,
                    generation = self.generation,
                    scan_type = %self.scan_type,
                    "scan started"
                );
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "capture could not start");
                self.fail(ScanFailure::Device, e.to_string())?;
            }
        }
        Ok(())
    }

    /// Process decode events until the scan settles or capture stops.
    ///
    /// Returns the resulting state. Returns immediately when not `Scanning`.
    pub async fn run_until_settled(&mut self) -> Result<ScanLifecycle> {
        while self.state() == ScanLifecycle::Scanning {
            let event = match self.events.as_mut() {
                Some(events) => events.recv().await,
                None => None,
            };

            match event {
                Some(event) => {
                    self.process_event(event).await?;
                }
                None => {
                    self.capture.stop_capture().await;
                    self.events = None;
                    self.fail(ScanFailure::Device, "Capture ended unexpectedly".to_string())?;
                }
            }
        }
        Ok(self.state())
    }

    /// Apply one decode event.
    ///
    /// # Errors
    ///
    /// `NotAllowed` unless `Scanning`.
    pub async fn process_event(&mut self, event: DecodeEvent) -> Result<ScanLifecycle> {
        let state = self.state();
        if state != ScanLifecycle::Scanning {
            return Err(ScanError::not_allowed("Processing a decode event", state));
        }

        match event {
            DecodeEvent::SoftMiss => trace!(session_id = %self.id, "soft miss"),
            DecodeEvent::Success { text, .. } => {
                let pending = self.begin_reconcile(text).await?;
                self.process_pending(pending).await?;
            }
            DecodeEvent::HardFailure {
                kind: DecodeErrorKind::Cancelled,
                ..
            } => {
                info!(session_id = %self.id, "capture dismissed by officer");
                self.stop().await?;
            }
            DecodeEvent::HardFailure { kind, message } => {
                self.release_capture().await;
                warn!(session_id = %self.id, ?kind, %message, "scan failed");
                self.fail(kind.failure_class(), message)?;
            }
        }
        Ok(self.state())
    }

    /// Stop capture and build the reconciliation request for a decoded
    /// payload.
    ///
    /// Direction, location and timestamp are read now, not at decode time.
    ///
    /// # Errors
    ///
    /// `NotAllowed` unless `Scanning`.
    pub async fn begin_reconcile(&mut self, scanned_id: String) -> Result<PendingScan> {
        let state = self.state();
        if state != ScanLifecycle::Scanning {
            return Err(ScanError::not_allowed("Reconciling a scan", state));
        }

        self.release_capture().await;
        self.timestamp = Utc::now();

        let request = ReconcileRequest::new(scanned_id, self.scan_type, self.direction, self.timestamp)
            .with_location(self.tracker.status())
            .with_officer(self.config.officer_id.clone());

        debug!(
            session_id = %self.id,
            generation = self.generation,
            direction = %request.direction,
            located = request.location.fix().is_some(),
            "reconciling scan"
        );

        Ok(PendingScan {
            ticket: self.ticket(),
            request,
        })
    }

    /// Reconcile a pending scan against this session's registry and apply
    /// the result.
    pub async fn process_pending(&mut self, pending: PendingScan) -> Result<bool> {
        let result = self.reconciler.reconcile(&pending.request).await;
        self.complete(pending.ticket, result)
    }

    /// Apply a reconciliation result.
    ///
    /// Returns `false` when the ticket is stale (the session was stopped,
    /// restarted or is a different session) and the result was dropped.
    pub fn complete(&mut self, ticket: ScanTicket, result: ScanResult) -> Result<bool> {
        if ticket != self.ticket() || self.state() != ScanLifecycle::Scanning {
            debug!(
                session_id = %self.id,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "discarding stale reconciliation result"
            );
            return Ok(false);
        }

        self.timestamp = result.timestamp;

        match result.failure {
            Some(failure) => {
                let class = ScanFailure::from(failure);
                let message = result.message.clone();
                self.last_result = Some(result);
                self.fail(class, message)?;
            }
            None => {
                self.machine.transition_to(ScanLifecycle::Resolved)?;
                let title = if result.direction.is_ingress() {
                    DisplayMessages::ENTRY_RECORDED
                } else {
                    DisplayMessages::EXIT_RECORDED
                };
                self.notifier
                    .notify(Notification::success(title, result.message.clone()));
                info!(
                    session_id = %self.id,
                    matched = result.matched_entity.is_some(),
                    not_pre_registered = result.not_pre_registered,
                    "scan resolved"
                );
                self.last_result = Some(result);
            }
        }
        Ok(true)
    }

    /// `Scanning -> Idle`, releasing the camera. A no-op in other states.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state() != ScanLifecycle::Scanning {
            return Ok(());
        }

        self.release_capture().await;
        self.generation += 1;
        self.machine.transition_to(ScanLifecycle::Idle)?;
        info!(session_id = %self.id, "scan stopped");
        Ok(())
    }

    /// `Resolved | Failed -> Idle`, keeping the last result on display.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from `Idle`; `NotAllowed` while `Scanning`.
    pub fn dismiss(&mut self) -> Result<()> {
        if self.state() == ScanLifecycle::Scanning {
            return Err(ScanError::not_allowed("Dismissing a result", ScanLifecycle::Scanning));
        }
        self.machine.transition_to(ScanLifecycle::Idle)?;
        Ok(())
    }

    /// Fully reset capture resources and return to `Idle` from any state.
    pub async fn try_again(&mut self) {
        self.release_capture().await;
        self.generation += 1;
        self.failure = None;

        if self.state() != ScanLifecycle::Idle {
            let transition = self.machine.reset();
            debug!(session_id = %self.id, from = %transition.from, "session reset");
        }
    }

    /// Carry out a follow-up action on the last result.
    ///
    /// # Errors
    ///
    /// `ActionUnavailable` when the action is not offered for the last
    /// result, `Storage` when the status update fails.
    pub async fn perform(&mut self, action: FollowUpAction) -> Result<ActionOutcome> {
        if action == FollowUpAction::TryAgain {
            self.try_again().await;
            return Ok(ActionOutcome::Reset);
        }

        let result = self
            .last_result
            .as_ref()
            .filter(|_| self.state() == ScanLifecycle::Resolved)
            .ok_or_else(|| ScanError::action_unavailable(format!("{action} needs a resolved scan")))?;

        if !available_actions(result).contains(&action) {
            return Err(ScanError::action_unavailable(format!(
                "{action} does not apply to this scan"
            )));
        }

        if action == FollowUpAction::Register {
            let subject = result
                .details
                .as_ref()
                .map(|details| details.subject().to_string())
                .unwrap_or_default();
            return Ok(ActionOutcome::Register {
                scan_type: result.scan_type,
                subject,
            });
        }

        let visitor_id = result
            .matched_visitor_id()
            .map(str::to_string)
            .ok_or_else(|| ScanError::action_unavailable(format!("{action} needs a visitor")))?;

        let now = Utc::now();
        let updated = if action == FollowUpAction::CheckIn {
            self.reconciler.check_in(&visitor_id, now).await
        } else {
            self.reconciler.check_out(&visitor_id, now).await
        };

        let visitor = match updated {
            Ok(visitor) => visitor,
            Err(e) => {
                self.notifier.notify(Notification::error(
                    DisplayMessages::SCAN_ERROR,
                    DisplayMessages::SCAN_ERROR_DETAIL,
                ));
                return Err(e.into());
            }
        };

        self.refresh_matched_visitor(&visitor);

        if action == FollowUpAction::CheckIn {
            self.notifier.notify(Notification::success(
                DisplayMessages::CHECK_IN_SUCCESSFUL,
                format!("{} has been checked in", visitor.full_name),
            ));
            Ok(ActionOutcome::CheckedIn(visitor))
        } else {
            self.notifier.notify(Notification::success(
                DisplayMessages::CHECK_OUT_SUCCESSFUL,
                format!("{} has been checked out", visitor.full_name),
            ));
            Ok(ActionOutcome::CheckedOut(visitor))
        }
    }

    /// Stop capture and the position watch.
    pub async fn close(mut self) {
        self.release_capture().await;
        self.tracker.stop().await;
        info!(session_id = %self.id, "scan session closed");
    }

    async fn release_capture(&mut self) {
        self.events = None;
        self.capture.stop_capture().await;
    }

    fn fail(&mut self, class: ScanFailure, message: String) -> Result<()> {
        self.machine.transition_to(ScanLifecycle::Failed)?;

        let notification = match class {
            ScanFailure::Lookup => Notification::error(
                DisplayMessages::SCAN_ERROR,
                DisplayMessages::SCAN_ERROR_DETAIL,
            ),
            ScanFailure::Device | ScanFailure::Recognition => {
                Notification::error(DisplayMessages::SCANNER_ERROR, message.clone())
            }
        };
        self.notifier.notify(notification);

        self.failure = Some(SessionFailure { class, message });
        Ok(())
    }

    fn refresh_matched_visitor(&mut self, visitor: &Visitor) {
        let Ok(new_status) = visitor.visitor_status() else {
            return;
        };
        if let Some(ScanResult {
            matched_entity: Some(MatchedEntity::Visitor { id, status, .. }),
            ..
        }) = self.last_result.as_mut()
        {
            if *id == visitor.id {
                *status = new_status;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedSymbolEngine;
    use gatepass_hardware::mock::{MockVideoCamera, MockVideoCameraHandle};
    use gatepass_storage::{Database, SqliteRegistry};

    async fn session() -> (
        ScanSession<SqliteRegistry>,
        MockVideoCameraHandle,
        Arc<ScriptedSymbolEngine>,
        Database,
    ) {
        let db = Database::in_memory().await.unwrap();
        let reconciler = Arc::new(ScanReconciler::new(SqliteRegistry::new(db.pool().clone())));
        let engine = Arc::new(ScriptedSymbolEngine::new());
        let (camera, handle) = MockVideoCamera::new();

        let session = ScanSession::builder(reconciler)
            .symbol_engine(engine.clone())
            .capture_devices(CaptureDevices::with_video(camera))
            .notifier(Arc::new(crate::notify::NullNotifier))
            .open()
            .await;
        (session, handle, engine, db)
    }

    #[tokio::test]
    async fn test_new_session_is_idle() {
        let (session, _handle, _engine, _db) = session().await;
        assert_eq!(session.state(), ScanLifecycle::Idle);
        assert_eq!(session.capture_mode(), Some(CaptureMode::Continuous));
        assert!(session.location().is_awaiting());
        assert!(session.last_result().is_none());
    }

    #[tokio::test]
    async fn test_direction_locked_while_scanning() {
        let (mut session, _handle, _engine, _db) = session().await;
        session.start().await.unwrap();

        let err = session.set_direction(ScanDirection::Egress).unwrap_err();
        assert_eq!(err.to_string(), "Changing direction is not allowed while Scanning");
        assert_eq!(session.direction(), ScanDirection::Ingress);

        session.stop().await.unwrap();
        session.set_direction(ScanDirection::Egress).unwrap();
        assert_eq!(session.direction(), ScanDirection::Egress);
    }

    #[tokio::test]
    async fn test_scan_type_change_stops_capture() {
        let (mut session, handle, _engine, _db) = session().await;
        session.start().await.unwrap();

        session.set_scan_type(ScanType::Anpr).await.unwrap();

        assert_eq!(session.state(), ScanLifecycle::Idle);
        assert_eq!(session.scan_type(), ScanType::Anpr);
        assert_eq!(handle.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_start_requires_idle() {
        let (mut session, _handle, _engine, _db) = session().await;
        session.start().await.unwrap();

        assert!(matches!(
            session.start().await,
            Err(ScanError::InvalidTransition { .. })
        ));
        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_ticket_is_dropped() {
        let (mut session, handle, _engine, db) = session().await;

        session.start().await.unwrap();
        let pending = session
            .begin_reconcile("0000000000000".to_string())
            .await
            .unwrap();
        assert_eq!(handle.open_handles(), 0);

        let reconciler = ScanReconciler::new(SqliteRegistry::new(db.pool().clone()));
        let result = reconciler.reconcile(&pending.request).await;

        session.stop().await.unwrap();
        assert!(!session.complete(pending.ticket, result).unwrap());
        assert_eq!(session.state(), ScanLifecycle::Idle);
        assert!(session.last_result().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_action_is_rejected() {
        let (mut session, _handle, _engine, _db) = session().await;
        assert!(matches!(
            session.perform(FollowUpAction::CheckIn).await,
            Err(ScanError::ActionUnavailable(_))
        ));
        assert_eq!(
            session.perform(FollowUpAction::TryAgain).await.unwrap(),
            ActionOutcome::Reset
        );
    }

    #[tokio::test]
    async fn test_no_camera_fails_with_device_class() {
        let db = Database::in_memory().await.unwrap();
        let reconciler = Arc::new(ScanReconciler::new(SqliteRegistry::new(db.pool().clone())));
        let mut session = ScanSession::builder(reconciler)
            .notifier(Arc::new(crate::notify::NullNotifier))
            .open()
            .await;

        session.start().await.unwrap();

        assert_eq!(session.state(), ScanLifecycle::Failed);
        assert_eq!(session.failure().map(|f| f.class), Some(ScanFailure::Device));
        assert_eq!(session.presentation().actions, vec![FollowUpAction::TryAgain]);

        session.try_again().await;
        assert_eq!(session.state(), ScanLifecycle::Idle);
        assert!(session.failure().is_none());
    }
}
