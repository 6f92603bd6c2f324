//! Scan session lifecycle state machine.
//!
//! # States
//!
//! - `Idle`: waiting for the officer to start a scan
//! - `Scanning`: capture is active and frames are being decoded
//! - `Resolved`: a payload was decoded and reconciled
//! - `Failed`: a device, recognition or lookup failure ended the scan
//!
//! # Valid Transitions
//!
//! - Idle → Scanning
//! - Scanning → Resolved / Failed
//! - Scanning → Idle (capture stopped by the officer)
//! - Resolved / Failed → Idle
//!
//! Soft misses never reach the state machine.
//!
//! # Examples
//!
//! ```
//! use gatepass_scanner::state_machine::{ScanLifecycle, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), ScanLifecycle::Idle);
//!
//! machine.transition_to(ScanLifecycle::Scanning).unwrap();
//! assert!(machine.transition_to(ScanLifecycle::Scanning).is_err());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::error::{Result, ScanError};

/// Maximum number of transitions kept in history.
///
/// A full scan is three transitions, so this covers the last thirty or so
/// scans of a session.
const MAX_HISTORY_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanLifecycle {
    Idle,
    Scanning,
    Resolved,
    Failed,
}

impl fmt::Display for ScanLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            ScanLifecycle::Idle => "Idle",
            ScanLifecycle::Scanning => "Scanning",
            ScanLifecycle::Resolved => "Resolved",
            ScanLifecycle::Failed => "Failed",
        };
        write!(f, "{}", state_str)
    }
}

impl ScanLifecycle {
    /// Check if transition to target state is valid from this state.
    ///
    /// ```
    /// use gatepass_scanner::state_machine::ScanLifecycle;
    ///
    /// assert!(ScanLifecycle::Idle.can_transition_to(ScanLifecycle::Scanning));
    /// assert!(!ScanLifecycle::Idle.can_transition_to(ScanLifecycle::Resolved));
    /// ```
    pub fn can_transition_to(self, target: ScanLifecycle) -> bool {
        matches!(
            (self, target),
            (ScanLifecycle::Idle, ScanLifecycle::Scanning)
                | (
                    ScanLifecycle::Scanning,
                    ScanLifecycle::Resolved | ScanLifecycle::Failed | ScanLifecycle::Idle
                )
                | (ScanLifecycle::Resolved, ScanLifecycle::Idle)
                | (ScanLifecycle::Failed, ScanLifecycle::Idle)
        )
    }

    /// Whether scan type and direction may change in this state.
    pub fn allows_reconfiguration(self) -> bool {
        matches!(self, ScanLifecycle::Idle | ScanLifecycle::Resolved)
    }

    pub fn is_settled(self) -> bool {
        matches!(self, ScanLifecycle::Resolved | ScanLifecycle::Failed)
    }
}

/// A single state transition with its wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: ScanLifecycle,
    pub to: ScanLifecycle,
    pub at: DateTime<Utc>,
}

impl StateTransition {
    pub fn new(from: ScanLifecycle, to: ScanLifecycle) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
        }
    }
}

/// Lifecycle state machine with bounded transition history.
///
/// Not thread-safe; owned by exactly one session.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current_state: ScanLifecycle,
    state_entered_at: DateTime<Utc>,
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current_state: ScanLifecycle::Idle,
            state_entered_at: Utc::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Builder for restoring a machine to a given state.
    ///
    /// ```
    /// use gatepass_scanner::state_machine::{ScanLifecycle, StateMachine};
    ///
    /// let machine = StateMachine::builder()
    ///     .with_initial_state(ScanLifecycle::Resolved)
    ///     .build();
    ///
    /// assert_eq!(machine.current_state(), ScanLifecycle::Resolved);
    /// ```
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    pub fn current_state(&self) -> ScanLifecycle {
        self.current_state
    }

    /// When the current state was entered.
    pub fn state_entered_at(&self) -> DateTime<Utc> {
        self.state_entered_at
    }

    /// Transitions ordered from oldest to newest.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The most recent `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// `ScanError::InvalidTransition` if the transition is not allowed; the
    /// machine is left unchanged.
    pub fn transition_to(&mut self, new_state: ScanLifecycle) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(new_state) {
            return Err(ScanError::InvalidTransition {
                from: self.current_state,
                to: new_state,
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());

        Ok(transition)
    }

    /// Force the machine back to `Idle` from any state.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, ScanLifecycle::Idle);
        self.perform_state_change(ScanLifecycle::Idle, transition.clone());
        transition
    }

    fn perform_state_change(&mut self, new_state: ScanLifecycle, transition: StateTransition) {
        self.current_state = new_state;
        self.state_entered_at = transition.at;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct StateMachineBuilder {
    initial_state: ScanLifecycle,
    history: VecDeque<StateTransition>,
}

impl StateMachineBuilder {
    pub fn with_initial_state(mut self, state: ScanLifecycle) -> Self {
        self.initial_state = state;
        self
    }

    /// Pre-populated history; only the newest entries up to the limit are kept.
    pub fn with_history(mut self, history: VecDeque<StateTransition>) -> Self {
        self.history = history;
        self
    }

    pub fn build(mut self) -> StateMachine {
        while self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        StateMachine {
            current_state: self.initial_state,
            state_entered_at: Utc::now(),
            history: self.history,
        }
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: ScanLifecycle::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALL: [ScanLifecycle; 4] = [
        ScanLifecycle::Idle,
        ScanLifecycle::Scanning,
        ScanLifecycle::Resolved,
        ScanLifecycle::Failed,
    ];

    #[test]
    fn test_new_machine_starts_idle() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_state(), ScanLifecycle::Idle);
        assert_eq!(machine.history().len(), 0);
    }

    #[rstest]
    #[case(ScanLifecycle::Resolved)]
    #[case(ScanLifecycle::Failed)]
    fn test_full_cycle(#[case] outcome: ScanLifecycle) {
        let mut machine = StateMachine::new();
        machine.transition_to(ScanLifecycle::Scanning).unwrap();
        machine.transition_to(outcome).unwrap();
        machine.transition_to(ScanLifecycle::Idle).unwrap();

        let states: Vec<_> = machine.history().iter().map(|t| t.to).collect();
        assert_eq!(states, vec![ScanLifecycle::Scanning, outcome, ScanLifecycle::Idle]);
    }

    #[test]
    fn test_transition_table() {
        let allowed = [
            (ScanLifecycle::Idle, ScanLifecycle::Scanning),
            (ScanLifecycle::Scanning, ScanLifecycle::Resolved),
            (ScanLifecycle::Scanning, ScanLifecycle::Failed),
            (ScanLifecycle::Scanning, ScanLifecycle::Idle),
            (ScanLifecycle::Resolved, ScanLifecycle::Idle),
            (ScanLifecycle::Failed, ScanLifecycle::Idle),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let mut machine = StateMachine::new();
        let err = machine.transition_to(ScanLifecycle::Resolved).unwrap_err();

        assert!(matches!(
            err,
            ScanError::InvalidTransition {
                from: ScanLifecycle::Idle,
                to: ScanLifecycle::Resolved,
            }
        ));
        assert_eq!(machine.current_state(), ScanLifecycle::Idle);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_reconfiguration_rules() {
        assert!(ScanLifecycle::Idle.allows_reconfiguration());
        assert!(ScanLifecycle::Resolved.allows_reconfiguration());
        assert!(!ScanLifecycle::Scanning.allows_reconfiguration());
        assert!(!ScanLifecycle::Failed.allows_reconfiguration());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = StateMachine::new();
        for _ in 0..60 {
            machine.transition_to(ScanLifecycle::Scanning).unwrap();
            machine.transition_to(ScanLifecycle::Idle).unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        let last = machine.last_transitions(2);
        assert_eq!(last[0].to, ScanLifecycle::Scanning);
        assert_eq!(last[1].to, ScanLifecycle::Idle);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut machine = StateMachine::builder()
            .with_initial_state(ScanLifecycle::Scanning)
            .build();

        let transition = machine.reset();
        assert_eq!(transition.from, ScanLifecycle::Scanning);
        assert_eq!(machine.current_state(), ScanLifecycle::Idle);
        assert_eq!(machine.state_entered_at(), transition.at);
    }

    #[test]
    fn test_builder_trims_history() {
        let history: VecDeque<_> = (0..150)
            .map(|_| StateTransition::new(ScanLifecycle::Idle, ScanLifecycle::Scanning))
            .collect();

        let machine = StateMachine::builder().with_history(history).build();
        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_transition_serializes() {
        let transition = StateTransition::new(ScanLifecycle::Scanning, ScanLifecycle::Failed);
        let json = serde_json::to_value(&transition).unwrap();
        assert_eq!(json["from"], "scanning");
        assert_eq!(json["to"], "failed");
    }
}
