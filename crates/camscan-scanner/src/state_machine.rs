//! Scanner state machine implementation.
//!
//! This module wraps the [`ScannerState`] transition table with the
//! bookkeeping a running scanner needs: the time the current state was
//! entered, a bounded history of transitions, and a `watch` channel that
//! broadcasts every change to observers.
//!
//! # Examples
//!
//! ```
//! use camscan_core::ScannerState;
//! use camscan_scanner::StateMachine;
//!
//! let mut machine = StateMachine::new();
//! let observer = machine.subscribe();
//!
//! machine.transition_to(ScannerState::Requesting).unwrap();
//! machine.transition_to(ScannerState::Scanning).unwrap();
//!
//! assert_eq!(*observer.borrow(), ScannerState::Scanning);
//! assert_eq!(machine.history().len(), 2);
//!
//! // Invalid transition
//! assert!(machine.transition_to(ScannerState::Success).is_err());
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use camscan_core::constants::MAX_HISTORY_SIZE;
use camscan_core::{Error, Result, ScannerState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A single state transition with timestamps.
///
/// `timestamp` is process-local and not serialized; `at` is the wall-clock
/// time and survives serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: ScannerState,

    /// The state transitioned to.
    pub to: ScannerState,

    /// Wall-clock time of the transition.
    pub at: DateTime<Utc>,

    /// Whether this was a forced reset rather than a table transition.
    #[serde(default)]
    pub forced: bool,

    /// Monotonic time of the transition.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    /// Create a new transition record stamped with the current time.
    pub fn new(from: ScannerState, to: ScannerState) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
            forced: false,
            timestamp: Instant::now(),
        }
    }

    fn forced(from: ScannerState) -> Self {
        Self {
            forced: true,
            ..Self::new(from, ScannerState::Idle)
        }
    }

    /// Get the duration since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// State machine for a scanner component.
///
/// Not synchronized on its own. The scanner keeps it behind a mutex and
/// never awaits while holding it.
#[derive(Debug)]
pub struct StateMachine {
    /// Current state.
    current_state: ScannerState,

    /// When the current state was entered.
    state_entered_at: Instant,

    /// Recent transitions, oldest first (limited to `MAX_HISTORY_SIZE`).
    history: VecDeque<StateTransition>,

    /// Broadcasts the current state to observers.
    notifier: watch::Sender<ScannerState>,
}

impl StateMachine {
    /// Create a new state machine in the `Idle` state.
    pub fn new() -> Self {
        let (notifier, _) = watch::channel(ScannerState::Idle);
        Self {
            current_state: ScannerState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            notifier,
        }
    }

    /// Get the current state.
    pub fn current_state(&self) -> ScannerState {
        self.current_state
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Subscribe to state changes.
    ///
    /// The receiver starts out holding the current state.
    pub fn subscribe(&self) -> watch::Receiver<ScannerState> {
        self.notifier.subscribe()
    }

    /// Get the transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Transition to a new state, validating it against the table.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not in
    /// the table. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: ScannerState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `Idle` from any state.
    ///
    /// Returns `None` when already idle, so repeated resets leave no trace
    /// in the history.
    pub fn reset(&mut self) -> Option<StateTransition> {
        if self.current_state == ScannerState::Idle {
            return None;
        }

        let transition = StateTransition::forced(self.current_state);
        self.perform_state_change(ScannerState::Idle, transition.clone());
        Some(transition)
    }

    fn perform_state_change(&mut self, new_state: ScannerState, transition: StateTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();
        self.add_to_history(transition);
        self.notifier.send_replace(new_state);
    }

    fn add_to_history(&mut self, transition: StateTransition) {
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
