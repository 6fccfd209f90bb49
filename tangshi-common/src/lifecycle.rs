//! Request lifecycle for user-triggered actions
//!
//! Every user action (search, illustrate, speak, export) moves through an
//! explicit lifecycle:
//!
//! ```text
//! Idle ──begin──> Pending ──succeed──> Succeeded
//!                    │     ──fail────> Failed
//!                    └──cancel──> Idle
//! ```
//!
//! Succeeded and Failed are terminal for one attempt; `begin` starts the
//! next attempt from any state except Pending. What happens when `begin`
//! is called while an attempt is still Pending is decided by the action's
//! [`OverlapPolicy`]:
//!
//! - `Supersede`: the new attempt replaces the pending one. The old
//!   attempt's ticket becomes stale, so its eventual result is dropped.
//! - `Reject`: `begin` fails with [`Error::Busy`] and the pending attempt
//!   keeps running.
//!
//! There are no timeouts or retries. A failed attempt stays Failed until
//! the next `begin`.

use crate::events::TangshiEvent;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// User-triggered actions tracked by the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Poem lookup by title or quoted line
    Search,
    /// Illustration generation for the current poem
    Illustrate,
    /// Speech synthesis and playback
    Speak,
    /// Card export to an image
    Export,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Search,
        ActionKind::Illustrate,
        ActionKind::Speak,
        ActionKind::Export,
    ];

    /// Overlap policy used when none is configured explicitly.
    ///
    /// A new search replaces the one in flight (the latest query wins).
    /// The other actions work on the current card and reject overlaps.
    pub fn default_policy(self) -> OverlapPolicy {
        match self {
            ActionKind::Search => OverlapPolicy::Supersede,
            ActionKind::Illustrate | ActionKind::Speak | ActionKind::Export => {
                OverlapPolicy::Reject
            }
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Search => write!(f, "search"),
            ActionKind::Illustrate => write!(f, "illustrate"),
            ActionKind::Speak => write!(f, "speak"),
            ActionKind::Export => write!(f, "export"),
        }
    }
}

/// Lifecycle state of one action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum ActionState {
    /// Never started, or cancelled
    #[default]
    Idle,
    /// Request in flight
    Pending,
    /// Last attempt completed successfully
    Succeeded,
    /// Last attempt failed
    Failed,
}

impl ActionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionState::Succeeded | ActionState::Failed)
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionState::Idle => write!(f, "Idle"),
            ActionState::Pending => write!(f, "Pending"),
            ActionState::Succeeded => write!(f, "Succeeded"),
            ActionState::Failed => write!(f, "Failed"),
        }
    }
}

/// What `begin` does while an attempt is already pending
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Replace the pending attempt; its completion becomes stale
    Supersede,
    /// Refuse the new attempt with `Error::Busy`
    Reject,
}

/// Handle for one attempt of an action
///
/// Returned by [`ActionTracker::begin`] and handed back on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    action: ActionKind,
    generation: u64,
}

impl Ticket {
    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of reporting a completion to the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The ticket was current and the state changed
    Applied(ActionState),
    /// The ticket was superseded or cancelled; state unchanged
    Stale,
}

impl Completion {
    pub fn is_applied(&self) -> bool {
        matches!(self, Completion::Applied(_))
    }
}

/// Lifecycle state machine for a single action
#[derive(Debug, Clone)]
pub struct ActionTracker {
    action: ActionKind,
    policy: OverlapPolicy,
    state: ActionState,
    generation: u64,
    last_error: Option<String>,
    updated_at: DateTime<Utc>,
}

impl ActionTracker {
    /// Create a tracker using the action's default overlap policy
    pub fn new(action: ActionKind) -> Self {
        Self::with_policy(action, action.default_policy())
    }

    pub fn with_policy(action: ActionKind, policy: OverlapPolicy) -> Self {
        Self {
            action,
            policy,
            state: ActionState::Idle,
            generation: 0,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Generation of the most recent attempt (0 before the first `begin`)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Error message of the last failed attempt, cleared by `begin`
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_pending(&self) -> bool {
        self.state == ActionState::Pending
    }

    /// Start a new attempt
    ///
    /// # Errors
    /// `Error::Busy` if an attempt is pending and the policy is `Reject`.
    pub fn begin(&mut self) -> Result<Ticket> {
        if self.state == ActionState::Pending {
            match self.policy {
                OverlapPolicy::Reject => {
                    debug!(
                        "Rejecting overlapping {} (generation {} pending)",
                        self.action, self.generation
                    );
                    return Err(Error::Busy(self.action.to_string()));
                }
                OverlapPolicy::Supersede => {
                    debug!(
                        "Superseding pending {} generation {}",
                        self.action, self.generation
                    );
                }
            }
        }

        self.generation += 1;
        self.last_error = None;
        self.transition(ActionState::Pending);

        Ok(Ticket {
            action: self.action,
            generation: self.generation,
        })
    }

    /// Report success for an attempt
    pub fn succeed(&mut self, ticket: Ticket) -> Completion {
        if !self.is_current(ticket) {
            debug!(
                "Dropping stale {} success (generation {}, current {})",
                self.action, ticket.generation, self.generation
            );
            return Completion::Stale;
        }

        self.transition(ActionState::Succeeded);
        Completion::Applied(self.state)
    }

    /// Report failure for an attempt
    pub fn fail(&mut self, ticket: Ticket, message: impl Into<String>) -> Completion {
        if !self.is_current(ticket) {
            debug!(
                "Dropping stale {} failure (generation {}, current {})",
                self.action, ticket.generation, self.generation
            );
            return Completion::Stale;
        }

        self.last_error = Some(message.into());
        self.transition(ActionState::Failed);
        Completion::Applied(self.state)
    }

    /// Abandon the pending attempt, if any
    ///
    /// Returns true if an attempt was pending. The abandoned ticket becomes
    /// stale.
    pub fn cancel(&mut self) -> bool {
        if self.state != ActionState::Pending {
            return false;
        }

        // Bump the generation so the in-flight ticket no longer matches
        self.generation += 1;
        self.transition(ActionState::Idle);
        true
    }

    /// Snapshot of the current state as an event
    pub fn event(&self, old_state: ActionState) -> TangshiEvent {
        TangshiEvent::ActionStateChanged {
            action: self.action,
            old_state,
            new_state: self.state,
            generation: self.generation,
            error: self.last_error.clone(),
            timestamp: self.updated_at,
        }
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.action == self.action
            && ticket.generation == self.generation
            && self.state == ActionState::Pending
    }

    fn transition(&mut self, new_state: ActionState) {
        debug!(
            "{} lifecycle: {} -> {} (generation {})",
            self.action, self.state, new_state, self.generation
        );
        self.state = new_state;
        self.updated_at = Utc::now();
    }
}
