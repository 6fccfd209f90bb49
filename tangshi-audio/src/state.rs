//! Shared application state
//!
//! Thread-safe state shared between the speech player and whatever front
//! end drives it: one lifecycle tracker per action, master volume, and the
//! event bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tangshi_common::events::{EventBus, TangshiEvent};
use tangshi_common::{ActionKind, ActionState, ActionTracker, Completion, OverlapPolicy, Ticket};
use tokio::sync::{broadcast, RwLock};
use tracing::info;

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes.
pub struct SharedState {
    /// Lifecycle tracker per action
    trackers: RwLock<HashMap<ActionKind, ActionTracker>>,

    /// Master volume (0.0-1.0), shared with the audio callback
    volume: Arc<Mutex<f32>>,

    /// Event broadcaster
    events: EventBus,
}

impl SharedState {
    /// Create new shared state with default overlap policies
    pub fn new() -> Self {
        Self::with_policies(&[])
    }

    /// Create state overriding the overlap policy of some actions
    pub fn with_policies(overrides: &[(ActionKind, OverlapPolicy)]) -> Self {
        let mut trackers: HashMap<ActionKind, ActionTracker> = ActionKind::ALL
            .iter()
            .map(|&kind| (kind, ActionTracker::new(kind)))
            .collect();
        for &(kind, policy) in overrides {
            trackers.insert(kind, ActionTracker::with_policy(kind, policy));
        }

        Self {
            trackers: RwLock::new(trackers),
            volume: Arc::new(Mutex::new(0.75)), // Default 75% volume
            events: EventBus::new(100),
        }
    }

    /// Broadcast an event to all listeners
    pub fn broadcast_event(&self, event: TangshiEvent) {
        // No receivers is OK
        self.events.emit_lossy(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<TangshiEvent> {
        self.events.subscribe()
    }

    /// Start an attempt of `action`
    ///
    /// # Errors
    /// `Busy` if the action rejects overlaps and an attempt is pending.
    pub async fn begin_action(&self, action: ActionKind) -> tangshi_common::Result<Ticket> {
        let mut trackers = self.trackers.write().await;
        let tracker = trackers
            .entry(action)
            .or_insert_with(|| ActionTracker::new(action));

        let old_state = tracker.state();
        let ticket = tracker.begin()?;
        info!("{} started (generation {})", action, ticket.generation());
        self.broadcast_event(tracker.event(old_state));
        Ok(ticket)
    }

    /// Mark an attempt as succeeded
    pub async fn succeed_action(&self, ticket: Ticket) -> Completion {
        let mut trackers = self.trackers.write().await;
        let tracker = trackers
            .entry(ticket.action())
            .or_insert_with(|| ActionTracker::new(ticket.action()));

        let old_state = tracker.state();
        let completion = tracker.succeed(ticket);
        if completion.is_applied() {
            info!("{} succeeded (generation {})", ticket.action(), ticket.generation());
            self.broadcast_event(tracker.event(old_state));
        }
        completion
    }

    /// Mark an attempt as failed, recording the message
    pub async fn fail_action(&self, ticket: Ticket, message: impl Into<String>) -> Completion {
        let mut trackers = self.trackers.write().await;
        let tracker = trackers
            .entry(ticket.action())
            .or_insert_with(|| ActionTracker::new(ticket.action()));

        let old_state = tracker.state();
        let message = message.into();
        let completion = tracker.fail(ticket, message.clone());
        if completion.is_applied() {
            info!(
                "{} failed (generation {}): {}",
                ticket.action(),
                ticket.generation(),
                message
            );
            self.broadcast_event(tracker.event(old_state));
        }
        completion
    }

    /// Abandon the pending attempt of `action`, if any
    pub async fn cancel_action(&self, action: ActionKind) -> bool {
        let mut trackers = self.trackers.write().await;
        let Some(tracker) = trackers.get_mut(&action) else {
            return false;
        };

        let old_state = tracker.state();
        let cancelled = tracker.cancel();
        if cancelled {
            info!("{} cancelled", action);
            self.broadcast_event(tracker.event(old_state));
        }
        cancelled
    }

    /// Current lifecycle state of `action`
    pub async fn action_state(&self, action: ActionKind) -> ActionState {
        self.trackers
            .read()
            .await
            .get(&action)
            .map_or(ActionState::Idle, ActionTracker::state)
    }

    /// Error message from the last failed attempt of `action`
    pub async fn last_error(&self, action: ActionKind) -> Option<String> {
        self.trackers
            .read()
            .await
            .get(&action)
            .and_then(|t| t.last_error().map(str::to_string))
    }

    /// Get master volume (0.0-1.0)
    pub fn get_volume(&self) -> f32 {
        self.volume.lock().map(|v| *v).unwrap_or(0.0)
    }

    /// Set master volume (0.0-1.0); takes effect on an open device at once
    pub fn set_volume(&self, volume: f32) {
        if let Ok(mut v) = self.volume.lock() {
            *v = volume.clamp(0.0, 1.0);
        }
    }

    /// Shared handle to the master volume, for output devices
    pub fn get_volume_arc(&self) -> Arc<Mutex<f32>> {
        Arc::clone(&self.volume)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFrame;

    #[tokio::test]
    async fn test_all_actions_start_idle() {
        let state = SharedState::new();
        for kind in ActionKind::ALL {
            assert_eq!(state.action_state(kind).await, ActionState::Idle);
            assert!(state.last_error(kind).await.is_none());
        }
    }

    #[test]
    fn test_volume() {
        let state = SharedState::new();

        // Default volume is 0.75
        assert_eq!(state.get_volume(), 0.75);

        state.set_volume(0.5);
        assert_eq!(state.get_volume(), 0.5);

        // Volume is clamped to 0.0-1.0
        state.set_volume(1.5);
        assert_eq!(state.get_volume(), 1.0);

        state.set_volume(-0.5);
        assert_eq!(state.get_volume(), 0.0);
    }

    #[test]
    fn test_volume_arc_sees_later_changes() {
        let state = SharedState::new();
        let handle = state.get_volume_arc();

        // A device holding the handle picks up changes made after it opened
        state.set_volume(0.25);
        assert_eq!(*handle.lock().unwrap(), 0.25);

        // Simulate what the audio callback does with each frame
        let mut frame = AudioFrame::from_stereo(0.8, -0.4);
        frame.apply_volume(*handle.lock().unwrap());
        assert_eq!(frame.left, 0.2);
        assert_eq!(frame.right, -0.1);
    }

    #[tokio::test]
    async fn test_lifecycle_emits_events() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();

        let ticket = state.begin_action(ActionKind::Illustrate).await.unwrap();
        state.fail_action(ticket, "quota exceeded").await;

        match rx.recv().await.unwrap() {
            TangshiEvent::ActionStateChanged { old_state, new_state, .. } => {
                assert_eq!(old_state, ActionState::Idle);
                assert_eq!(new_state, ActionState::Pending);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            TangshiEvent::ActionStateChanged { new_state, error, .. } => {
                assert_eq!(new_state, ActionState::Failed);
                assert_eq!(error.as_deref(), Some("quota exceeded"));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert_eq!(
            state.last_error(ActionKind::Illustrate).await.as_deref(),
            Some("quota exceeded")
        );
    }

    #[tokio::test]
    async fn test_overlapping_search_supersedes() {
        let state = SharedState::new();

        let first = state.begin_action(ActionKind::Search).await.unwrap();
        let second = state.begin_action(ActionKind::Search).await.unwrap();

        assert_eq!(state.succeed_action(first).await, Completion::Stale);
        assert_eq!(state.action_state(ActionKind::Search).await, ActionState::Pending);

        assert!(state.succeed_action(second).await.is_applied());
        assert_eq!(state.action_state(ActionKind::Search).await, ActionState::Succeeded);
    }

    #[tokio::test]
    async fn test_policy_override() {
        let state = SharedState::with_policies(&[(ActionKind::Search, OverlapPolicy::Reject)]);

        let _first = state.begin_action(ActionKind::Search).await.unwrap();
        let second = state.begin_action(ActionKind::Search).await;
        assert!(matches!(second, Err(tangshi_common::Error::Busy(_))));
    }

    #[tokio::test]
    async fn test_cancel_action() {
        let state = SharedState::new();
        let ticket = state.begin_action(ActionKind::Export).await.unwrap();

        assert!(state.cancel_action(ActionKind::Export).await);
        assert_eq!(state.action_state(ActionKind::Export).await, ActionState::Idle);
        assert_eq!(state.succeed_action(ticket).await, Completion::Stale);
        assert!(!state.cancel_action(ActionKind::Export).await);
    }

    #[tokio::test]
    async fn test_actions_are_independent() {
        let state = SharedState::new();
        let _speak = state.begin_action(ActionKind::Speak).await.unwrap();

        // Speaking does not block a search
        let search = state.begin_action(ActionKind::Search).await.unwrap();
        assert!(state.succeed_action(search).await.is_applied());
        assert_eq!(state.action_state(ActionKind::Speak).await, ActionState::Pending);
    }
}
