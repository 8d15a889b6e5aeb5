//! Transition events and subscriptions.
//!
//! Every committed transition is published on an [`EventBus`]. Subscribers
//! filter locally, so the state machine does not need to know who listens.

use chrono::{DateTime, Utc};
use mentor_core::ProgramState;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

/// Side effects the surrounding service attaches to well-known transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleTrigger {
    /// Entering `PLAN_DRAFT`: ask the planner for a plan.
    RequestPlanGeneration,
    /// `APPROVED -> ACTIVE`: deliver the first week.
    ScheduleFirstWeek,
    /// Entering `STALLED`: start the re-engagement flow.
    StartReengagement,
}

impl LifecycleTrigger {
    pub const ALL: [LifecycleTrigger; 3] = [
        LifecycleTrigger::RequestPlanGeneration,
        LifecycleTrigger::ScheduleFirstWeek,
        LifecycleTrigger::StartReengagement,
    ];

    /// Whether this trigger fires for `from -> to`.
    pub fn fires_on(&self, from: ProgramState, to: ProgramState) -> bool {
        match self {
            LifecycleTrigger::RequestPlanGeneration => to == ProgramState::PlanDraft,
            LifecycleTrigger::ScheduleFirstWeek => {
                from == ProgramState::Approved && to == ProgramState::Active
            }
            LifecycleTrigger::StartReengagement => to == ProgramState::Stalled,
        }
    }

    /// All triggers that fire for `from -> to`.
    pub fn for_transition(from: ProgramState, to: ProgramState) -> Vec<LifecycleTrigger> {
        Self::ALL
            .into_iter()
            .filter(|t| t.fires_on(from, to))
            .collect()
    }
}

/// A committed lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub program_id: Uuid,
    pub from: ProgramState,
    pub to: ProgramState,

    /// Free-form audit note supplied by the caller.
    pub reason: Option<String>,

    /// Commit time (equal to the program's new `updated_at`).
    pub at: DateTime<Utc>,

    /// Well-known side effects this transition calls for.
    pub triggers: Vec<LifecycleTrigger>,
}

/// Filter for subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Only events for this program.
    pub program_id: Option<Uuid>,

    /// Only events leaving one of these states.
    pub from: Option<Vec<ProgramState>>,

    /// Only events entering one of these states.
    pub to: Option<Vec<ProgramState>>,
}

impl EventFilter {
    /// Create a filter for one program.
    pub fn program(program_id: Uuid) -> Self {
        Self {
            program_id: Some(program_id),
            ..Default::default()
        }
    }

    /// Create a filter for transitions entering `states`.
    pub fn entering(states: Vec<ProgramState>) -> Self {
        Self {
            to: Some(states),
            ..Default::default()
        }
    }

    /// Check if an event matches this filter.
    pub fn matches(&self, event: &TransitionEvent) -> bool {
        if let Some(id) = self.program_id {
            if event.program_id != id {
                return false;
            }
        }

        if let Some(ref from) = self.from {
            if !from.contains(&event.from) {
                return false;
            }
        }

        if let Some(ref to) = self.to {
            if !to.contains(&event.to) {
                return false;
            }
        }

        true
    }
}

/// A subscription to transition events.
pub struct TransitionSubscription {
    /// Unique ID for this subscription.
    pub id: Uuid,

    pub filter: EventFilter,

    receiver: broadcast::Receiver<TransitionEvent>,
}

impl TransitionSubscription {
    /// Wait for the next matching event. Returns `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<TransitionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(subscription = %self.id, skipped, "Subscriber lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Turn the subscription into a stream of matching events.
    pub fn into_stream(self) -> impl Stream<Item = TransitionEvent> {
        let id = self.id;
        let filter = self.filter;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(event) if filter.matches(&event) => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(subscription = %id, skipped, "Subscriber lagged behind");
                None
            }
        })
    }
}

/// Broadcast bus for transition events.
pub struct EventBus {
    sender: broadcast::Sender<TransitionEvent>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);
        Self { sender }
    }

    /// Subscribe to transition events with a filter.
    pub fn subscribe(&self, filter: EventFilter) -> TransitionSubscription {
        TransitionSubscription {
            id: Uuid::new_v4(),
            filter,
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event. Returns the number of live receivers.
    pub fn publish(&self, event: TransitionEvent) -> usize {
        // No receivers is not an error
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of live subscriptions. Dropped subscriptions are not counted.
    pub fn subscription_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(from: ProgramState, to: ProgramState) -> TransitionEvent {
        TransitionEvent {
            program_id: Uuid::new_v4(),
            from,
            to,
            reason: None,
            at: Utc::now(),
            triggers: LifecycleTrigger::for_transition(from, to),
        }
    }

    #[test]
    fn test_triggers_for_transition() {
        assert_eq!(
            LifecycleTrigger::for_transition(ProgramState::Discovery, ProgramState::PlanDraft),
            vec![LifecycleTrigger::RequestPlanGeneration]
        );
        assert_eq!(
            LifecycleTrigger::for_transition(ProgramState::Approved, ProgramState::Active),
            vec![LifecycleTrigger::ScheduleFirstWeek]
        );
        assert!(
            LifecycleTrigger::for_transition(ProgramState::Paused, ProgramState::Active).is_empty()
        );
        assert_eq!(
            LifecycleTrigger::for_transition(ProgramState::Active, ProgramState::Stalled),
            vec![LifecycleTrigger::StartReengagement]
        );
    }

    #[test]
    fn test_filter_entering() {
        let filter = EventFilter::entering(vec![ProgramState::Stalled]);
        assert!(filter.matches(&event(ProgramState::Active, ProgramState::Stalled)));
        assert!(!filter.matches(&event(ProgramState::Active, ProgramState::Paused)));
    }

    #[test]
    fn test_filter_program() {
        let e = event(ProgramState::Start, ProgramState::Discovery);
        assert!(EventFilter::program(e.program_id).matches(&e));
        assert!(!EventFilter::program(Uuid::new_v4()).matches(&e));
    }

    #[tokio::test]
    async fn test_subscription_receives_matching_events() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(EventFilter::entering(vec![ProgramState::Active]));

        assert_eq!(bus.subscription_count(), 1);

        bus.publish(event(ProgramState::Start, ProgramState::Discovery));
        bus.publish(event(ProgramState::Approved, ProgramState::Active));

        let received = sub.next().await.unwrap();
        assert_eq!(received.to, ProgramState::Active);

        drop(sub);
        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn test_dropped_subscriptions_are_released() {
        let bus = EventBus::new();
        let kept = bus.subscribe(EventFilter::default());

        for _ in 0..100 {
            let sub = bus.subscribe(EventFilter::default());
            drop(sub);
        }

        assert_eq!(bus.subscription_count(), 1);
        drop(kept);
        assert_eq!(bus.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_stream() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventFilter::default());
        let mut stream = Box::pin(sub.into_stream());

        bus.publish(event(ProgramState::Active, ProgramState::Paused));

        let received = stream.next().await.unwrap();
        assert_eq!(received.from, ProgramState::Active);
        assert_eq!(received.to, ProgramState::Paused);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(event(ProgramState::Start, ProgramState::Discovery)), 0);
    }
}
