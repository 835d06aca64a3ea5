//! Event system for academy session lifecycle changes.
//!
//! - **DomainEvent**: business events raised by the domain layer
//! - **EventHandler**: trait for reacting to events
//! - **EventPublisher**: fans events out to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Matches the entity crate's `Id`.
pub type Id = i64;

/// Domain events that represent business-level changes in the system.
/// These events are emitted after the change has been committed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Emitted once when a session is moved to `completed`, either by a teacher or
    /// because it ran past its end and buffer. Attendance finalisation listens for it.
    SessionCompleted {
        /// `quran`, `academic` or `interactive`. Session ids are only unique per kind.
        session_type: String,
        session_id: Id,
        /// The completed session as stored.
        session: Value,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::SessionCompleted { .. } => "session_completed",
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes every event to the log at `info`.
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::SessionCompleted {
                session_type,
                session_id,
                ..
            } => info!("{}: {session_type} session {session_id}", event.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Id>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &DomainEvent) {
            let DomainEvent::SessionCompleted { session_id, .. } = event;
            self.seen.lock().unwrap().push(*session_id);
        }
    }

    fn completed(session_id: Id) -> DomainEvent {
        DomainEvent::SessionCompleted {
            session_type: "academic".to_string(),
            session_id,
            session: serde_json::json!({ "id": session_id }),
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_registered_handler() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let publisher = EventPublisher::new()
            .with_handler(first.clone())
            .with_handler(second.clone());

        publisher.publish(completed(7)).await;

        assert_eq!(*first.seen.lock().unwrap(), vec![7]);
        assert_eq!(*second.seen.lock().unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn with_handler_leaves_the_original_publisher_untouched() {
        let base = EventPublisher::new();
        let extended = base.clone().with_handler(Arc::new(LoggingEventHandler));

        assert_eq!(base.handler_count(), 0);
        assert_eq!(extended.handler_count(), 1);
    }

    #[test]
    fn serializes_with_an_event_tag() {
        let json = serde_json::to_value(completed(3)).unwrap();
        assert_eq!(json["event"], "session_completed");
        assert_eq!(json["session_type"], "academic");
    }
}
