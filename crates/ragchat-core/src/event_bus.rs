//! Framework-agnostic conversation events.
//!
//! The EventBus lets a presentation layer (terminal, desktop shell, web view)
//! re-render when a conversation changes, without the core knowing anything
//! about rendering.
//!
//! # Example
//!
//! ```rust
//! use ragchat_core::event_bus::{ConversationEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.emit(ConversationEvent::BusyChanged { busy: true });
//!
//! // In async context:
//! // let event = rx.recv().await.unwrap();
//! # let _ = rx.try_recv();
//! ```

use serde::Serialize;
use tokio::sync::broadcast;

use crate::controller::Workflow;
use crate::session::ChatEntry;

/// Default channel capacity for the event bus.
/// Events beyond this capacity will cause slow subscribers to miss events (lag).
const DEFAULT_CAPACITY: usize = 256;

/// Something observable happened to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// A workflow started or finished submitting.
    BusyChanged { busy: bool },

    /// An entry became visible. `pending` entries are optimistic and not yet
    /// persisted.
    EntryAppended { entry: ChatEntry, pending: bool },

    /// A workflow reached its terminal state.
    WorkflowSettled { workflow: Workflow, success: bool },

    /// The view must reload the session from durable state.
    ReloadRequested,

    /// The session was reloaded and now holds `entries` entries.
    Reloaded { entries: usize },
}

/// Broadcasts conversation events to any number of subscribers.
///
/// Uses a tokio broadcast channel internally. Late subscribers only see
/// events emitted after they subscribed.
pub struct EventBus {
    sender: broadcast::Sender<ConversationEvent>,
}

impl EventBus {
    /// Create a new EventBus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new EventBus with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event. With no
    /// subscribers the event is dropped and 0 is returned.
    pub fn emit(&self, event: ConversationEvent) -> usize {
        log::trace!("Emitting {event:?}");
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all future events on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
