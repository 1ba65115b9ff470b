//! # Event Bus System
//!
//! Event-driven notification fan-out for the catalog core using
//! `tokio::sync::broadcast`. The core emits exactly two kinds of triggers
//! (server switched, default filter changed for a tab); caches and filter
//! coordinators subscribe and invalidate or re-resolve accordingly.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, ServerEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! let event = CoreEvent::Server(ServerEvent::Switched {
//!     server_id: "home".to_string(),
//! });
//! event_bus.emit(event).ok();
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` produces two receiver errors:
//!
//! - `RecvError::Lagged(n)`: the subscriber missed `n` events. Non-fatal;
//!   a cache subscriber that lags should invalidate everything and continue.
//! - `RecvError::Closed`: all senders dropped; treat as shutdown.

use crate::config::FilterTab;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Active-server lifecycle events
    Server(ServerEvent),
    /// Saved-filter configuration events
    Filter(FilterEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Server(e) => e.description(),
            CoreEvent::Filter(e) => e.description(),
        }
    }
}

/// Events related to the process-wide active server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ServerEvent {
    /// The active server was replaced. All cached query results are stale.
    ///
    /// Cache invalidation must happen before this event is observable; the
    /// service layer invalidates synchronously and only then emits.
    Switched {
        /// The newly active server profile id.
        server_id: String,
    },
    /// The active server was removed; no server is configured.
    Cleared,
}

impl ServerEvent {
    fn description(&self) -> &str {
        match self {
            ServerEvent::Switched { .. } => "Active server switched",
            ServerEvent::Cleared => "Active server cleared",
        }
    }
}

/// Events related to saved-filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum FilterEvent {
    /// The default saved filter for one tab changed. Only that tab's
    /// coordinator needs to re-resolve.
    DefaultChanged {
        /// The affected tab.
        tab: FilterTab,
        /// The new default saved-filter id, or `None` when cleared.
        filter_id: Option<String>,
    },
}

impl FilterEvent {
    fn description(&self) -> &str {
        match self {
            FilterEvent::DefaultChanged { .. } => "Default saved filter changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned per subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
