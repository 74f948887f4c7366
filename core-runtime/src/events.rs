//! # Event Bus System
//!
//! Broadcasts typed events from the account core to any number of listeners
//! using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enums, one per domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! The login session publishes through the bus when it is registered as a
//! session observer, so UI layers that prefer a channel over a callback can
//! subscribe here instead.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(16);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Auth(AuthEvent::LoginStateChanged { logged_in: true }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(
//!     event,
//!     CoreEvent::Auth(AuthEvent::LoginStateChanged { logged_in: true })
//! ));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   The subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. Treat as shutdown.
//!
//! Emitting with no subscribers returns `SendError`; publishers that do not
//! care whether anyone is listening should ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

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
    /// Account and credential events
    Auth(AuthEvent),
}

impl CoreEvent {
    /// Human-readable summary of the event
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
        }
    }

    /// Severity used by hosts that route events to notifications
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::LoginStateChanged { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Account lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// The logged-in flag was (re)announced after login, logout or reset
    LoginStateChanged { logged_in: bool },

    /// The consent page was opened for these space-separated scopes
    AuthorizationRequested { scopes: String },

    /// A new access token was stored; `expires_at` is Unix seconds
    TokenRefreshed { expires_at: i64 },

    /// An account operation failed
    AuthError { message: String, recoverable: bool },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::LoginStateChanged { logged_in: true } => "User logged in",
            AuthEvent::LoginStateChanged { logged_in: false } => "User logged out",
            AuthEvent::AuthorizationRequested { .. } => "Authorization requested",
            AuthEvent::TokenRefreshed { .. } => "Access token refreshed",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for broadcasting core events.
///
/// Cloning the bus yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus holding up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event, returning the number of subscribers that received it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscription.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Creates a filtered stream over a new subscription.
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

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

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events rejected by a predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events matching `predicate`
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Waits for the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns the next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_changed(logged_in: bool) -> CoreEvent {
        CoreEvent::Auth(AuthEvent::LoginStateChanged { logged_in })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(state_changed(false)).is_err());
    }

    #[tokio::test]
    async fn test_event_reaches_every_subscriber() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.emit(state_changed(true)).unwrap(), 2);

        assert_eq!(first.recv().await.unwrap(), state_changed(true));
        assert_eq!(second.recv().await.unwrap(), state_changed(true));
    }

    #[tokio::test]
    async fn test_event_stream_filter() {
        let bus = EventBus::new(10);
        let mut stream = bus.stream().filter(|event| {
            matches!(event, CoreEvent::Auth(AuthEvent::LoginStateChanged { .. }))
        });

        bus.emit(CoreEvent::Auth(AuthEvent::AuthorizationRequested {
            scopes: "profile".to_string(),
        }))
        .unwrap();
        bus.emit(state_changed(false)).unwrap();

        assert_eq!(stream.recv().await.unwrap(), state_changed(false));
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut stream = bus.stream();

        for expires_at in 0..4 {
            bus.emit(CoreEvent::Auth(AuthEvent::TokenRefreshed { expires_at }))
                .unwrap();
        }

        assert!(matches!(stream.try_recv(), Some(Err(RecvError::Lagged(2)))));
    }

    #[test]
    fn test_event_severity_and_description() {
        let error = CoreEvent::Auth(AuthEvent::AuthError {
            message: "Token exchange failed".to_string(),
            recoverable: true,
        });
        assert_eq!(error.severity(), EventSeverity::Error);
        assert_eq!(state_changed(true).severity(), EventSeverity::Info);
        assert_eq!(state_changed(true).description(), "User logged in");
        assert_eq!(state_changed(false).description(), "User logged out");
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&state_changed(true)).unwrap();
        assert_eq!(
            json,
            r#"{"type":"Auth","payload":{"event":"LoginStateChanged","logged_in":true}}"#
        );
    }
}
