//! # Event Bus System
//!
//! Broadcasts typed events from the catalog core to any number of observers
//! using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps per-domain enums
//! - **EventBus**: cloneable handle around the broadcast sender
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! Emitting never blocks. A bus with no subscribers simply drops events, and
//! slow subscribers observe `RecvError::Lagged`.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, CredentialEvent, EventBus};
//!
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::Credential(CredentialEvent::Refreshing)).ok();
//! assert!(receiver.try_recv().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::SendError};

pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Bearer credential lifecycle
    Credential(CredentialEvent),
    /// Remote catalog fetch outcomes
    Catalog(CatalogEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Credential(e) => e.description(),
            CoreEvent::Catalog(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Credential(CredentialEvent::RefreshFailed { .. }) => EventSeverity::Error,
            CoreEvent::Catalog(CatalogEvent::FetchFailed { retryable, .. }) => {
                if *retryable {
                    EventSeverity::Warning
                } else {
                    EventSeverity::Error
                }
            }
            CoreEvent::Credential(CredentialEvent::Refreshed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Events emitted by the credential cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CredentialEvent {
    /// A new credential is being requested from the issuer.
    Refreshing,
    /// A new credential was issued and cached.
    Refreshed {
        /// When the new credential expires (Unix epoch seconds).
        expires_at: i64,
    },
    /// The issuer failed; no credential is available.
    RefreshFailed {
        /// Human-readable error message.
        message: String,
    },
    /// The cached credential was discarded after the server rejected it.
    Invalidated,
}

impl CredentialEvent {
    fn description(&self) -> &str {
        match self {
            CredentialEvent::Refreshing => "Requesting a new access credential",
            CredentialEvent::Refreshed { .. } => "Access credential refreshed",
            CredentialEvent::RefreshFailed { .. } => "Access credential refresh failed",
            CredentialEvent::Invalidated => "Access credential invalidated",
        }
    }
}

/// Events emitted by the fetch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// A remote call failed and was reported to the caller as data.
    FetchFailed {
        /// Operation name, e.g. "artist_albums".
        operation: String,
        /// Classified error kind.
        error_kind: String,
        /// Whether a caller may retry after backing off.
        retryable: bool,
    },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::FetchFailed { .. } => "Catalog fetch failed",
        }
    }
}

/// Central event bus for publishing and subscribing to core events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers falling behind by more than `capacity` events receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
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

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(16);
/// let credential_events = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Credential(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events matching `predicate`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive; `None` when nothing matching is buffered.
    pub fn try_recv(&mut self) -> Option<CoreEvent> {
        while let Ok(event) = self.receiver.try_recv() {
            if self.matches(&event) {
                return Some(event);
            }
        }
        None
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
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

    fn fetch_failed(retryable: bool) -> CoreEvent {
        CoreEvent::Catalog(CatalogEvent::FetchFailed {
            operation: "new_releases".to_string(),
            error_kind: "RateLimited".to_string(),
            retryable,
        })
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
        assert!(bus
            .emit(CoreEvent::Credential(CredentialEvent::Refreshing))
            .is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Credential(CredentialEvent::Refreshed {
            expires_at: 1_700_000_000,
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Catalog(_)));

        bus.emit(CoreEvent::Credential(CredentialEvent::Refreshing))
            .ok();
        bus.emit(fetch_failed(true)).ok();

        assert_eq!(stream.recv().await.unwrap(), fetch_failed(true));
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(fetch_failed(true).severity(), EventSeverity::Warning);
        assert_eq!(fetch_failed(false).severity(), EventSeverity::Error);
        assert_eq!(
            CoreEvent::Credential(CredentialEvent::RefreshFailed {
                message: "401".to_string()
            })
            .severity(),
            EventSeverity::Error
        );
        assert_eq!(
            CoreEvent::Credential(CredentialEvent::Refreshing).severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Credential(CredentialEvent::Refreshed { expires_at: 42 });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Credential");
        assert_eq!(json["payload"]["event"], "Refreshed");
        assert_eq!(json["payload"]["expires_at"], 42);

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
