//! # Event Bus System
//!
//! Typed lifecycle events for the ringing core, published over
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps [`RingingEvent`] (session lifecycle)
//!   and [`MonitorEvent`] (interruption subscription lifecycle)
//! - **EventBus**: central broadcast channel
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐  emit   ┌───────────┐  subscribe  ┌──────────────────┐
//! │ RingingSession     ├────────>│           ├────────────>│ host forwarder   │
//! │ Controller         │         │ EventBus  │             │ ({id, method})   │
//! └────────────────────┘         │ (broadcast│             └──────────────────┘
//! ┌────────────────────┐  emit   │  channel) │  subscribe  ┌──────────────────┐
//! │ InterruptionMonitor├────────>│           ├────────────>│ tests / metrics  │
//! └────────────────────┘         └───────────┘             └──────────────────┘
//! ```
//!
//! Only [`RingingEvent::Started`] and [`RingingEvent::Stopped`] cross the host
//! boundary (see [`RingingEvent::host_message`]); everything else is
//! diagnostic.
//!
//! ## Usage
//!
//! ```rust
//! use bridge_traits::AlarmId;
//! use core_runtime::events::{CoreEvent, EventBus, RingingEvent, StopReason};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Ringing(RingingEvent::Stopped {
//!     alarm_id: AlarmId(1),
//!     reason: StopReason::Requested,
//! }))
//! .ok();
//!
//! assert!(matches!(rx.recv().await, Ok(CoreEvent::Ringing(_))));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; non-fatal.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.
//!
//! `emit` fails when nobody is subscribed. Publishers in the core ignore that
//! error: a ringing session never depends on anyone listening.

use bridge_traits::{AlarmId, HostMessage};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Ringing session lifecycle
    Ringing(RingingEvent),
    /// Interruption monitor lifecycle
    Monitor(MonitorEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Ringing(e) => e.description(),
            CoreEvent::Monitor(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Ringing(RingingEvent::Rejected {
                reason: RejectionKind::ForegroundRejected | RejectionKind::AcquisitionFailed,
                ..
            }) => EventSeverity::Error,
            CoreEvent::Ringing(RingingEvent::Rejected { .. }) => EventSeverity::Warning,
            CoreEvent::Monitor(MonitorEvent::SourceUnavailable { .. }) => EventSeverity::Warning,
            CoreEvent::Ringing(RingingEvent::Started { .. })
            | CoreEvent::Ringing(RingingEvent::Stopped { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Message to forward to the host application, if this event crosses
    /// the host boundary.
    pub fn host_message(&self) -> Option<HostMessage> {
        match self {
            CoreEvent::Ringing(e) => e.host_message(),
            CoreEvent::Monitor(_) => None,
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

// ============================================================================
// Ringing Events
// ============================================================================

/// Source category of an interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterruptionKind {
    /// Telephony state changed.
    Call,
    /// Display turned on or off.
    ScreenToggle,
    /// A system volume setting was changed by the user.
    VolumeDrift,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// Explicit stop or unsave.
    Requested,
    /// Non-looping audio reached its natural end.
    PlaybackCompleted,
    /// An interruption signal stopped the alarm.
    Interrupted,
    /// Process teardown.
    Teardown,
}

/// Why a start attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionKind {
    AlreadyRinging,
    InvalidRequest,
    ForegroundRejected,
    /// A required resource could not be acquired; partial acquisitions were unwound.
    AcquisitionFailed,
}

/// Ringing session lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RingingEvent {
    /// A session acquired its resources and started ringing.
    Started {
        alarm_id: AlarmId,
        looping: bool,
        vibrate: bool,
        /// Audio was skipped because the device is silent.
        audio_suppressed: bool,
    },
    /// A stop path ran for the alarm.
    Stopped { alarm_id: AlarmId, reason: StopReason },
    /// A start attempt was refused.
    Rejected {
        alarm_id: AlarmId,
        reason: RejectionKind,
    },
    /// An interruption was attributed to the ringing alarm.
    Interrupted {
        alarm_id: AlarmId,
        kind: InterruptionKind,
    },
}

impl RingingEvent {
    fn description(&self) -> &str {
        match self {
            RingingEvent::Started { .. } => "Alarm started ringing",
            RingingEvent::Stopped { .. } => "Alarm stopped ringing",
            RingingEvent::Rejected { .. } => "Alarm start rejected",
            RingingEvent::Interrupted { .. } => "Alarm interrupted",
        }
    }

    /// `{id, method:"ring"}` on start and `{id, method:"stop"}` on stop.
    pub fn host_message(&self) -> Option<HostMessage> {
        match self {
            RingingEvent::Started { alarm_id, .. } => Some(HostMessage::ring(*alarm_id)),
            RingingEvent::Stopped { alarm_id, .. } => Some(HostMessage::stop(*alarm_id)),
            _ => None,
        }
    }
}

// ============================================================================
// Monitor Events
// ============================================================================

/// Interruption monitor lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum MonitorEvent {
    /// Signal sources were subscribed.
    Subscribed { sources: Vec<String> },
    /// All signal sources were released.
    Unsubscribed,
    /// A configured signal source could not be subscribed.
    SourceUnavailable { source: String, message: String },
}

impl MonitorEvent {
    fn description(&self) -> &str {
        match self {
            MonitorEvent::Subscribed { .. } => "Interruption sources subscribed",
            MonitorEvent::Unsubscribed => "Interruption sources released",
            MonitorEvent::SourceUnavailable { .. } => "Interruption source unavailable",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus.
///
/// Cloning is cheap; every clone publishes to the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
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

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let ringing_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Ringing(_)));
/// ```
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

    /// Only events matching `predicate` are returned by `recv()`.
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

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
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

// ============================================================================
// Tests
// ============================================================================
