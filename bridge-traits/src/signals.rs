//! OS signal sources that can interrupt a ringing alarm.
//!
//! Each source follows the same shape: `subscribe` registers with the
//! platform (broadcast receiver, content observer, notification center) and
//! returns a [`SignalStream`]. Dropping the stream unregisters.

use async_trait::async_trait;

use crate::error::Result;

/// Stream of platform signals.
#[async_trait]
pub trait SignalStream<T>: Send {
    /// Get the next signal.
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<T>;
}

/// Telephony call state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Ringing,
    OffHook,
}

/// Display power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    On,
    Off,
}

/// Marker emitted whenever a system volume setting changed.
///
/// Observers do not carry the new levels; the reader queries
/// [`AudioSystem`](crate::audio::AudioSystem) itself, as content observers do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeSettingsChanged {
    /// The platform flagged the change as caused by this process.
    pub self_change: bool,
}

/// Telephony state transitions.
#[async_trait]
pub trait TelephonyMonitor: Send + Sync {
    async fn subscribe(&self) -> Result<Box<dyn SignalStream<CallState>>>;
}

/// Display on/off transitions.
#[async_trait]
pub trait DisplayMonitor: Send + Sync {
    async fn subscribe(&self) -> Result<Box<dyn SignalStream<DisplayState>>>;
}

/// System volume settings changes.
#[async_trait]
pub trait VolumeObserver: Send + Sync {
    async fn subscribe(&self) -> Result<Box<dyn SignalStream<VolumeSettingsChanged>>>;
}
