//! Signals delivered to the controller's control loop.

use bridge_traits::AlarmId;

use crate::monitor::InterruptionEvent;

/// Asynchronous inputs that end a session without a caller asking.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSignal {
    /// An interruption source fired while an alarm was targeted.
    Interrupted(InterruptionEvent),
    /// A non-looping session reached the end of its asset.
    PlaybackCompleted(AlarmId),
}
