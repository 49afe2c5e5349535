//! Vibration motor and power management.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Waveform for the vibration motor.
///
/// `timings` alternate off/on durations starting with an initial delay, as on
/// Android. When `repeat_from` is set, the motor loops from that index until
/// cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VibrationPattern {
    pub timings: Vec<Duration>,
    pub repeat_from: Option<usize>,
}

impl VibrationPattern {
    pub fn new(timings: Vec<Duration>, repeat_from: Option<usize>) -> Self {
        Self {
            timings,
            repeat_from,
        }
    }

    /// Build a pattern from millisecond timings.
    pub fn from_millis(timings: &[u64], repeat_from: Option<usize>) -> Self {
        Self::new(
            timings.iter().copied().map(Duration::from_millis).collect(),
            repeat_from,
        )
    }

    /// The alarm pattern: no initial delay, 500 ms on, 500 ms off, repeating
    /// from index 1.
    pub fn alarm() -> Self {
        Self::from_millis(&[0, 500, 500], Some(1))
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat_from.is_some()
    }

    /// A pattern is usable when it has timings and its repeat index points inside them.
    pub fn is_valid(&self) -> bool {
        !self.timings.is_empty()
            && self
                .repeat_from
                .map_or(true, |index| index < self.timings.len())
    }
}

impl Default for VibrationPattern {
    fn default() -> Self {
        Self::alarm()
    }
}

/// Vibration motor.
#[async_trait]
pub trait Vibrator: Send + Sync {
    /// Start the pattern, replacing any running one.
    async fn vibrate(&self, pattern: &VibrationPattern) -> Result<()>;

    /// Cancel any running pattern.
    async fn cancel(&self) -> Result<()>;

    /// Whether the device has a vibration motor at all.
    fn has_vibrator(&self) -> bool {
        true
    }
}

/// A held wake lock.
#[async_trait]
pub trait WakeLock: Send + Sync {
    /// Release the lock. Releasing an expired or released lock is a no-op.
    async fn release(&mut self) -> Result<()>;

    /// Whether the lock is still held (not released and not expired).
    fn is_held(&self) -> bool;
}

/// Power manager issuing partial (CPU-only) wake locks.
///
/// - **Android**: `PowerManager.PARTIAL_WAKE_LOCK` acquired with a timeout
/// - **iOS**: background task assertion
/// - **Desktop**: inhibitor bookkeeping
#[async_trait]
pub trait PowerManager: Send + Sync {
    /// Acquire a partial wake lock that the platform drops after `timeout`.
    async fn acquire_wake_lock(&self, tag: &str, timeout: Duration) -> Result<Box<dyn WakeLock>>;
}
