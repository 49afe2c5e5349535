//! Wake-lock bookkeeping.
//!
//! Desktop operating systems do not suspend a process that is running an
//! alarm, so the lock only records its tag and expiry. Locks expire on their
//! own once the timeout elapses, matching the timed acquire on mobile.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    PowerManager, WakeLock,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Power manager handing out timed, bookkept wake locks.
#[derive(Debug, Clone, Default)]
pub struct DesktopPowerManager {
    held: Arc<AtomicUsize>,
}

impl DesktopPowerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks acquired and not yet released or dropped.
    ///
    /// Expired locks still count until released; see [`WakeLock::is_held`].
    pub fn outstanding_locks(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PowerManager for DesktopPowerManager {
    async fn acquire_wake_lock(&self, tag: &str, timeout: Duration) -> Result<Box<dyn WakeLock>> {
        if timeout.is_zero() {
            return Err(BridgeError::OperationFailed(
                "wake lock timeout must be greater than zero".to_string(),
            ));
        }

        self.held.fetch_add(1, Ordering::SeqCst);
        debug!(tag, timeout_ms = timeout.as_millis() as u64, "Wake lock acquired");

        Ok(Box::new(DesktopWakeLock {
            tag: tag.to_string(),
            expires_at: Instant::now() + timeout,
            released: false,
            held: Arc::clone(&self.held),
        }))
    }
}

/// A timed wake lock.
#[derive(Debug)]
pub struct DesktopWakeLock {
    tag: String,
    expires_at: Instant,
    released: bool,
    held: Arc<AtomicUsize>,
}

impl DesktopWakeLock {
    fn mark_released(&mut self) {
        if !self.released {
            self.released = true;
            self.held.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl WakeLock for DesktopWakeLock {
    async fn release(&mut self) -> Result<()> {
        if !self.released {
            debug!(tag = %self.tag, "Wake lock released");
        }
        self.mark_released();
        Ok(())
    }

    fn is_held(&self) -> bool {
        !self.released && Instant::now() < self.expires_at
    }
}

impl Drop for DesktopWakeLock {
    fn drop(&mut self) {
        self.mark_released();
    }
}
