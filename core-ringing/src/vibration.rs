//! Vibration channel.

use bridge_traits::{VibrationPattern, Vibrator};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, RingError};
use crate::state::Resource;

/// Repeating vibration for the ringing alarm. At most one pattern runs.
pub struct VibrationChannel {
    vibrator: Arc<dyn Vibrator>,
    pattern: VibrationPattern,
    active: Mutex<bool>,
}

impl VibrationChannel {
    pub fn new(vibrator: Arc<dyn Vibrator>, pattern: VibrationPattern) -> Self {
        Self {
            vibrator,
            pattern,
            active: Mutex::new(false),
        }
    }

    /// Starts the pattern.
    ///
    /// Returns `Ok(false)` when the device has no motor; the alarm rings
    /// without vibration in that case. Starting twice is a no-op.
    pub async fn start(&self) -> Result<bool> {
        let mut active = self.active.lock().await;
        if *active {
            return Ok(true);
        }

        if !self.vibrator.has_vibrator() {
            info!("No vibration motor; skipping vibration");
            return Ok(false);
        }

        self.vibrator
            .vibrate(&self.pattern)
            .await
            .map_err(|e| RingError::acquire(Resource::Vibration, e))?;

        *active = true;
        debug!("Vibration started");
        Ok(true)
    }

    /// Cancels the pattern. No-op when not vibrating.
    ///
    /// The channel counts as stopped even when the cancel call fails.
    pub async fn stop(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        if !*active {
            return Ok(());
        }
        *active = false;

        self.vibrator
            .cancel()
            .await
            .map_err(|e| RingError::release(Resource::Vibration, e))?;

        debug!("Vibration stopped");
        Ok(())
    }

    pub async fn is_active(&self) -> bool {
        *self.active.lock().await
    }
}
