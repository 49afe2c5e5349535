//! Log-only vibrator for machines without a vibration motor.

use async_trait::async_trait;
use bridge_traits::{error::Result, VibrationPattern, Vibrator};
use tokio::sync::Mutex;
use tracing::debug;

/// Records the running pattern instead of driving hardware.
#[derive(Debug, Default)]
pub struct DesktopVibrator {
    running: Mutex<Option<VibrationPattern>>,
}

impl DesktopVibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current_pattern(&self) -> Option<VibrationPattern> {
        self.running.lock().await.clone()
    }
}

#[async_trait]
impl Vibrator for DesktopVibrator {
    async fn vibrate(&self, pattern: &VibrationPattern) -> Result<()> {
        *self.running.lock().await = Some(pattern.clone());
        debug!(
            steps = pattern.timings.len(),
            repeat_from = ?pattern.repeat_from,
            "Vibration started (no motor)"
        );
        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        if self.running.lock().await.take().is_some() {
            debug!("Vibration cancelled");
        }
        Ok(())
    }

    fn has_vibrator(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pattern_is_recorded_until_cancelled() {
        let vibrator = DesktopVibrator::new();
        assert!(!vibrator.has_vibrator());

        vibrator.vibrate(&VibrationPattern::alarm()).await.unwrap();
        assert_eq!(
            vibrator.current_pattern().await,
            Some(VibrationPattern::alarm())
        );

        vibrator.cancel().await.unwrap();
        vibrator.cancel().await.unwrap();
        assert_eq!(vibrator.current_pattern().await, None);
    }
}
