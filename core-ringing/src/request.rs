//! Ring requests.

use bridge_traits::{AlarmId, NotificationSettings};
use std::time::Duration;

use crate::error::{RingError, Result};

/// Longest accepted fade-in.
pub const MAX_FADE_DURATION: Duration = Duration::from_secs(60 * 60);

/// Immutable description of one alarm to ring.
#[derive(Debug, Clone, PartialEq)]
pub struct RingRequest {
    pub id: AlarmId,
    pub asset_path: String,
    pub looping: bool,
    pub vibrate: bool,
    /// Normalized target for the music stream. `None` leaves the volume alone.
    pub volume: Option<f32>,
    /// Gain ramps from silence to full over this duration. Zero starts at full gain.
    pub fade_duration: Duration,
    pub show_system_volume_ui: bool,
    pub full_screen_intent: bool,
    pub notification: NotificationSettings,
}

impl RingRequest {
    /// A looping, vibrating request with the default notification text.
    pub fn new(id: impl Into<AlarmId>, asset_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            asset_path: asset_path.into(),
            looping: true,
            vibrate: true,
            volume: None,
            fade_duration: Duration::ZERO,
            show_system_volume_ui: false,
            full_screen_intent: true,
            notification: NotificationSettings::new("Title", "Body"),
        }
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_vibrate(mut self, vibrate: bool) -> Self {
        self.vibrate = vibrate;
        self
    }

    pub fn with_volume(mut self, volume: Option<f32>) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_fade(mut self, fade: Duration) -> Self {
        self.fade_duration = fade;
        self
    }

    pub fn with_system_volume_ui(mut self, show: bool) -> Self {
        self.show_system_volume_ui = show;
        self
    }

    pub fn with_full_screen_intent(mut self, full_screen: bool) -> Self {
        self.full_screen_intent = full_screen;
        self
    }

    pub fn with_notification(mut self, notification: NotificationSettings) -> Self {
        self.notification = notification;
        self
    }

    /// Checks the fields that need no platform access.
    pub fn validate(&self) -> Result<()> {
        if self.asset_path.trim().is_empty() {
            return Err(RingError::InvalidRequest(format!(
                "alarm {} has an empty asset path",
                self.id
            )));
        }

        if self.fade_duration > MAX_FADE_DURATION {
            return Err(RingError::InvalidRequest(format!(
                "fade of {:?} for alarm {} exceeds {:?}",
                self.fade_duration, self.id, MAX_FADE_DURATION
            )));
        }

        if let Some(volume) = self.volume {
            if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
                return Err(RingError::InvalidRequest(format!(
                    "volume {} for alarm {} is outside [0, 1]",
                    volume, self.id
                )));
            }
        }

        Ok(())
    }
}
