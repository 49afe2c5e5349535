//! Volume and focus channel.
//!
//! Wraps [`AudioSystem`] for the three things a session does to the device
//! audio: capture and override the music stream level, read the ringer mode,
//! and claim transient audio focus. Only the release of focus reports an
//! error; everything else degrades to a logged warning so a flaky audio
//! service never blocks an alarm.

use bridge_traits::{AudioStream, AudioSystem, FocusRequest, RingerMode};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, RingError};
use crate::state::Resource;

pub struct VolumeChannel {
    system: Arc<dyn AudioSystem>,
}

impl VolumeChannel {
    pub fn new(system: Arc<dyn AudioSystem>) -> Self {
        Self { system }
    }

    /// Current ringer mode. Read failures count as [`RingerMode::Normal`].
    pub async fn ringer_mode(&self) -> RingerMode {
        match self.system.ringer_mode().await {
            Ok(mode) => mode,
            Err(e) => {
                warn!(error = %e, "Failed to read ringer mode; assuming normal");
                RingerMode::Normal
            }
        }
    }

    /// Music stream level, if readable.
    pub async fn capture(&self) -> Option<u32> {
        match self.system.stream_volume(AudioStream::Music).await {
            Ok(level) => Some(level),
            Err(e) => {
                warn!(error = %e, "Failed to read music volume");
                None
            }
        }
    }

    /// Sets the music stream to `volume` (`0.0..=1.0`) of its maximum.
    ///
    /// Returns whether the level was changed.
    pub async fn set(&self, volume: f32, show_ui: bool) -> bool {
        let max = match self.system.max_stream_volume(AudioStream::Music).await {
            Ok(max) => max,
            Err(e) => {
                warn!(error = %e, "Failed to read maximum music volume");
                return false;
            }
        };

        let level = (volume.clamp(0.0, 1.0) * max as f32).round() as u32;
        match self
            .system
            .set_stream_volume(AudioStream::Music, level, show_ui)
            .await
        {
            Ok(()) => {
                debug!(level, max, "Music volume set");
                true
            }
            Err(e) => {
                warn!(level, error = %e, "Failed to set music volume");
                false
            }
        }
    }

    /// Puts the music stream back to a captured level, without UI.
    pub async fn restore(&self, level: u32) {
        match self
            .system
            .set_stream_volume(AudioStream::Music, level, false)
            .await
        {
            Ok(()) => debug!(level, "Music volume restored"),
            Err(e) => warn!(
                level,
                resource = Resource::Volume.as_str(),
                error = %e,
                "Failed to restore music volume"
            ),
        }
    }

    /// Requests exclusive transient focus. Returns whether it was granted.
    pub async fn request_focus(&self) -> bool {
        match self.system.request_focus(FocusRequest::alarm()).await {
            Ok(grant) if grant.is_granted() => true,
            Ok(grant) => {
                warn!(?grant, "Audio focus not granted; ringing anyway");
                false
            }
            Err(e) => {
                warn!(error = %e, "Audio focus request failed; ringing anyway");
                false
            }
        }
    }

    pub async fn abandon_focus(&self) -> Result<()> {
        self.system
            .abandon_focus()
            .await
            .map_err(|e| RingError::release(Resource::AudioFocus, e))
    }

    /// Current music and ring stream levels, for drift detection.
    pub async fn levels(&self) -> Option<(u32, u32)> {
        let music = self.system.stream_volume(AudioStream::Music).await.ok()?;
        let ring = self.system.stream_volume(AudioStream::Ring).await.ok()?;
        Some((music, ring))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::FocusGrant;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Audio {}

        #[async_trait]
        impl AudioSystem for Audio {
            async fn stream_volume(&self, stream: AudioStream) -> BridgeResult<u32>;
            async fn max_stream_volume(&self, stream: AudioStream) -> BridgeResult<u32>;
            async fn set_stream_volume(&self, stream: AudioStream, level: u32, show_ui: bool) -> BridgeResult<()>;
            async fn ringer_mode(&self) -> BridgeResult<RingerMode>;
            async fn request_focus(&self, request: FocusRequest) -> BridgeResult<FocusGrant>;
            async fn abandon_focus(&self) -> BridgeResult<()>;
        }
    }

    #[tokio::test]
    async fn test_set_rounds_against_stream_maximum() {
        let mut audio = MockAudio::new();
        audio
            .expect_max_stream_volume()
            .with(eq(AudioStream::Music))
            .returning(|_| Ok(15));
        audio
            .expect_set_stream_volume()
            .with(eq(AudioStream::Music), eq(12), eq(true))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let volume = VolumeChannel::new(Arc::new(audio));
        assert!(volume.set(0.8, true).await);
    }

    #[tokio::test]
    async fn test_set_failure_is_reported_not_raised() {
        let mut audio = MockAudio::new();
        audio.expect_max_stream_volume().returning(|_| Ok(15));
        audio
            .expect_set_stream_volume()
            .returning(|_, _, _| Err(BridgeError::PermissionDenied("dnd".to_string())));

        let volume = VolumeChannel::new(Arc::new(audio));
        assert!(!volume.set(0.5, false).await);
    }

    #[tokio::test]
    async fn test_restore_never_shows_ui() {
        let mut audio = MockAudio::new();
        audio
            .expect_set_stream_volume()
            .with(eq(AudioStream::Music), eq(4), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(()));

        VolumeChannel::new(Arc::new(audio)).restore(4).await;
    }

    #[tokio::test]
    async fn test_unreadable_ringer_mode_counts_as_normal() {
        let mut audio = MockAudio::new();
        audio
            .expect_ringer_mode()
            .returning(|| Err(BridgeError::NotAvailable("audio service".to_string())));

        let volume = VolumeChannel::new(Arc::new(audio));
        assert_eq!(volume.ringer_mode().await, RingerMode::Normal);
    }

    #[tokio::test]
    async fn test_focus_uses_alarm_request() {
        let mut audio = MockAudio::new();
        audio
            .expect_request_focus()
            .with(eq(FocusRequest::alarm()))
            .times(1)
            .returning(|_| Ok(FocusGrant::Delayed));

        let volume = VolumeChannel::new(Arc::new(audio));
        assert!(!volume.request_focus().await);
    }

    #[tokio::test]
    async fn test_abandon_failure_names_focus() {
        let mut audio = MockAudio::new();
        audio
            .expect_abandon_focus()
            .returning(|| Err(BridgeError::OperationFailed("no focus".to_string())));

        let err = VolumeChannel::new(Arc::new(audio))
            .abandon_focus()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RingError::ResourceReleaseFailure {
                resource: Resource::AudioFocus,
                ..
            }
        ));
    }
}
