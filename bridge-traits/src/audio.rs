//! Audio bridge traits.
//!
//! Two capabilities are split here: the player that renders one alarm asset
//! per alarm id ([`AudioOutput`]) and the device-wide audio system that owns
//! stream volumes, the ringer mode and audio focus ([`AudioSystem`]). Decoding
//! and device routing stay on the host side; the core only drives gain,
//! looping and lifecycle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{alarm::AlarmId, error::Result};

/// How a player session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// The asset reached its natural end.
    Completed,
    /// The session was stopped or released before reaching the end.
    Released,
    /// The player failed while rendering.
    Failed(String),
}

/// One-shot completion signal for a player session.
#[async_trait]
pub trait PlaybackCompletion: Send {
    /// Wait until the session ends.
    ///
    /// Looping sessions only return once released or failed.
    async fn wait(&mut self) -> PlaybackEnd;
}

/// Platform audio player.
///
/// Implementations keep one native player per alarm id. `play` must return
/// once playback has been started; it must not block until the asset ends.
///
/// - **Android**: `MediaPlayer` with `USAGE_ALARM` attributes
/// - **iOS**: `AVAudioPlayer` inside an active audio session
/// - **Desktop**: any output device backend
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Check that the asset can be opened, without starting playback.
    ///
    /// Returns [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable)
    /// when the asset cannot be resolved.
    async fn resolve(&self, asset: &str) -> Result<()>;

    /// Start playing `asset` for `id` at the given gain (`0.0..=1.0`).
    async fn play(
        &self,
        id: AlarmId,
        asset: &str,
        looping: bool,
        gain: f32,
    ) -> Result<Box<dyn PlaybackCompletion>>;

    /// Adjust the gain of a running session (`0.0..=1.0`).
    async fn set_gain(&self, id: AlarmId, gain: f32) -> Result<()>;

    /// Stop and release the player for `id`.
    async fn stop(&self, id: AlarmId) -> Result<()>;
}

/// System audio streams the core reads or alters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioStream {
    Music,
    Ring,
    Alarm,
}

/// Device ringer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingerMode {
    Normal,
    Vibrate,
    /// Silent or do-not-disturb.
    Silent,
}

impl RingerMode {
    /// Returns `true` when the device asked for no audible output.
    pub fn is_silent(&self) -> bool {
        matches!(self, RingerMode::Silent)
    }
}

/// Audio focus request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRequest {
    /// Stream the focus is claimed for.
    pub stream: AudioStream,
    /// Other apps must pause rather than duck.
    pub exclusive: bool,
    /// Focus is held for a short, bounded period.
    pub transient: bool,
}

impl FocusRequest {
    /// Exclusive, transient focus for an alarm.
    pub fn alarm() -> Self {
        Self {
            stream: AudioStream::Alarm,
            exclusive: true,
            transient: true,
        }
    }
}

/// Outcome of an audio focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusGrant {
    Granted,
    Delayed,
    Denied,
}

impl FocusGrant {
    pub fn is_granted(&self) -> bool {
        matches!(self, FocusGrant::Granted)
    }
}

/// Device audio system: stream volumes, ringer mode and focus.
///
/// Volume levels are integer steps in `0..=max_stream_volume(stream)`, as the
/// platforms expose them.
#[async_trait]
pub trait AudioSystem: Send + Sync {
    /// Current volume level of `stream`.
    async fn stream_volume(&self, stream: AudioStream) -> Result<u32>;

    /// Maximum volume level of `stream`.
    async fn max_stream_volume(&self, stream: AudioStream) -> Result<u32>;

    /// Set the volume level of `stream`, optionally showing the system volume UI.
    async fn set_stream_volume(&self, stream: AudioStream, level: u32, show_ui: bool)
        -> Result<()>;

    /// Current ringer mode.
    async fn ringer_mode(&self) -> Result<RingerMode>;

    /// Request audio focus.
    async fn request_focus(&self, request: FocusRequest) -> Result<FocusGrant>;

    /// Abandon any focus previously granted to this process.
    async fn abandon_focus(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_focus_request_is_exclusive_and_transient() {
        let request = FocusRequest::alarm();
        assert_eq!(request.stream, AudioStream::Alarm);
        assert!(request.exclusive);
        assert!(request.transient);
    }

    #[test]
    fn only_silent_ringer_mode_is_silent() {
        assert!(RingerMode::Silent.is_silent());
        assert!(!RingerMode::Vibrate.is_silent());
        assert!(!RingerMode::Normal.is_silent());
    }

    #[test]
    fn focus_grant_helpers() {
        assert!(FocusGrant::Granted.is_granted());
        assert!(!FocusGrant::Delayed.is_granted());
        assert!(!FocusGrant::Denied.is_granted());
    }
}
