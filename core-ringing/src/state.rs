//! Session state owned by the controller.

use bridge_traits::{AlarmId, PresenceHandle, WakeLock};
use serde::Serialize;
use std::fmt;

/// OS resources a ringing session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    AudioFocus,
    WakeLock,
    Foreground,
    Vibration,
    Volume,
    Audio,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::AudioFocus => "audio_focus",
            Resource::WakeLock => "wake_lock",
            Resource::Foreground => "foreground",
            Resource::Vibration => "vibration",
            Resource::Volume => "volume",
            Resource::Audio => "audio",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which resources are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceFlags {
    pub audio_focus: bool,
    pub wake_lock: bool,
    pub foreground: bool,
    pub vibration: bool,
    pub volume_altered: bool,
    pub audio: bool,
}

impl ResourceFlags {
    pub fn any(&self) -> bool {
        self.audio_focus
            || self.wake_lock
            || self.foreground
            || self.vibration
            || self.volume_altered
            || self.audio
    }

    pub fn held(&self) -> Vec<Resource> {
        [
            (self.audio_focus, Resource::AudioFocus),
            (self.wake_lock, Resource::WakeLock),
            (self.foreground, Resource::Foreground),
            (self.vibration, Resource::Vibration),
            (self.volume_altered, Resource::Volume),
            (self.audio, Resource::Audio),
        ]
        .into_iter()
        .filter_map(|(held, resource)| held.then_some(resource))
        .collect()
    }
}

/// Mutable state of the single ringing session.
///
/// Only the controller touches this, always under its session lock.
#[derive(Default)]
pub(crate) struct SessionState {
    pub active_id: Option<AlarmId>,
    /// Music stream level before the session changed it.
    pub captured_volume: Option<u32>,
    pub flags: ResourceFlags,
    pub wake_lock: Option<Box<dyn WakeLock>>,
    pub presence: Option<PresenceHandle>,
}

impl SessionState {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active_id: self.active_id,
            captured_volume: self.captured_volume,
            flags: self.flags,
        }
    }
}

/// Read-only view of the session, for queries and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub active_id: Option<AlarmId>,
    pub captured_volume: Option<u32>,
    pub flags: ResourceFlags,
}

impl SessionSnapshot {
    /// `true` when nothing is active and nothing is held.
    pub fn is_idle(&self) -> bool {
        self.active_id.is_none() && !self.flags.any() && self.captured_volume.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_report_held_resources() {
        let flags = ResourceFlags {
            foreground: true,
            vibration: true,
            ..ResourceFlags::default()
        };

        assert!(flags.any());
        assert_eq!(flags.held(), vec![Resource::Foreground, Resource::Vibration]);
        assert!(!ResourceFlags::default().any());
    }

    #[test]
    fn test_default_state_is_idle() {
        let state = SessionState::default();
        assert!(state.snapshot().is_idle());
    }

    #[test]
    fn test_snapshot_with_active_id_is_not_idle() {
        let state = SessionState {
            active_id: Some(AlarmId(1)),
            ..SessionState::default()
        };
        assert!(!state.snapshot().is_idle());
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(Resource::AudioFocus.to_string(), "audio_focus");
        assert_eq!(
            serde_json::to_string(&Resource::WakeLock).unwrap(),
            "\"wake_lock\""
        );
    }
}
