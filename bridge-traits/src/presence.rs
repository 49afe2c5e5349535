//! Foreground presence and notification abstractions.
//!
//! While an alarm rings the process must stay alive and visible: on Android
//! this is a foreground service bound to a notification, on iOS an active
//! audio session with a local notification. The core asks the
//! [`NotificationBuilder`] for a [`PresenceHandle`] and hands it to the
//! [`ForegroundHost`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{alarm::AlarmId, error::Result};

/// User-visible notification content supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub title: String,
    pub body: String,
    /// Label of the stop action button, when one should be shown.
    #[serde(default)]
    pub stop_button: Option<String>,
    /// Platform icon resource name.
    #[serde(default)]
    pub icon: Option<String>,
}

impl NotificationSettings {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            stop_button: None,
            icon: None,
        }
    }

    pub fn with_stop_button(mut self, label: impl Into<String>) -> Self {
        self.stop_button = Some(label.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Intent that brings the host application to the front when the
/// notification is tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchIntent {
    /// Request code; one per alarm so intents do not overwrite each other.
    pub alarm_id: AlarmId,
    pub immutable: bool,
    pub update_current: bool,
}

impl LaunchIntent {
    pub fn for_alarm(alarm_id: AlarmId) -> Self {
        Self {
            alarm_id,
            immutable: true,
            update_current: true,
        }
    }
}

/// Kind of foreground work declared to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundServiceType {
    MediaPlayback,
}

/// Built presence, ready to be promoted to the foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceHandle {
    /// Opaque token identifying this presence instance.
    pub token: Uuid,
    pub alarm_id: AlarmId,
    pub settings: NotificationSettings,
    pub full_screen_intent: bool,
    pub launch_intent: LaunchIntent,
    pub service_type: ForegroundServiceType,
}

impl PresenceHandle {
    pub fn new(
        alarm_id: AlarmId,
        settings: NotificationSettings,
        full_screen_intent: bool,
        launch_intent: LaunchIntent,
    ) -> Self {
        Self {
            token: Uuid::new_v4(),
            alarm_id,
            settings,
            full_screen_intent,
            launch_intent,
            service_type: ForegroundServiceType::MediaPlayback,
        }
    }
}

/// Builds the notification backing the foreground presence.
pub trait NotificationBuilder: Send + Sync {
    fn build_presence(
        &self,
        settings: &NotificationSettings,
        full_screen_intent: bool,
        launch_intent: &LaunchIntent,
        id: AlarmId,
    ) -> Result<PresenceHandle>;
}

/// Host process lifecycle for the ringing window.
#[async_trait]
pub trait ForegroundHost: Send + Sync {
    /// Promote the process to the foreground with `presence` shown.
    ///
    /// Platforms refusing the promotion (background start restrictions,
    /// missing permission) must return
    /// [`BridgeError::NotAllowed`](crate::BridgeError::NotAllowed) or
    /// [`BridgeError::PermissionDenied`](crate::BridgeError::PermissionDenied).
    async fn start_foreground(&self, id: AlarmId, presence: &PresenceHandle) -> Result<()>;

    /// Leave the foreground, optionally removing the notification.
    async fn stop_foreground(&self, remove_notification: bool) -> Result<()>;

    /// Allow the platform to terminate the hosting process/service.
    async fn stop_self(&self) -> Result<()>;
}
