//! In-process foreground presence and notification building.
//!
//! A desktop process has no OS-level foreground service; the host keeps the
//! process alive on its own. The presence is recorded so the host UI can show
//! it, and `stop_self` is surfaced as a watch channel the host can await.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    AlarmId, ForegroundHost, LaunchIntent, NotificationBuilder, NotificationSettings,
    PresenceHandle,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct ForegroundState {
    presence: Option<PresenceHandle>,
    notification_visible: bool,
}

/// Foreground host for desktop processes.
pub struct DesktopForegroundHost {
    state: Mutex<ForegroundState>,
    stop_requested: watch::Sender<bool>,
    refuse_promotion: bool,
}

impl DesktopForegroundHost {
    pub fn new() -> Self {
        let (stop_requested, _) = watch::channel(false);
        Self {
            state: Mutex::new(ForegroundState::default()),
            stop_requested,
            refuse_promotion: false,
        }
    }

    /// A host that refuses every promotion, as a locked-down session would.
    pub fn refusing() -> Self {
        Self {
            refuse_promotion: true,
            ..Self::new()
        }
    }

    /// The presence currently promoted, if any.
    pub async fn current_presence(&self) -> Option<PresenceHandle> {
        self.state.lock().await.presence.clone()
    }

    pub async fn is_foreground(&self) -> bool {
        self.state.lock().await.presence.is_some()
    }

    pub async fn notification_visible(&self) -> bool {
        self.state.lock().await.notification_visible
    }

    /// Flips to `true` when the core asks the process to end itself.
    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_requested.subscribe()
    }

    pub fn stop_was_requested(&self) -> bool {
        *self.stop_requested.borrow()
    }
}

impl Default for DesktopForegroundHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForegroundHost for DesktopForegroundHost {
    async fn start_foreground(&self, id: AlarmId, presence: &PresenceHandle) -> Result<()> {
        if self.refuse_promotion {
            return Err(BridgeError::NotAllowed(
                "foreground promotion disabled for this process".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        state.presence = Some(presence.clone());
        state.notification_visible = true;
        self.stop_requested.send_replace(false);

        info!(alarm_id = %id, title = %presence.settings.title, "Foreground presence started");
        Ok(())
    }

    async fn stop_foreground(&self, remove_notification: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        state.presence = None;
        if remove_notification {
            state.notification_visible = false;
        }

        debug!(remove_notification, "Foreground presence stopped");
        Ok(())
    }

    async fn stop_self(&self) -> Result<()> {
        self.stop_requested.send_replace(true);
        info!("Process stop requested");
        Ok(())
    }
}

/// Builds presence handles from notification settings.
#[derive(Debug, Clone, Default)]
pub struct DesktopNotificationBuilder;

impl DesktopNotificationBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationBuilder for DesktopNotificationBuilder {
    fn build_presence(
        &self,
        settings: &NotificationSettings,
        full_screen_intent: bool,
        launch_intent: &LaunchIntent,
        id: AlarmId,
    ) -> Result<PresenceHandle> {
        if launch_intent.alarm_id != id {
            return Err(BridgeError::OperationFailed(format!(
                "launch intent for alarm {} attached to alarm {}",
                launch_intent.alarm_id, id
            )));
        }

        debug!(alarm_id = %id, full_screen_intent, "Built alarm notification");
        Ok(PresenceHandle::new(
            id,
            settings.clone(),
            full_screen_intent,
            *launch_intent,
        ))
    }
}
