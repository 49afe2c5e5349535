//! # Ringer Configuration
//!
//! Builder-based configuration for the alarm ringing core.
//!
//! ## Overview
//!
//! [`RingerConfig`] holds every platform capability the ringing core talks to,
//! plus the tunables that shape a ringing session. [`RingerConfigBuilder`]
//! fails fast with an actionable [`Error::CapabilityMissing`] when a required
//! bridge was not injected.
//!
//! ## Required Capabilities
//!
//! - `AudioOutput` - plays the alarm asset
//! - `AudioSystem` - stream volumes, ringer mode, audio focus
//!
//! ## Capabilities with desktop defaults
//!
//! - `Vibrator`, `PowerManager`, `ForegroundHost`, `NotificationBuilder`,
//!   `AlarmStorage`
//!
//! When the `desktop-shims` feature is enabled these fall back to the
//! `bridge-desktop` implementations; otherwise they are required too.
//!
//! ## Optional Capabilities
//!
//! - `TelephonyMonitor`, `DisplayMonitor`, `VolumeObserver` - interruption sources
//! - `HostEventSink` - ring/stop notifications to the host application
//! - `Clock` - defaults to [`SystemClock`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::RingerConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = RingerConfig::builder()
//!     .audio_output(Arc::new(MyPlayer))
//!     .audio_system(Arc::new(MyAudioManager))
//!     .telephony(Arc::new(MyTelephony))
//!     .wake_lock_timeout(Duration::from_secs(300))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AlarmStorage, AudioOutput, AudioSystem, Clock, DisplayMonitor, ForegroundHost, HostEventSink,
    NotificationBuilder, PowerManager, SystemClock, TelephonyMonitor, VibrationPattern, Vibrator,
    VolumeObserver,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Tag attached to the ringing wake lock.
pub const DEFAULT_WAKE_LOCK_TAG: &str = "app:AlarmWakelockTag";

const MAX_WAKE_LOCK_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const MAX_SELF_STOP_DELAY: Duration = Duration::from_secs(30);

/// Toggles for optional behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Skip audio, volume and focus while the ringer is silent.
    pub respect_silent_mode: bool,
    /// Stop the alarm on call state changes.
    pub monitor_telephony: bool,
    /// Stop the alarm when the screen turns on or off.
    pub monitor_display: bool,
    /// Stop the alarm when the user changes a system volume.
    pub monitor_volume: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            respect_silent_mode: true,
            monitor_telephony: true,
            monitor_display: true,
            monitor_volume: true,
        }
    }
}

/// Tunables of a ringing session.
#[derive(Debug, Clone, PartialEq)]
pub struct RingerSettings {
    /// Upper bound on how long the CPU is kept awake per session.
    pub wake_lock_timeout: Duration,
    /// Delay before the process ends itself when a start finds nothing to do.
    pub self_stop_delay: Duration,
    pub vibration_pattern: VibrationPattern,
    /// Interval between gain steps of a fade-in.
    pub fade_step: Duration,
    pub wake_lock_tag: String,
    pub event_buffer_size: usize,
}

impl Default for RingerSettings {
    fn default() -> Self {
        Self {
            wake_lock_timeout: Duration::from_secs(5 * 60),
            self_stop_delay: Duration::from_secs(3),
            vibration_pattern: VibrationPattern::alarm(),
            fade_step: Duration::from_millis(50),
            wake_lock_tag: DEFAULT_WAKE_LOCK_TAG.to_string(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl RingerSettings {
    pub fn validate(&self) -> Result<()> {
        if self.wake_lock_timeout.is_zero() || self.wake_lock_timeout > MAX_WAKE_LOCK_TIMEOUT {
            return Err(Error::InvalidSetting {
                setting: "wake_lock_timeout",
                message: "must be greater than zero and at most one hour".to_string(),
            });
        }

        if self.self_stop_delay > MAX_SELF_STOP_DELAY {
            return Err(Error::InvalidSetting {
                setting: "self_stop_delay",
                message: "must be at most 30 seconds".to_string(),
            });
        }

        if !self.vibration_pattern.is_valid() {
            return Err(Error::InvalidSetting {
                setting: "vibration_pattern",
                message: "timings must be non-empty and the repeat index must point into them"
                    .to_string(),
            });
        }

        if self.fade_step.is_zero() {
            return Err(Error::InvalidSetting {
                setting: "fade_step",
                message: "must be greater than zero".to_string(),
            });
        }

        if self.wake_lock_tag.trim().is_empty() {
            return Err(Error::InvalidSetting {
                setting: "wake_lock_tag",
                message: "cannot be empty".to_string(),
            });
        }

        if self.event_buffer_size == 0 {
            return Err(Error::InvalidSetting {
                setting: "event_buffer_size",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Capabilities and settings of the ringing core.
///
/// Use [`RingerConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct RingerConfig {
    pub audio_output: Arc<dyn AudioOutput>,
    pub audio_system: Arc<dyn AudioSystem>,
    pub vibrator: Arc<dyn Vibrator>,
    pub power_manager: Arc<dyn PowerManager>,
    pub foreground_host: Arc<dyn ForegroundHost>,
    pub notification_builder: Arc<dyn NotificationBuilder>,
    pub alarm_storage: Arc<dyn AlarmStorage>,
    pub telephony: Option<Arc<dyn TelephonyMonitor>>,
    pub display: Option<Arc<dyn DisplayMonitor>>,
    pub volume_observer: Option<Arc<dyn VolumeObserver>>,
    pub host_event_sink: Option<Arc<dyn HostEventSink>>,
    pub clock: Arc<dyn Clock>,
    pub settings: RingerSettings,
    pub features: FeatureFlags,
}

impl fmt::Debug for RingerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingerConfig")
            .field("audio_output", &"AudioOutput { ... }")
            .field("audio_system", &"AudioSystem { ... }")
            .field("vibrator", &"Vibrator { ... }")
            .field("power_manager", &"PowerManager { ... }")
            .field("foreground_host", &"ForegroundHost { ... }")
            .field("notification_builder", &"NotificationBuilder { ... }")
            .field("alarm_storage", &"AlarmStorage { ... }")
            .field(
                "telephony",
                &self.telephony.as_ref().map(|_| "TelephonyMonitor { ... }"),
            )
            .field(
                "display",
                &self.display.as_ref().map(|_| "DisplayMonitor { ... }"),
            )
            .field(
                "volume_observer",
                &self
                    .volume_observer
                    .as_ref()
                    .map(|_| "VolumeObserver { ... }"),
            )
            .field(
                "host_event_sink",
                &self
                    .host_event_sink
                    .as_ref()
                    .map(|_| "HostEventSink { ... }"),
            )
            .field("settings", &self.settings)
            .field("features", &self.features)
            .finish()
    }
}

impl RingerConfig {
    pub fn builder() -> RingerConfigBuilder {
        RingerConfigBuilder::default()
    }

    /// Validates settings and reports monitor flags that have no source.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;

        let absent = [
            (self.features.monitor_telephony, self.telephony.is_none(), "TelephonyMonitor"),
            (self.features.monitor_display, self.display.is_none(), "DisplayMonitor"),
            (self.features.monitor_volume, self.volume_observer.is_none(), "VolumeObserver"),
        ];
        for (enabled, missing, source) in absent {
            if enabled && missing {
                tracing::info!(source, "Interruption source not provided; it will not be monitored");
            }
        }

        Ok(())
    }
}

fn capability_missing(capability: &str, purpose: &str, desktop_default: Option<&str>) -> Error {
    let desktop = match desktop_default {
        Some(default) => format!(
            "Desktop: enable the 'desktop-shims' feature to use the default {}. ",
            default
        ),
        None => String::new(),
    };

    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required {}. {}Mobile: inject the platform implementation from the host application.",
            capability, purpose, desktop
        ),
    }
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{
        DesktopForegroundHost, DesktopNotificationBuilder, DesktopPowerManager, DesktopVibrator,
        SqliteAlarmStorage,
    };
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    pub(super) fn vibrator() -> Result<Arc<dyn Vibrator>> {
        Ok(Arc::new(DesktopVibrator::new()))
    }

    pub(super) fn power_manager() -> Result<Arc<dyn PowerManager>> {
        Ok(Arc::new(DesktopPowerManager::new()))
    }

    pub(super) fn foreground_host() -> Result<Arc<dyn ForegroundHost>> {
        Ok(Arc::new(DesktopForegroundHost::new()))
    }

    pub(super) fn notification_builder() -> Result<Arc<dyn NotificationBuilder>> {
        Ok(Arc::new(DesktopNotificationBuilder::new()))
    }

    pub(super) fn alarm_storage(database_path: Option<PathBuf>) -> Result<Arc<dyn AlarmStorage>> {
        let path = database_path.unwrap_or_else(SqliteAlarmStorage::default_path);

        let init_store = |path: PathBuf| -> Result<SqliteAlarmStorage> {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| {
                    Error::Internal(format!(
                        "Failed to create Tokio runtime for default AlarmStorage: {}",
                        e
                    ))
                })?;

            runtime
                .block_on(SqliteAlarmStorage::new(path))
                .map_err(|e| Error::Internal(format!("Failed to initialize default AlarmStorage: {}", e)))
        };

        // block_on panics inside a runtime, so initialise on a scratch thread there.
        let store = match Handle::try_current() {
            Ok(_) => thread::spawn(move || init_store(path))
                .join()
                .map_err(|_| {
                    Error::Internal(
                        "Worker thread panicked while creating default AlarmStorage".to_string(),
                    )
                })??,
            Err(_) => init_store(path)?,
        };

        Ok(Arc::new(store))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    pub(super) fn vibrator() -> Result<Arc<dyn Vibrator>> {
        Err(capability_missing("Vibrator", "to vibrate while ringing", Some("DesktopVibrator")))
    }

    pub(super) fn power_manager() -> Result<Arc<dyn PowerManager>> {
        Err(capability_missing(
            "PowerManager",
            "to keep the CPU awake while ringing",
            Some("DesktopPowerManager"),
        ))
    }

    pub(super) fn foreground_host() -> Result<Arc<dyn ForegroundHost>> {
        Err(capability_missing(
            "ForegroundHost",
            "to keep the process in the foreground while ringing",
            Some("DesktopForegroundHost"),
        ))
    }

    pub(super) fn notification_builder() -> Result<Arc<dyn NotificationBuilder>> {
        Err(capability_missing(
            "NotificationBuilder",
            "to build the ringing notification",
            Some("DesktopNotificationBuilder"),
        ))
    }

    pub(super) fn alarm_storage(_database_path: Option<PathBuf>) -> Result<Arc<dyn AlarmStorage>> {
        Err(capability_missing(
            "AlarmStorage",
            "to discard alarms that cannot ring",
            Some("SqliteAlarmStorage"),
        ))
    }
}

/// Builder for [`RingerConfig`].
#[derive(Default)]
pub struct RingerConfigBuilder {
    audio_output: Option<Arc<dyn AudioOutput>>,
    audio_system: Option<Arc<dyn AudioSystem>>,
    vibrator: Option<Arc<dyn Vibrator>>,
    power_manager: Option<Arc<dyn PowerManager>>,
    foreground_host: Option<Arc<dyn ForegroundHost>>,
    notification_builder: Option<Arc<dyn NotificationBuilder>>,
    alarm_storage: Option<Arc<dyn AlarmStorage>>,
    database_path: Option<PathBuf>,
    telephony: Option<Arc<dyn TelephonyMonitor>>,
    display: Option<Arc<dyn DisplayMonitor>>,
    volume_observer: Option<Arc<dyn VolumeObserver>>,
    host_event_sink: Option<Arc<dyn HostEventSink>>,
    clock: Option<Arc<dyn Clock>>,
    settings: RingerSettings,
    features: FeatureFlags,
}

impl RingerConfigBuilder {
    /// Sets the audio output (required).
    pub fn audio_output(mut self, output: Arc<dyn AudioOutput>) -> Self {
        self.audio_output = Some(output);
        self
    }

    /// Sets the audio system (required).
    pub fn audio_system(mut self, system: Arc<dyn AudioSystem>) -> Self {
        self.audio_system = Some(system);
        self
    }

    pub fn vibrator(mut self, vibrator: Arc<dyn Vibrator>) -> Self {
        self.vibrator = Some(vibrator);
        self
    }

    pub fn power_manager(mut self, manager: Arc<dyn PowerManager>) -> Self {
        self.power_manager = Some(manager);
        self
    }

    pub fn foreground_host(mut self, host: Arc<dyn ForegroundHost>) -> Self {
        self.foreground_host = Some(host);
        self
    }

    pub fn notification_builder(mut self, builder: Arc<dyn NotificationBuilder>) -> Self {
        self.notification_builder = Some(builder);
        self
    }

    pub fn alarm_storage(mut self, storage: Arc<dyn AlarmStorage>) -> Self {
        self.alarm_storage = Some(storage);
        self
    }

    /// Location of the SQLite file backing the desktop `AlarmStorage`.
    ///
    /// Ignored when an `AlarmStorage` is injected.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn telephony(mut self, monitor: Arc<dyn TelephonyMonitor>) -> Self {
        self.telephony = Some(monitor);
        self
    }

    pub fn display(mut self, monitor: Arc<dyn DisplayMonitor>) -> Self {
        self.display = Some(monitor);
        self
    }

    pub fn volume_observer(mut self, observer: Arc<dyn VolumeObserver>) -> Self {
        self.volume_observer = Some(observer);
        self
    }

    pub fn host_event_sink(mut self, sink: Arc<dyn HostEventSink>) -> Self {
        self.host_event_sink = Some(sink);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Default: 5 minutes.
    pub fn wake_lock_timeout(mut self, timeout: Duration) -> Self {
        self.settings.wake_lock_timeout = timeout;
        self
    }

    /// Default: 3 seconds.
    pub fn self_stop_delay(mut self, delay: Duration) -> Self {
        self.settings.self_stop_delay = delay;
        self
    }

    pub fn vibration_pattern(mut self, pattern: VibrationPattern) -> Self {
        self.settings.vibration_pattern = pattern;
        self
    }

    /// Default: 50 ms.
    pub fn fade_step(mut self, step: Duration) -> Self {
        self.settings.fade_step = step;
        self
    }

    pub fn wake_lock_tag(mut self, tag: impl Into<String>) -> Self {
        self.settings.wake_lock_tag = tag.into();
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.settings.event_buffer_size = size;
        self
    }

    pub fn settings(mut self, settings: RingerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final [`RingerConfig`].
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent
    /// - [`Error::InvalidSetting`] when a tunable is out of range
    pub fn build(self) -> Result<RingerConfig> {
        // Settings are checked first so a bad value never initialises storage.
        self.settings.validate()?;

        let audio_output = self.audio_output.ok_or_else(|| {
            capability_missing("AudioOutput", "to play the alarm sound", None)
        })?;

        let audio_system = self.audio_system.ok_or_else(|| {
            capability_missing(
                "AudioSystem",
                "to manage stream volume, ringer mode and audio focus",
                None,
            )
        })?;

        let vibrator = match self.vibrator {
            Some(vibrator) => vibrator,
            None => defaults::vibrator()?,
        };

        let power_manager = match self.power_manager {
            Some(manager) => manager,
            None => defaults::power_manager()?,
        };

        let foreground_host = match self.foreground_host {
            Some(host) => host,
            None => defaults::foreground_host()?,
        };

        let notification_builder = match self.notification_builder {
            Some(builder) => builder,
            None => defaults::notification_builder()?,
        };

        let alarm_storage = match self.alarm_storage {
            Some(storage) => storage,
            None => defaults::alarm_storage(self.database_path)?,
        };

        let config = RingerConfig {
            audio_output,
            audio_system,
            vibrator,
            power_manager,
            foreground_host,
            notification_builder,
            alarm_storage,
            telephony: self.telephony,
            display: self.display,
            volume_observer: self.volume_observer,
            host_event_sink: self.host_event_sink,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            settings: self.settings,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
