//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the alarm ringing core and the
//! platform-specific implementations. Each trait represents an OS capability
//! the core needs while an alarm rings, but which must be implemented
//! differently per platform (Android, iOS, desktop).
//!
//! ## Traits
//!
//! ### Audio
//! - [`AudioOutput`](audio::AudioOutput) - Player for a single alarm asset per alarm id
//! - [`AudioSystem`](audio::AudioSystem) - Stream volumes, ringer mode, audio focus
//!
//! ### Device
//! - [`Vibrator`](device::Vibrator) - Vibration motor
//! - [`PowerManager`](device::PowerManager) - Bounded CPU wake locks
//!
//! ### Presence
//! - [`ForegroundHost`](presence::ForegroundHost) - Foreground/long-running presence
//! - [`NotificationBuilder`](presence::NotificationBuilder) - Builds the presence notification
//!
//! ### Interruption signals
//! - [`TelephonyMonitor`](signals::TelephonyMonitor) - Call state transitions
//! - [`DisplayMonitor`](signals::DisplayMonitor) - Screen on/off transitions
//! - [`VolumeObserver`](signals::VolumeObserver) - System volume setting changes
//!
//! ### Host integration
//! - [`AlarmStorage`](storage::AlarmStorage) - Persisted alarm schedule entries
//! - [`HostEventSink`](events::HostEventSink) - Ring/stop notifications to the host app
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Storage, presence, power, vibration |
//! | Android  | Host application    | 📋 Injected by the host |
//! | iOS      | Host application    | 📋 Injected by the host |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability is
//! missing (see `core_runtime::config::RingerConfigBuilder::build`).
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map platform refusals (foreground start not allowed, security
//! exceptions) to [`BridgeError::NotAllowed`] or
//! [`BridgeError::PermissionDenied`] so the core can tell a policy rejection
//! from a transient failure.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared between the controller, the interruption monitor, and playback
//! watcher tasks.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::device::{Vibrator, VibrationPattern};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct AndroidVibrator { /* JNI handle */ }
//!
//! #[async_trait]
//! impl Vibrator for AndroidVibrator {
//!     async fn vibrate(&self, pattern: &VibrationPattern) -> Result<()> {
//!         todo!()
//!     }
//!
//!     async fn cancel(&self) -> Result<()> {
//!         todo!()
//!     }
//! }
//! ```

pub mod alarm;
pub mod audio;
pub mod device;
pub mod error;
pub mod events;
pub mod presence;
pub mod signals;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use alarm::AlarmId;
pub use audio::{
    AudioOutput, AudioStream, AudioSystem, FocusGrant, FocusRequest, PlaybackCompletion,
    PlaybackEnd, RingerMode,
};
pub use device::{PowerManager, VibrationPattern, Vibrator, WakeLock};
pub use events::{HostEventSink, HostMessage, HostMethod};
pub use presence::{
    ForegroundHost, ForegroundServiceType, LaunchIntent, NotificationBuilder, NotificationSettings,
    PresenceHandle,
};
pub use signals::{
    CallState, DisplayMonitor, DisplayState, SignalStream, TelephonyMonitor,
    VolumeObserver, VolumeSettingsChanged,
};
pub use storage::{AlarmStorage, StoredAlarm};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
