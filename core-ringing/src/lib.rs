//! # Alarm Ringing Core
//!
//! Drives one ringing alarm at a time: audio, vibration, volume, audio focus,
//! foreground presence and a bounded wake lock, all acquired in a fixed order
//! and released together.
//!
//! ## Overview
//!
//! - [`RingingSessionController`] owns the session and sequences resources
//! - [`AudioChannel`], [`VibrationChannel`] and [`VolumeChannel`] wrap the
//!   platform bridges with idempotent start/stop semantics
//! - [`InterruptionMonitor`] turns calls, screen toggles and user volume
//!   changes into interruptions for the active alarm
//!
//! Lifecycle changes are published on the
//! [`EventBus`](core_runtime::events::EventBus) as
//! [`RingingEvent`](core_runtime::events::RingingEvent)s.
//!
//! ## Usage
//!
//! ```ignore
//! use core_ringing::{RingRequest, RingingSessionController};
//! use core_runtime::events::EventBus;
//!
//! let controller = RingingSessionController::new(&config, EventBus::new(64));
//! controller.start(RingRequest::new(1, "assets/alarm.mp3")).await?;
//! // ...
//! controller.stop(1.into()).await;
//! ```

pub mod audio;
pub mod controller;
pub mod error;
pub mod monitor;
pub mod request;
pub mod signal;
pub mod state;
pub mod vibration;
pub mod volume;

pub use audio::{AudioChannel, CompletionCallback};
pub use controller::{RingingSessionController, Started};
pub use error::{Result, RingError};
pub use monitor::{
    InterruptionEvent, InterruptionMonitor, MonitorState, SignalSources, VolumeShadow,
};
pub use request::{RingRequest, MAX_FADE_DURATION};
pub use signal::ControlSignal;
pub use state::{Resource, ResourceFlags, SessionSnapshot};
pub use vibration::VibrationChannel;
pub use volume::VolumeChannel;
