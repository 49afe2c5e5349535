//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Only the capabilities a desktop process can honestly provide live here:
//! - `AlarmStorage` using a SQLite table (`sqlx`)
//! - `ForegroundHost` as in-process presence tracking
//! - `NotificationBuilder` producing presence handles
//! - `PowerManager` as timed wake-lock bookkeeping
//! - `Vibrator` as a log-only shim (no motor)
//! - `HostEventSink` over a Tokio channel
//!
//! Audio output, the audio system and the interruption sources are always
//! injected by the embedding application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ChannelHostEventSink, SqliteAlarmStorage};
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = SqliteAlarmStorage::new(SqliteAlarmStorage::default_path()).await?;
//!     let (sink, mut host_messages) = ChannelHostEventSink::new();
//!
//!     // Use in RingerConfig
//! }
//! ```

mod host;
mod power;
mod presence;
mod storage;
mod vibrator;

pub use host::ChannelHostEventSink;
pub use power::{DesktopPowerManager, DesktopWakeLock};
pub use presence::{DesktopForegroundHost, DesktopNotificationBuilder};
pub use storage::SqliteAlarmStorage;
pub use vibrator::DesktopVibrator;
