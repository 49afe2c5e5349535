//! Inbound commands.
//!
//! Hosts deliver commands as a flat map of extras, the shape an Android
//! intent carries:
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `id` | int | `0` |
//! | `action` | string | none; `"STOP_ALARM"` stops |
//! | `assetAudioPath` | string | required to ring |
//! | `loopAudio` | bool | `true` |
//! | `vibrate` | bool | `true` |
//! | `volume` | float | `-1` (leave the volume alone) |
//! | `fadeDuration` | float seconds | `0` |
//! | `fullScreenIntent` | bool | `true` |
//! | `showSystemUI` | bool | `true` |
//! | `notificationSettings` | JSON object or string | from `notificationTitle`/`notificationBody` |

use bridge_traits::{AlarmId, NotificationSettings};
use core_ringing::{RingError, RingRequest};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::{CoreError, Result};

pub const ACTION_STOP_ALARM: &str = "STOP_ALARM";

const DEFAULT_TITLE: &str = "Title";
const DEFAULT_BODY: &str = "Body";

/// A decoded inbound command.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCommand {
    Ring(RingRequest),
    StopAlarm { id: AlarmId },
}

impl InboundCommand {
    pub fn id(&self) -> AlarmId {
        match self {
            InboundCommand::Ring(request) => request.id,
            InboundCommand::StopAlarm { id } => *id,
        }
    }

    /// Decodes a JSON object of extras.
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(extras)) => Self::from_extras(&extras),
            Ok(other) => Err(CoreError::InvalidCommand(format!(
                "expected an object of extras, got {other}"
            ))),
            Err(e) => Err(CoreError::InvalidCommand(e.to_string())),
        }
    }

    /// Decodes intent-style extras.
    ///
    /// A stop action with id `0` is treated as a ring command, as hosts send
    /// `0` when no alarm is addressed.
    pub fn from_extras(extras: &Map<String, Value>) -> Result<Self> {
        let id = AlarmId(int(extras, "id")?.unwrap_or(0));

        let action = extras.get("action").and_then(Value::as_str);
        if action == Some(ACTION_STOP_ALARM) && id.value() != 0 {
            return Ok(InboundCommand::StopAlarm { id });
        }

        let asset_path = match extras.get("assetAudioPath") {
            Some(Value::String(path)) => path.clone(),
            Some(other) => {
                return Err(CoreError::InvalidCommand(format!(
                    "assetAudioPath must be a string, got {other}"
                )))
            }
            None => {
                return Err(RingError::InvalidRequest(format!(
                    "alarm {id} has no assetAudioPath"
                ))
                .into())
            }
        };

        let volume = float(extras, "volume")?
            .filter(|v| *v >= 0.0)
            .map(|v| v as f32);

        let fade_secs = float(extras, "fadeDuration")?.unwrap_or(0.0);
        let fade = Duration::try_from_secs_f64(fade_secs).map_err(|e| {
            CoreError::InvalidCommand(format!("fadeDuration {fade_secs} is not a duration: {e}"))
        })?;

        let request = RingRequest::new(id, asset_path)
            .with_looping(flag(extras, "loopAudio", true)?)
            .with_vibrate(flag(extras, "vibrate", true)?)
            .with_volume(volume)
            .with_fade(fade)
            .with_full_screen_intent(flag(extras, "fullScreenIntent", true)?)
            .with_system_volume_ui(flag(extras, "showSystemUI", true)?)
            .with_notification(notification(extras)?);

        Ok(InboundCommand::Ring(request))
    }
}

fn int(extras: &Map<String, Value>, key: &str) -> Result<Option<i32>> {
    match extras.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| CoreError::InvalidCommand(format!("{key} must be a 32-bit integer"))),
    }
}

fn float(extras: &Map<String, Value>, key: &str) -> Result<Option<f64>> {
    match extras.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| CoreError::InvalidCommand(format!("{key} must be a number"))),
    }
}

fn flag(extras: &Map<String, Value>, key: &str, default: bool) -> Result<bool> {
    match extras.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(CoreError::InvalidCommand(format!("{key} must be a boolean"))),
    }
}

fn notification(extras: &Map<String, Value>) -> Result<NotificationSettings> {
    let parsed = match extras.get("notificationSettings") {
        Some(Value::String(json)) => serde_json::from_str(json),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()),
        _ => {
            let text = |key: &str, fallback: &str| {
                extras
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or(fallback)
                    .to_string()
            };
            return Ok(NotificationSettings::new(
                text("notificationTitle", DEFAULT_TITLE),
                text("notificationBody", DEFAULT_BODY),
            ));
        }
    };

    parsed.map_err(|e| CoreError::InvalidCommand(format!("notificationSettings: {e}")))
}
