//! Alarm Storage Abstraction
//!
//! Persisted schedule entries live outside the ringing core. The core only
//! needs to remove an entry once an alarm has been discarded or stopped, but
//! the trait exposes enough for host adapters and tests to seed and inspect
//! the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{alarm::AlarmId, error::Result};

/// A persisted alarm schedule entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAlarm {
    pub id: AlarmId,
    /// When the alarm is due to fire.
    pub date_time: DateTime<Utc>,
    /// Opaque settings blob owned by the host (JSON).
    pub settings: serde_json::Value,
}

impl StoredAlarm {
    pub fn new(id: AlarmId, date_time: DateTime<Utc>, settings: serde_json::Value) -> Self {
        Self {
            id,
            date_time,
            settings,
        }
    }
}

/// Persistent alarm schedule store.
///
/// - **Android**: SharedPreferences entries keyed by alarm id
/// - **iOS**: UserDefaults
/// - **Desktop**: SQLite (`bridge_desktop::SqliteAlarmStorage`)
#[async_trait]
pub trait AlarmStorage: Send + Sync {
    /// Insert or replace an entry.
    async fn save_alarm(&self, alarm: &StoredAlarm) -> Result<()>;

    /// Remove the entry for `id`. Removing a missing entry is not an error.
    async fn unsave_alarm(&self, id: AlarmId) -> Result<()>;

    /// All persisted entries, ordered by id.
    async fn list_alarms(&self) -> Result<Vec<StoredAlarm>>;

    /// Whether an entry exists for `id`.
    async fn contains(&self, id: AlarmId) -> Result<bool> {
        Ok(self.list_alarms().await?.iter().any(|alarm| alarm.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stored_alarm_round_trips_through_json() {
        let alarm = StoredAlarm::new(
            AlarmId(3),
            Utc.with_ymd_and_hms(2026, 10, 16, 7, 0, 0).unwrap(),
            serde_json::json!({"assetAudioPath": "assets/marimba.mp3"}),
        );

        let json = serde_json::to_value(&alarm).unwrap();
        assert_eq!(json["id"], 3);
        assert!(json.get("dateTime").is_some());

        let back: StoredAlarm = serde_json::from_value(json).unwrap();
        assert_eq!(back, alarm);
    }
}
