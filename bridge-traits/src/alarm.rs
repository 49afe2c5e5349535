//! Alarm identifiers shared by every bridge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-assigned identifier of one logical alarm.
///
/// The host schedules alarms with integer ids; the same id is used for the
/// notification, the launch intent, the player session and the ring/stop
/// messages sent back to the host.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AlarmId(pub i32);

impl AlarmId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for AlarmId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
