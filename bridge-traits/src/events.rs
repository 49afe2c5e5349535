//! Host event boundary.
//!
//! The host application learns about ringing sessions through small
//! `{id, method}` messages (an event channel on mobile, a callback on
//! desktop).

use serde::{Deserialize, Serialize};

use crate::{alarm::AlarmId, error::Result};

/// Method tag of a host message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostMethod {
    Ring,
    Stop,
}

/// Message delivered to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMessage {
    pub id: AlarmId,
    pub method: HostMethod,
}

impl HostMessage {
    pub fn ring(id: AlarmId) -> Self {
        Self {
            id,
            method: HostMethod::Ring,
        }
    }

    pub fn stop(id: AlarmId) -> Self {
        Self {
            id,
            method: HostMethod::Stop,
        }
    }
}

/// Sink forwarding messages to the host application.
///
/// Delivery is fire-and-forget; implementations must not block.
pub trait HostEventSink: Send + Sync {
    fn send(&self, message: HostMessage) -> Result<()>;
}
