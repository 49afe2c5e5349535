//! Core service façade and bootstrap helpers.
//!
//! This crate wires a [`RingerConfig`] (host-provided bridges plus optional
//! desktop defaults) into the ringing core and exposes the command surface a
//! host's alarm service calls: deliver an inbound command, stop, destroy.
//! Desktop apps typically enable the `desktop-shims` feature, which lets
//! [`RingerConfig::builder`] fill storage, presence, power and vibration with
//! the implementations from `bridge-desktop`.
//!
//! ## Routing
//!
//! ```text
//! inbound command ─┬─ an alarm is ringing ───────────────┐
//!                  ├─ STOP_ALARM with a nonzero id ──────┼─> unsave(id) ─> stop(id)
//!                  └─ ring request ─> start ─(busy)──────┘
//! ```
//!
//! Ring and stop reach the host's
//! [`HostEventSink`](bridge_traits::HostEventSink) as `{id, method}` messages,
//! sent by the controller as they happen. The [`EventBus`] carries the full
//! event stream for in-process observers.

pub mod command;
pub mod error;

pub use command::{InboundCommand, ACTION_STOP_ALARM};
pub use error::{CoreError, Result};

use bridge_traits::{AlarmId, AlarmStorage};
use core_ringing::{RingError, RingingSessionController, Started};
use core_runtime::config::RingerConfig;
use core_runtime::events::EventBus;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What an inbound command resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Started(Started),
    /// The alarm was removed from storage and stopped.
    Unsaved(AlarmId),
}

/// Primary façade exposed to host applications.
pub struct AlarmService {
    controller: Arc<RingingSessionController>,
    storage: Arc<dyn AlarmStorage>,
    event_bus: EventBus,
}

impl AlarmService {
    /// Create the service from a validated configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: RingerConfig) -> Self {
        let event_bus = EventBus::new(config.settings.event_buffer_size);
        let controller = RingingSessionController::new(&config, event_bus.clone());

        info!(
            host_sink = config.host_event_sink.is_some(),
            "Alarm service ready"
        );

        Self {
            controller,
            storage: config.alarm_storage,
            event_bus,
        }
    }

    /// Build the configuration with desktop defaults for every bridge the
    /// host did not provide.
    #[cfg(feature = "desktop-shims")]
    pub fn bootstrap_desktop(
        builder: core_runtime::config::RingerConfigBuilder,
    ) -> Result<Self> {
        let config = builder
            .build()
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
        Ok(Self::new(config))
    }

    /// Routes one inbound command.
    #[instrument(skip(self, command), fields(alarm_id = %command.id()))]
    pub async fn handle_command(&self, command: InboundCommand) -> Result<CommandOutcome> {
        let id = command.id();

        if let Some(active) = self.controller.active_id().await {
            debug!(active = %active, "An alarm is already ringing; discarding command");
            self.unsave(id).await;
            return Ok(CommandOutcome::Unsaved(id));
        }

        let request = match command {
            InboundCommand::StopAlarm { id } => {
                self.unsave(id).await;
                return Ok(CommandOutcome::Unsaved(id));
            }
            InboundCommand::Ring(request) => request,
        };

        match self.controller.start(request).await {
            Ok(started) => Ok(CommandOutcome::Started(started)),
            // Lost a race with another start
            Err(RingError::AlreadyRinging { .. }) => {
                self.unsave(id).await;
                Ok(CommandOutcome::Unsaved(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Decodes intent-style extras and routes the command.
    pub async fn handle_extras(
        &self,
        extras: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<CommandOutcome> {
        let command = InboundCommand::from_extras(extras)?;
        self.handle_command(command).await
    }

    /// Removes `id` from storage, then stops it.
    ///
    /// Storage failures are logged; the alarm is stopped regardless.
    pub async fn unsave(&self, id: AlarmId) {
        if let Err(e) = self.storage.unsave_alarm(id).await {
            warn!(alarm_id = %id, error = %e, "Failed to remove alarm from storage");
        }
        self.controller.stop(id).await;
    }

    pub async fn stop(&self, id: AlarmId) {
        self.controller.stop(id).await;
    }

    pub async fn stop_all(&self) {
        self.controller.stop_all().await;
    }

    /// Releases every resource and detaches interruption sources.
    pub async fn destroy(&self) {
        self.controller.teardown().await;
        info!("Alarm service destroyed");
    }

    pub async fn is_ringing(&self) -> bool {
        self.controller.is_ringing().await
    }

    pub fn ringing_ids(&self) -> Vec<AlarmId> {
        self.controller.ringing_ids()
    }

    pub fn controller(&self) -> &Arc<RingingSessionController> {
        &self.controller
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
