//! # Ringing Session Controller
//!
//! Owns the single ringing session and sequences every resource it holds.
//!
//! ## Entry points
//!
//! - [`RingingSessionController::start`]: acquire resources in a fixed order,
//!   all or nothing
//! - [`RingingSessionController::stop`]: release in reverse order, never fails
//! - [`RingingSessionController::teardown`]: process shutdown
//!
//! Interruptions and natural playback completion arrive as [`ControlSignal`]s
//! on an mpsc channel drained by one control loop task. Every entry point
//! takes the session lock for its whole state transition, so a signal that
//! lands after its alarm stopped finds a different active id and is dropped.
//!
//! ## Acquisition order
//!
//! ```text
//! presence → foreground ─┬─ (silent) ──────────────────────────┐
//!                        └─ volume → focus → playback ─────────┤
//!                                                              ├─ vibration → active id → monitor → wake lock
//! ```
//!
//! A foreground refusal ends the attempt before anything else is touched and
//! lets the host process terminate after a short delay. A later failure
//! unwinds whatever was already held.

use bridge_traits::{
    AlarmId, ForegroundHost, HostEventSink, LaunchIntent, NotificationBuilder, PowerManager,
};
use core_runtime::config::{FeatureFlags, RingerConfig, RingerSettings};
use core_runtime::events::{CoreEvent, EventBus, RejectionKind, RingingEvent, StopReason};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::audio::{AudioChannel, CompletionCallback};
use crate::error::{Result, RingError};
use crate::monitor::{InterruptionEvent, InterruptionMonitor, MonitorState, SignalSources};
use crate::request::RingRequest;
use crate::signal::ControlSignal;
use crate::state::{Resource, SessionSnapshot, SessionState};
use crate::vibration::VibrationChannel;
use crate::volume::VolumeChannel;

/// Outcome of a successful start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    pub id: AlarmId,
    /// The ringer was silent, so no audio, volume or focus was touched.
    pub audio_suppressed: bool,
}

/// Single-session alarm ringing controller.
pub struct RingingSessionController {
    audio: AudioChannel,
    vibration: VibrationChannel,
    volume: Arc<VolumeChannel>,
    monitor: InterruptionMonitor,
    foreground: Arc<dyn ForegroundHost>,
    notifications: Arc<dyn NotificationBuilder>,
    power: Arc<dyn PowerManager>,
    settings: RingerSettings,
    features: FeatureFlags,
    state: Mutex<SessionState>,
    event_bus: EventBus,
    host_sink: Option<Arc<dyn HostEventSink>>,
    signals: mpsc::UnboundedSender<ControlSignal>,
    this: Weak<Self>,
}

impl RingingSessionController {
    /// Builds the controller and spawns its control loop.
    ///
    /// Must be called from within a Tokio runtime. The loop ends once the
    /// controller is dropped.
    pub fn new(config: &RingerConfig, event_bus: EventBus) -> Arc<Self> {
        let (signals, receiver) = mpsc::unbounded_channel();
        let volume = Arc::new(VolumeChannel::new(Arc::clone(&config.audio_system)));

        let controller = Arc::new_cyclic(|this: &Weak<Self>| Self {
            audio: AudioChannel::new(Arc::clone(&config.audio_output), config.settings.fade_step),
            vibration: VibrationChannel::new(
                Arc::clone(&config.vibrator),
                config.settings.vibration_pattern.clone(),
            ),
            monitor: InterruptionMonitor::new(
                SignalSources::from_config(config),
                Arc::clone(&volume),
                Arc::clone(&config.clock),
                config.features,
                signals.clone(),
                event_bus.clone(),
            ),
            volume,
            foreground: Arc::clone(&config.foreground_host),
            notifications: Arc::clone(&config.notification_builder),
            power: Arc::clone(&config.power_manager),
            settings: config.settings.clone(),
            features: config.features,
            state: Mutex::new(SessionState::default()),
            event_bus,
            host_sink: config.host_event_sink.clone(),
            signals,
            this: this.clone(),
        });

        tokio::spawn(run_control_loop(Arc::downgrade(&controller), receiver));
        controller
    }

    /// Starts ringing `request`.
    ///
    /// Fails with [`RingError::AlreadyRinging`] while another alarm is active;
    /// the active session is left untouched.
    #[instrument(skip(self, request), fields(alarm_id = %request.id))]
    pub async fn start(&self, request: RingRequest) -> Result<Started> {
        let id = request.id;
        let mut state = self.state.lock().await;

        if let Some(active) = state.active_id {
            warn!(active = %active, "Another alarm is ringing; rejecting start");
            self.emit_rejected(id, RejectionKind::AlreadyRinging);
            return Err(RingError::AlreadyRinging {
                active,
                requested: id,
            });
        }

        if let Err(e) = self.check_request(&request).await {
            warn!(error = %e, "Rejecting invalid ring request");
            self.emit_rejected(id, RejectionKind::InvalidRequest);
            return Err(e);
        }

        // 1. Foreground presence
        let launch_intent = LaunchIntent::for_alarm(id);
        let presence = match self.notifications.build_presence(
            &request.notification,
            request.full_screen_intent,
            &launch_intent,
            id,
        ) {
            Ok(presence) => presence,
            Err(e) => return Err(self.reject_foreground(id, e)),
        };
        if let Err(e) = self.foreground.start_foreground(id, &presence).await {
            return Err(self.reject_foreground(id, e));
        }
        state.flags.foreground = true;
        state.presence = Some(presence);

        // 2. Ringer mode
        let audio_suppressed =
            self.features.respect_silent_mode && self.volume.ringer_mode().await.is_silent();
        if audio_suppressed {
            info!("Ringer is silent; skipping audio");
        }

        if !audio_suppressed {
            // 3. Volume and focus
            if let Some(target) = request.volume {
                match self.volume.capture().await {
                    Some(level) => {
                        if self.volume.set(target, request.show_system_volume_ui).await {
                            state.captured_volume = Some(level);
                            state.flags.volume_altered = true;
                        }
                    }
                    None => warn!("Music volume unreadable; leaving it unchanged"),
                }
            }
            state.flags.audio_focus = self.volume.request_focus().await;
            self.monitor.reprime().await;

            // 4-5. Playback with completion routed back to the control loop
            if let Err(e) = self
                .audio
                .play(
                    id,
                    &request.asset_path,
                    request.looping,
                    request.fade_duration,
                    Some(self.completion_callback()),
                )
                .await
            {
                return Err(self.abort_start(&mut state, id, e).await);
            }
            state.flags.audio = true;
        }

        // 6. Vibration
        if request.vibrate {
            match self.vibration.start().await {
                Ok(started) => state.flags.vibration = started,
                Err(e) => return Err(self.abort_start(&mut state, id, e).await),
            }
        }

        // 7. Active id and interruption target
        state.active_id = Some(id);
        self.monitor.set_target(Some(id));
        self.monitor.subscribe().await;

        // 8. Wake lock
        match self
            .power
            .acquire_wake_lock(&self.settings.wake_lock_tag, self.settings.wake_lock_timeout)
            .await
        {
            Ok(lock) => {
                state.wake_lock = Some(lock);
                state.flags.wake_lock = true;
            }
            Err(e) => warn!(error = %e, "Wake lock unavailable; ringing without it"),
        }

        // 9. Announce
        info!(
            looping = request.looping,
            vibrate = request.vibrate,
            audio_suppressed,
            resources = ?state.flags.held(),
            "Alarm ringing"
        );
        self.emit(RingingEvent::Started {
            alarm_id: id,
            looping: request.looping,
            vibrate: request.vibrate,
            audio_suppressed,
        });

        Ok(Started {
            id,
            audio_suppressed,
        })
    }

    /// Stops `id`. Safe to call for any id at any time.
    pub async fn stop(&self, id: AlarmId) {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state, id, StopReason::Requested).await;
    }

    /// Handles an interruption. Only the alarm it was attributed to is stopped,
    /// and only while that alarm is still active.
    #[instrument(skip(self, event), fields(alarm_id = %event.alarm_id, kind = ?event.kind))]
    pub async fn on_interruption(&self, event: InterruptionEvent) {
        let mut state = self.state.lock().await;
        if state.active_id != Some(event.alarm_id) {
            debug!("Interruption for an alarm that is no longer ringing; ignoring");
            return;
        }

        self.emit(RingingEvent::Interrupted {
            alarm_id: event.alarm_id,
            kind: event.kind,
        });
        self.stop_locked(&mut state, event.alarm_id, StopReason::Interrupted)
            .await;
    }

    /// Handles the natural end of a non-looping asset.
    #[instrument(skip(self))]
    pub async fn on_playback_completed(&self, id: AlarmId) {
        let mut state = self.state.lock().await;
        if state.active_id != Some(id) {
            debug!("Completion for an alarm that is no longer ringing; ignoring");
            return;
        }

        self.stop_locked(&mut state, id, StopReason::PlaybackCompleted)
            .await;
    }

    /// Stops the active session and any player still running.
    pub async fn stop_all(&self) {
        let mut state = self.state.lock().await;
        if let Some(active) = state.active_id {
            self.stop_locked(&mut state, active, StopReason::Requested)
                .await;
        }
        for id in self.audio.playing_ids() {
            self.stop_locked(&mut state, id, StopReason::Requested).await;
        }
    }

    /// Releases everything and detaches the interruption monitor.
    ///
    /// Runs every release step whether or not a session is active and can be
    /// called repeatedly.
    #[instrument(skip(self))]
    pub async fn teardown(&self) {
        let mut state = self.state.lock().await;
        let active = state.active_id.take();
        self.monitor.set_target(None);

        self.release_volume_and_focus(&mut state, active).await;
        absorb(active, self.audio.stop_all().await);
        state.flags.audio = false;
        self.release_session_resources(&mut state, active).await;
        self.monitor.unsubscribe().await;

        if let Some(id) = active {
            self.emit(RingingEvent::Stopped {
                alarm_id: id,
                reason: StopReason::Teardown,
            });
        }
        info!(was_ringing = ?active, "Ringing core torn down");
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub async fn is_ringing(&self) -> bool {
        self.state.lock().await.active_id.is_some()
    }

    pub async fn active_id(&self) -> Option<AlarmId> {
        self.state.lock().await.active_id
    }

    /// Ids with a running player, ascending.
    pub fn ringing_ids(&self) -> Vec<AlarmId> {
        self.audio.playing_ids()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn monitor_state(&self) -> MonitorState {
        self.monitor.state().await
    }

    pub fn monitor(&self) -> &InterruptionMonitor {
        &self.monitor
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn check_request(&self, request: &RingRequest) -> Result<()> {
        request.validate()?;
        self.audio
            .resolve(&request.asset_path)
            .await
            .map_err(|e| RingError::InvalidRequest(e.to_string()))
    }

    fn completion_callback(&self) -> CompletionCallback {
        let signals = self.signals.clone();
        Box::new(move |id| {
            if signals.send(ControlSignal::PlaybackCompleted(id)).is_err() {
                debug!(alarm_id = %id, "Control loop is gone; completion dropped");
            }
        })
    }

    fn reject_foreground(&self, id: AlarmId, err: impl std::fmt::Display) -> RingError {
        error!(alarm_id = %id, error = %err, "Foreground presence refused");
        self.emit_rejected(id, RejectionKind::ForegroundRejected);
        self.schedule_self_stop();
        RingError::ForegroundRejected {
            id,
            message: err.to_string(),
        }
    }

    /// Lets the host terminate after the configured delay if still idle.
    fn schedule_self_stop(&self) {
        let this = self.this.clone();
        let delay = self.settings.self_stop_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(controller) = this.upgrade() else {
                return;
            };

            let state = controller.state.lock().await;
            if state.active_id.is_some() || !controller.audio.is_empty() {
                debug!("Session started meanwhile; not stopping the host");
                return;
            }
            if let Err(e) = controller.foreground.stop_self().await {
                warn!(error = %e, "Failed to stop host after foreground refusal");
            }
        });
    }

    async fn abort_start(
        &self,
        state: &mut SessionState,
        id: AlarmId,
        err: RingError,
    ) -> RingError {
        error!(alarm_id = %id, error = %err, "Start failed; unwinding acquired resources");
        self.release(state, id).await;
        self.emit_rejected(id, RejectionKind::AcquisitionFailed);
        err
    }

    async fn stop_locked(&self, state: &mut SessionState, id: AlarmId, reason: StopReason) {
        match state.active_id {
            Some(active) if active != id => {
                debug!(alarm_id = %id, active = %active, "Stopping a player outside the active session");
                absorb(Some(id), self.audio.stop(id).await);
            }
            _ => {
                state.active_id = None;
                self.monitor.set_target(None);
                self.release(state, id).await;
            }
        }

        info!(alarm_id = %id, ?reason, "Alarm stopped");
        self.emit(RingingEvent::Stopped {
            alarm_id: id,
            reason,
        });
    }

    /// Releases in reverse acquisition order. Each step runs even when an
    /// earlier one failed.
    async fn release(&self, state: &mut SessionState, id: AlarmId) {
        self.release_volume_and_focus(state, Some(id)).await;

        absorb(Some(id), self.audio.stop(id).await);
        state.flags.audio = false;

        if !self.audio.is_empty() {
            debug!(alarm_id = %id, playing = ?self.audio.playing_ids(), "Other players still running; keeping presence");
            return;
        }

        self.release_session_resources(state, Some(id)).await;
        if let Err(e) = self.foreground.stop_self().await {
            warn!(alarm_id = %id, error = %e, "Failed to let the host terminate");
        }
    }

    async fn release_volume_and_focus(&self, state: &mut SessionState, id: Option<AlarmId>) {
        if let Some(level) = state.captured_volume.take() {
            self.volume.restore(level).await;
            self.monitor.reprime().await;
        }
        state.flags.volume_altered = false;

        if state.flags.audio_focus {
            state.flags.audio_focus = false;
            absorb(id, self.volume.abandon_focus().await);
        }
    }

    async fn release_session_resources(&self, state: &mut SessionState, id: Option<AlarmId>) {
        absorb(id, self.vibration.stop().await);
        state.flags.vibration = false;

        if let Some(mut lock) = state.wake_lock.take() {
            absorb(
                id,
                lock.release()
                    .await
                    .map_err(|e| RingError::release(Resource::WakeLock, e)),
            );
        }
        state.flags.wake_lock = false;

        if state.flags.foreground {
            state.flags.foreground = false;
            state.presence = None;
            absorb(
                id,
                self.foreground
                    .stop_foreground(true)
                    .await
                    .map_err(|e| RingError::release(Resource::Foreground, e)),
            );
        }
    }

    /// Publishes on the bus. Ring and stop also go straight to the host sink,
    /// which must see every one of them regardless of bus capacity.
    fn emit(&self, event: RingingEvent) {
        if let (Some(sink), Some(message)) = (&self.host_sink, event.host_message()) {
            if let Err(e) = sink.send(message) {
                warn!(alarm_id = %message.id, error = %e, "Host did not accept event");
            }
        }
        self.event_bus.emit(CoreEvent::Ringing(event)).ok();
    }

    fn emit_rejected(&self, id: AlarmId, reason: RejectionKind) {
        self.emit(RingingEvent::Rejected {
            alarm_id: id,
            reason,
        });
    }
}

fn absorb(alarm_id: Option<AlarmId>, result: Result<()>) {
    if let Err(e) = result {
        warn!(?alarm_id, error = %e, "Release step failed; continuing");
    }
}

async fn run_control_loop(
    controller: Weak<RingingSessionController>,
    mut signals: mpsc::UnboundedReceiver<ControlSignal>,
) {
    while let Some(signal) = signals.recv().await {
        let Some(controller) = controller.upgrade() else {
            break;
        };

        match signal {
            ControlSignal::Interrupted(event) => controller.on_interruption(event).await,
            ControlSignal::PlaybackCompleted(id) => controller.on_playback_completed(id).await,
        }
    }
    debug!("Control loop finished");
}
