//! # Interruption Monitor
//!
//! Watches the OS signals that should silence a ringing alarm and converts
//! them into one normalized [`InterruptionEvent`] delivered to the
//! controller's control loop.
//!
//! ## Sources
//!
//! | Source | Signal | Kind |
//! |--------|--------|------|
//! | [`TelephonyMonitor`] | any call state change | [`InterruptionKind::Call`] |
//! | [`DisplayMonitor`] | display on/off transition | [`InterruptionKind::ScreenToggle`] |
//! | [`VolumeObserver`] | music or ring level moved | [`InterruptionKind::VolumeDrift`] |
//!
//! Volume observers only say that *something* changed, so the monitor keeps a
//! [`VolumeShadow`] of the music and ring levels, primed when it subscribes
//! and re-primed after the controller changes the volume itself.
//!
//! ## Lifecycle
//!
//! `Idle → Subscribed → Idle`. The controller subscribes on the first start
//! and unsubscribes at teardown. Between sessions the sources stay attached;
//! signals that arrive with no target set are dropped.

use bridge_traits::{
    AlarmId, Clock, DisplayMonitor, SignalStream, TelephonyMonitor, VolumeObserver,
    VolumeSettingsChanged,
};
use chrono::{DateTime, Utc};
use core_runtime::config::{FeatureFlags, RingerConfig};
use core_runtime::events::{CoreEvent, EventBus, InterruptionKind, MonitorEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::signal::ControlSignal;
use crate::volume::VolumeChannel;

/// Normalized interruption attributed to an alarm.
#[derive(Debug, Clone, PartialEq)]
pub struct InterruptionEvent {
    pub kind: InterruptionKind,
    pub observed_at: DateTime<Utc>,
    pub alarm_id: AlarmId,
}

/// Subscription state of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Subscribed,
}

/// Last observed music and ring stream levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeShadow {
    pub music: u32,
    pub ring: u32,
}

impl VolumeShadow {
    pub fn new(music: u32, ring: u32) -> Self {
        Self { music, ring }
    }

    /// Records a new reading. Returns `true` when either level moved.
    pub fn observe(&mut self, music: u32, ring: u32) -> bool {
        let music_delta = i64::from(music) - i64::from(self.music);
        let ring_delta = i64::from(ring) - i64::from(self.ring);
        self.music = music;
        self.ring = ring;
        music_delta != 0 || ring_delta != 0
    }
}

/// Optional signal sources. Absent sources are never subscribed.
#[derive(Clone, Default)]
pub struct SignalSources {
    pub telephony: Option<Arc<dyn TelephonyMonitor>>,
    pub display: Option<Arc<dyn DisplayMonitor>>,
    pub volume: Option<Arc<dyn VolumeObserver>>,
}

impl SignalSources {
    pub fn from_config(config: &RingerConfig) -> Self {
        Self {
            telephony: config.telephony.clone(),
            display: config.display.clone(),
            volume: config.volume_observer.clone(),
        }
    }
}

/// State shared with the pump tasks.
struct Dispatcher {
    target: Mutex<Option<AlarmId>>,
    shadow: Mutex<Option<VolumeShadow>>,
    volume: Arc<VolumeChannel>,
    clock: Arc<dyn Clock>,
    signals: mpsc::UnboundedSender<ControlSignal>,
}

impl Dispatcher {
    fn raise(&self, kind: InterruptionKind) -> bool {
        let Some(alarm_id) = *self.target.lock() else {
            debug!(?kind, "Interruption with no alarm targeted; ignoring");
            return false;
        };

        let event = InterruptionEvent {
            kind,
            observed_at: self.clock.now(),
            alarm_id,
        };
        info!(?kind, alarm_id = %alarm_id, "Interruption raised");

        if self.signals.send(ControlSignal::Interrupted(event)).is_err() {
            warn!("Control loop is gone; interruption dropped");
            return false;
        }
        true
    }

    async fn prime(&self) {
        match self.volume.levels().await {
            Some((music, ring)) => {
                *self.shadow.lock() = Some(VolumeShadow::new(music, ring));
                debug!(music, ring, "Volume shadow primed");
            }
            None => warn!("Could not read stream levels; volume shadow left unprimed"),
        }
    }

    async fn on_volume_change(&self, change: VolumeSettingsChanged) {
        let Some((music, ring)) = self.volume.levels().await else {
            warn!("Could not read stream levels after a volume change");
            return;
        };

        let drifted = {
            let mut shadow = self.shadow.lock();
            match (*shadow, change.self_change) {
                (Some(mut current), false) => {
                    let moved = current.observe(music, ring);
                    *shadow = Some(current);
                    moved
                }
                // Own changes and unprimed shadows only record the reading.
                _ => {
                    *shadow = Some(VolumeShadow::new(music, ring));
                    false
                }
            }
        };

        if drifted {
            self.raise(InterruptionKind::VolumeDrift);
        }
    }
}

struct Subscription {
    state: MonitorState,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Converts OS signals into interruptions for the current alarm.
pub struct InterruptionMonitor {
    sources: SignalSources,
    features: FeatureFlags,
    event_bus: EventBus,
    dispatcher: Arc<Dispatcher>,
    subscription: AsyncMutex<Subscription>,
}

impl InterruptionMonitor {
    pub fn new(
        sources: SignalSources,
        volume: Arc<VolumeChannel>,
        clock: Arc<dyn Clock>,
        features: FeatureFlags,
        signals: mpsc::UnboundedSender<ControlSignal>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            sources,
            features,
            event_bus,
            dispatcher: Arc::new(Dispatcher {
                target: Mutex::new(None),
                shadow: Mutex::new(None),
                volume,
                clock,
                signals,
            }),
            subscription: AsyncMutex::new(Subscription {
                state: MonitorState::Idle,
                cancel: CancellationToken::new(),
                tasks: Vec::new(),
            }),
        }
    }

    /// Attaches every enabled source. No-op when already subscribed.
    ///
    /// A source that fails to attach is reported and skipped; the others
    /// still run.
    #[instrument(skip(self))]
    pub async fn subscribe(&self) {
        let mut subscription = self.subscription.lock().await;
        if subscription.state == MonitorState::Subscribed {
            return;
        }

        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();
        let mut attached = Vec::new();

        if self.features.monitor_telephony {
            if let Some(telephony) = &self.sources.telephony {
                match telephony.subscribe().await {
                    Ok(stream) => {
                        tasks.push(tokio::spawn(pump_states(
                            stream,
                            InterruptionKind::Call,
                            Arc::clone(&self.dispatcher),
                            cancel.clone(),
                        )));
                        attached.push("telephony".to_string());
                    }
                    Err(e) => self.source_unavailable("telephony", e),
                }
            }
        }

        if self.features.monitor_display {
            if let Some(display) = &self.sources.display {
                match display.subscribe().await {
                    Ok(stream) => {
                        tasks.push(tokio::spawn(pump_states(
                            stream,
                            InterruptionKind::ScreenToggle,
                            Arc::clone(&self.dispatcher),
                            cancel.clone(),
                        )));
                        attached.push("display".to_string());
                    }
                    Err(e) => self.source_unavailable("display", e),
                }
            }
        }

        if self.features.monitor_volume {
            if let Some(observer) = &self.sources.volume {
                self.dispatcher.prime().await;
                match observer.subscribe().await {
                    Ok(stream) => {
                        tasks.push(tokio::spawn(pump_volume(
                            stream,
                            Arc::clone(&self.dispatcher),
                            cancel.clone(),
                        )));
                        attached.push("volume".to_string());
                    }
                    Err(e) => {
                        *self.dispatcher.shadow.lock() = None;
                        self.source_unavailable("volume", e);
                    }
                }
            }
        }

        subscription.state = MonitorState::Subscribed;
        subscription.cancel = cancel;
        subscription.tasks = tasks;

        info!(sources = ?attached, "Interruption monitor subscribed");
        self.event_bus
            .emit(CoreEvent::Monitor(MonitorEvent::Subscribed { sources: attached }))
            .ok();
    }

    /// Detaches every source and forgets the target and volume shadow.
    #[instrument(skip(self))]
    pub async fn unsubscribe(&self) {
        let mut subscription = self.subscription.lock().await;
        if subscription.state == MonitorState::Idle {
            return;
        }

        subscription.cancel.cancel();
        for task in subscription.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "Signal pump ended abnormally");
            }
        }
        subscription.state = MonitorState::Idle;

        *self.dispatcher.target.lock() = None;
        *self.dispatcher.shadow.lock() = None;

        info!("Interruption monitor unsubscribed");
        self.event_bus
            .emit(CoreEvent::Monitor(MonitorEvent::Unsubscribed))
            .ok();
    }

    /// Sets or clears the alarm that interruptions are attributed to.
    pub fn set_target(&self, alarm_id: Option<AlarmId>) {
        *self.dispatcher.target.lock() = alarm_id;
    }

    pub fn target(&self) -> Option<AlarmId> {
        *self.dispatcher.target.lock()
    }

    /// Raises an interruption for the current target.
    ///
    /// Returns `false` when no alarm is targeted.
    pub fn raise(&self, kind: InterruptionKind) -> bool {
        self.dispatcher.raise(kind)
    }

    /// Re-reads the stream levels after a programmatic volume change.
    pub async fn reprime(&self) {
        if self.dispatcher.shadow.lock().is_none() {
            return;
        }
        self.dispatcher.prime().await;
    }

    pub fn volume_shadow(&self) -> Option<VolumeShadow> {
        *self.dispatcher.shadow.lock()
    }

    pub async fn state(&self) -> MonitorState {
        self.subscription.lock().await.state
    }

    pub async fn is_subscribed(&self) -> bool {
        self.state().await == MonitorState::Subscribed
    }

    fn source_unavailable(&self, source: &str, err: impl std::fmt::Display) {
        warn!(source, error = %err, "Interruption source unavailable");
        self.event_bus
            .emit(CoreEvent::Monitor(MonitorEvent::SourceUnavailable {
                source: source.to_string(),
                message: err.to_string(),
            }))
            .ok();
    }
}

/// Raises `kind` whenever the stream reports a state different from the last one.
async fn pump_states<T>(
    mut stream: Box<dyn SignalStream<T>>,
    kind: InterruptionKind,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) where
    T: PartialEq + Copy + std::fmt::Debug + Send + 'static,
{
    let mut last: Option<T> = None;
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            item = stream.next() => item,
        };

        let Some(state) = item else {
            debug!(?kind, "Signal stream closed");
            break;
        };

        if last == Some(state) {
            continue;
        }
        last = Some(state);

        debug!(?kind, ?state, "Signal received");
        dispatcher.raise(kind);
    }
}

async fn pump_volume(
    mut stream: Box<dyn SignalStream<VolumeSettingsChanged>>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            item = stream.next() => item,
        };

        match item {
            Some(change) => dispatcher.on_volume_change(change).await,
            None => {
                debug!("Volume observer closed");
                break;
            }
        }
    }
}
