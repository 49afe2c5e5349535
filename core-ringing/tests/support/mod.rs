//! Recording fakes for the platform bridges.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    AlarmId, AlarmStorage, AudioOutput, AudioStream, AudioSystem, CallState, DisplayMonitor,
    DisplayState, FocusGrant, FocusRequest, ForegroundHost, LaunchIntent, ManualClock,
    NotificationBuilder, NotificationSettings, PlaybackCompletion, PlaybackEnd, PowerManager,
    PresenceHandle, RingerMode, SignalStream, StoredAlarm, TelephonyMonitor, VibrationPattern,
    Vibrator, VolumeObserver, VolumeSettingsChanged, WakeLock,
};
use chrono::DateTime;
use core_ringing::RingingSessionController;
use core_runtime::config::{FeatureFlags, RingerConfig, RingerSettings};
use core_runtime::events::{CoreEvent, EventBus, Receiver, RingingEvent, StopReason};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const MUSIC_LEVEL: u32 = 5;
pub const RING_LEVEL: u32 = 7;
pub const MAX_LEVEL: u32 = 15;

// ============================================================================
// Audio
// ============================================================================

struct OneshotCompletion(oneshot::Receiver<PlaybackEnd>);

#[async_trait]
impl PlaybackCompletion for OneshotCompletion {
    async fn wait(&mut self) -> PlaybackEnd {
        (&mut self.0).await.unwrap_or(PlaybackEnd::Released)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayCall {
    pub id: AlarmId,
    pub asset: String,
    pub looping: bool,
    pub gain: f32,
}

#[derive(Default)]
pub struct FakeAudioOutput {
    enders: Mutex<HashMap<AlarmId, oneshot::Sender<PlaybackEnd>>>,
    pub plays: Mutex<Vec<PlayCall>>,
    pub stops: Mutex<Vec<AlarmId>>,
    pub gains: Mutex<Vec<(AlarmId, f32)>>,
    pub missing: Mutex<HashSet<String>>,
    pub fail_play: AtomicBool,
}

impl FakeAudioOutput {
    /// Ends the player for `id` as the platform would.
    pub fn finish(&self, id: AlarmId, end: PlaybackEnd) -> bool {
        match self.enders.lock().remove(&id) {
            Some(tx) => tx.send(end).is_ok(),
            None => false,
        }
    }

    pub fn is_playing(&self, id: AlarmId) -> bool {
        self.enders.lock().contains_key(&id)
    }

    pub fn play_count(&self) -> usize {
        self.plays.lock().len()
    }
}

#[async_trait]
impl AudioOutput for FakeAudioOutput {
    async fn resolve(&self, asset: &str) -> BridgeResult<()> {
        if self.missing.lock().contains(asset) {
            return Err(BridgeError::NotAvailable(format!("no such asset: {asset}")));
        }
        Ok(())
    }

    async fn play(
        &self,
        id: AlarmId,
        asset: &str,
        looping: bool,
        gain: f32,
    ) -> BridgeResult<Box<dyn PlaybackCompletion>> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("decoder crashed".to_string()));
        }

        let (tx, rx) = oneshot::channel();
        self.enders.lock().insert(id, tx);
        self.plays.lock().push(PlayCall {
            id,
            asset: asset.to_string(),
            looping,
            gain,
        });
        Ok(Box::new(OneshotCompletion(rx)))
    }

    async fn set_gain(&self, id: AlarmId, gain: f32) -> BridgeResult<()> {
        self.gains.lock().push((id, gain));
        Ok(())
    }

    async fn stop(&self, id: AlarmId) -> BridgeResult<()> {
        self.enders.lock().remove(&id);
        self.stops.lock().push(id);
        Ok(())
    }
}

pub struct FakeAudioSystem {
    levels: Mutex<HashMap<AudioStream, u32>>,
    pub ringer: Mutex<RingerMode>,
    pub grant: Mutex<FocusGrant>,
    pub focus_held: AtomicBool,
    pub focus_requests: AtomicUsize,
    pub abandons: AtomicUsize,
    pub set_calls: Mutex<Vec<(AudioStream, u32, bool)>>,
    pub fail_abandon: AtomicBool,
}

impl Default for FakeAudioSystem {
    fn default() -> Self {
        let levels = HashMap::from([
            (AudioStream::Music, MUSIC_LEVEL),
            (AudioStream::Ring, RING_LEVEL),
            (AudioStream::Alarm, RING_LEVEL),
        ]);
        Self {
            levels: Mutex::new(levels),
            ringer: Mutex::new(RingerMode::Normal),
            grant: Mutex::new(FocusGrant::Granted),
            focus_held: AtomicBool::new(false),
            focus_requests: AtomicUsize::new(0),
            abandons: AtomicUsize::new(0),
            set_calls: Mutex::new(Vec::new()),
            fail_abandon: AtomicBool::new(false),
        }
    }
}

impl FakeAudioSystem {
    pub fn level(&self, stream: AudioStream) -> u32 {
        self.levels.lock().get(&stream).copied().unwrap_or_default()
    }

    /// Changes a level the way the user would, without recording a call.
    pub fn user_sets(&self, stream: AudioStream, level: u32) {
        self.levels.lock().insert(stream, level);
    }
}

#[async_trait]
impl AudioSystem for FakeAudioSystem {
    async fn stream_volume(&self, stream: AudioStream) -> BridgeResult<u32> {
        Ok(self.level(stream))
    }

    async fn max_stream_volume(&self, _stream: AudioStream) -> BridgeResult<u32> {
        Ok(MAX_LEVEL)
    }

    async fn set_stream_volume(
        &self,
        stream: AudioStream,
        level: u32,
        show_ui: bool,
    ) -> BridgeResult<()> {
        self.levels.lock().insert(stream, level);
        self.set_calls.lock().push((stream, level, show_ui));
        Ok(())
    }

    async fn ringer_mode(&self) -> BridgeResult<RingerMode> {
        Ok(*self.ringer.lock())
    }

    async fn request_focus(&self, _request: FocusRequest) -> BridgeResult<FocusGrant> {
        self.focus_requests.fetch_add(1, Ordering::SeqCst);
        let grant = *self.grant.lock();
        self.focus_held.store(grant.is_granted(), Ordering::SeqCst);
        Ok(grant)
    }

    async fn abandon_focus(&self) -> BridgeResult<()> {
        self.abandons.fetch_add(1, Ordering::SeqCst);
        self.focus_held.store(false, Ordering::SeqCst);
        if self.fail_abandon.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("audio service died".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Device
// ============================================================================

pub struct FakeVibrator {
    pub has_motor: AtomicBool,
    pub vibrating: AtomicBool,
    pub patterns: Mutex<Vec<VibrationPattern>>,
    pub cancels: AtomicUsize,
    pub fail_start: AtomicBool,
    pub fail_cancel: AtomicBool,
}

impl Default for FakeVibrator {
    fn default() -> Self {
        Self {
            has_motor: AtomicBool::new(true),
            vibrating: AtomicBool::new(false),
            patterns: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            fail_start: AtomicBool::new(false),
            fail_cancel: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Vibrator for FakeVibrator {
    async fn vibrate(&self, pattern: &VibrationPattern) -> BridgeResult<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BridgeError::PermissionDenied("VIBRATE".to_string()));
        }
        self.patterns.lock().push(pattern.clone());
        self.vibrating.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel(&self) -> BridgeResult<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.vibrating.store(false, Ordering::SeqCst);
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("vibrator service died".to_string()));
        }
        Ok(())
    }

    fn has_vibrator(&self) -> bool {
        self.has_motor.load(Ordering::SeqCst)
    }
}

struct FakeWakeLock {
    outstanding: Arc<AtomicUsize>,
    held: bool,
}

#[async_trait]
impl WakeLock for FakeWakeLock {
    async fn release(&mut self) -> BridgeResult<()> {
        if self.held {
            self.held = false;
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

#[derive(Default)]
pub struct FakePowerManager {
    outstanding: Arc<AtomicUsize>,
    pub requests: Mutex<Vec<(String, Duration)>>,
    pub fail: AtomicBool,
}

impl FakePowerManager {
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PowerManager for FakePowerManager {
    async fn acquire_wake_lock(&self, tag: &str, timeout: Duration) -> BridgeResult<Box<dyn WakeLock>> {
        self.requests.lock().push((tag.to_string(), timeout));
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::PermissionDenied("WAKE_LOCK".to_string()));
        }
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeWakeLock {
            outstanding: Arc::clone(&self.outstanding),
            held: true,
        }))
    }
}

// ============================================================================
// Presence
// ============================================================================

#[derive(Default)]
pub struct FakeForegroundHost {
    pub refuse: AtomicBool,
    pub foreground: AtomicBool,
    pub presence: Mutex<Option<PresenceHandle>>,
    pub starts: Mutex<Vec<AlarmId>>,
    pub foreground_stops: AtomicUsize,
    pub self_stops: AtomicUsize,
}

impl FakeForegroundHost {
    pub fn self_stop_count(&self) -> usize {
        self.self_stops.load(Ordering::SeqCst)
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForegroundHost for FakeForegroundHost {
    async fn start_foreground(&self, id: AlarmId, presence: &PresenceHandle) -> BridgeResult<()> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAllowed(
                "foreground service start not allowed from background".to_string(),
            ));
        }
        self.starts.lock().push(id);
        *self.presence.lock() = Some(presence.clone());
        self.foreground.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_foreground(&self, _remove_notification: bool) -> BridgeResult<()> {
        self.foreground_stops.fetch_add(1, Ordering::SeqCst);
        self.foreground.store(false, Ordering::SeqCst);
        *self.presence.lock() = None;
        Ok(())
    }

    async fn stop_self(&self) -> BridgeResult<()> {
        self.self_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotificationBuilder {
    pub built: Mutex<Vec<(AlarmId, NotificationSettings, bool)>>,
}

impl NotificationBuilder for FakeNotificationBuilder {
    fn build_presence(
        &self,
        settings: &NotificationSettings,
        full_screen_intent: bool,
        launch_intent: &LaunchIntent,
        id: AlarmId,
    ) -> BridgeResult<PresenceHandle> {
        self.built
            .lock()
            .push((id, settings.clone(), full_screen_intent));
        Ok(PresenceHandle::new(
            id,
            settings.clone(),
            full_screen_intent,
            *launch_intent,
        ))
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Default)]
pub struct FakeAlarmStorage {
    pub alarms: Mutex<HashMap<AlarmId, StoredAlarm>>,
    pub unsaved: Mutex<Vec<AlarmId>>,
}

#[async_trait]
impl AlarmStorage for FakeAlarmStorage {
    async fn save_alarm(&self, alarm: &StoredAlarm) -> BridgeResult<()> {
        self.alarms.lock().insert(alarm.id, alarm.clone());
        Ok(())
    }

    async fn unsave_alarm(&self, id: AlarmId) -> BridgeResult<()> {
        self.alarms.lock().remove(&id);
        self.unsaved.lock().push(id);
        Ok(())
    }

    async fn list_alarms(&self) -> BridgeResult<Vec<StoredAlarm>> {
        Ok(self.alarms.lock().values().cloned().collect())
    }
}

// ============================================================================
// Signal sources
// ============================================================================

struct ChannelStream<T>(mpsc::UnboundedReceiver<T>);

#[async_trait]
impl<T: Send + 'static> SignalStream<T> for ChannelStream<T> {
    async fn next(&mut self) -> Option<T> {
        self.0.recv().await
    }
}

/// Signal source driven by the test through [`FakeSignalSource::emit`].
pub struct FakeSignalSource<T> {
    senders: Mutex<Vec<mpsc::UnboundedSender<T>>>,
    pub fail: AtomicBool,
}

impl<T> Default for FakeSignalSource<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

impl<T: Clone + Send + 'static> FakeSignalSource<T> {
    pub fn emit(&self, item: T) {
        self.senders
            .lock()
            .retain(|sender| sender.send(item.clone()).is_ok());
    }

    /// Streams still held by a subscriber.
    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().iter().filter(|s| !s.is_closed()).count()
    }

    fn attach(&self, name: &str) -> BridgeResult<Box<dyn SignalStream<T>>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::PermissionDenied(format!("{name} unavailable")));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        Ok(Box::new(ChannelStream(rx)))
    }
}

#[async_trait]
impl TelephonyMonitor for FakeSignalSource<CallState> {
    async fn subscribe(&self) -> BridgeResult<Box<dyn SignalStream<CallState>>> {
        self.attach("READ_PHONE_STATE")
    }
}

#[async_trait]
impl DisplayMonitor for FakeSignalSource<DisplayState> {
    async fn subscribe(&self) -> BridgeResult<Box<dyn SignalStream<DisplayState>>> {
        self.attach("display")
    }
}

#[async_trait]
impl VolumeObserver for FakeSignalSource<VolumeSettingsChanged> {
    async fn subscribe(&self) -> BridgeResult<Box<dyn SignalStream<VolumeSettingsChanged>>> {
        self.attach("settings observer")
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Every fake wired into one [`RingerConfig`].
pub struct Harness {
    pub output: Arc<FakeAudioOutput>,
    pub system: Arc<FakeAudioSystem>,
    pub vibrator: Arc<FakeVibrator>,
    pub power: Arc<FakePowerManager>,
    pub foreground: Arc<FakeForegroundHost>,
    pub notifications: Arc<FakeNotificationBuilder>,
    pub storage: Arc<FakeAlarmStorage>,
    pub telephony: Arc<FakeSignalSource<CallState>>,
    pub display: Arc<FakeSignalSource<DisplayState>>,
    pub volume_observer: Arc<FakeSignalSource<VolumeSettingsChanged>>,
    pub clock: Arc<ManualClock>,
    pub features: FeatureFlags,
    pub settings: RingerSettings,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        Self {
            output: Arc::default(),
            system: Arc::default(),
            vibrator: Arc::default(),
            power: Arc::default(),
            foreground: Arc::default(),
            notifications: Arc::default(),
            storage: Arc::default(),
            telephony: Arc::default(),
            display: Arc::default(),
            volume_observer: Arc::default(),
            clock: Arc::new(ManualClock::new(start)),
            features: FeatureFlags::default(),
            settings: RingerSettings::default(),
        }
    }

    pub fn config(&self) -> RingerConfig {
        RingerConfig::builder()
            .audio_output(self.output.clone())
            .audio_system(self.system.clone())
            .vibrator(self.vibrator.clone())
            .power_manager(self.power.clone())
            .foreground_host(self.foreground.clone())
            .notification_builder(self.notifications.clone())
            .alarm_storage(self.storage.clone())
            .telephony(self.telephony.clone())
            .display(self.display.clone())
            .volume_observer(self.volume_observer.clone())
            .clock(self.clock.clone())
            .settings(self.settings.clone())
            .features(self.features)
            .build()
            .expect("harness config is complete")
    }

    /// Controller plus a receiver subscribed before anything was published.
    pub fn controller(&self) -> (Arc<RingingSessionController>, Receiver<CoreEvent>) {
        let bus = EventBus::new(64);
        let events = bus.subscribe();
        (RingingSessionController::new(&self.config(), bus), events)
    }
}

// ============================================================================
// Event helpers
// ============================================================================

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Next ringing event, skipping monitor events.
pub async fn next_ringing(events: &mut Receiver<CoreEvent>) -> RingingEvent {
    loop {
        let event = tokio::time::timeout(EVENT_TIMEOUT, events.recv())
            .await
            .expect("timed out waiting for a ringing event")
            .expect("event bus closed");
        if let CoreEvent::Ringing(event) = event {
            return event;
        }
    }
}

/// Waits for the `Stopped` event of `id` and returns its reason.
pub async fn wait_for_stop(events: &mut Receiver<CoreEvent>, id: AlarmId) -> StopReason {
    loop {
        if let RingingEvent::Stopped { alarm_id, reason } = next_ringing(events).await {
            if alarm_id == id {
                return reason;
            }
        }
    }
}

/// Ringing events published so far, without waiting.
pub fn drain_ringing(events: &mut Receiver<CoreEvent>) -> Vec<RingingEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Ringing(event) = event {
            drained.push(event);
        }
    }
    drained
}
