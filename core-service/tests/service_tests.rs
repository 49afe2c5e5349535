//! Integration tests for the alarm service façade

use async_trait::async_trait;
use bridge_desktop::{
    ChannelHostEventSink, DesktopForegroundHost, DesktopNotificationBuilder, DesktopPowerManager,
    DesktopVibrator,
};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    AlarmId, AlarmStorage, AudioOutput, AudioStream, AudioSystem, FocusGrant, FocusRequest,
    HostMessage, PlaybackCompletion, PlaybackEnd, RingerMode, StoredAlarm,
};
use core_ringing::RingError;
use core_runtime::config::RingerConfig;
use core_service::{AlarmService, CommandOutcome, CoreError, InboundCommand};
use mockall::mock;
use mockall::predicate::eq;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

mock! {
    Storage {}

    #[async_trait]
    impl AlarmStorage for Storage {
        async fn save_alarm(&self, alarm: &StoredAlarm) -> BridgeResult<()>;
        async fn unsave_alarm(&self, id: AlarmId) -> BridgeResult<()>;
        async fn list_alarms(&self) -> BridgeResult<Vec<StoredAlarm>>;
    }
}

struct Completion(oneshot::Receiver<PlaybackEnd>);

#[async_trait]
impl PlaybackCompletion for Completion {
    async fn wait(&mut self) -> PlaybackEnd {
        (&mut self.0).await.unwrap_or(PlaybackEnd::Released)
    }
}

#[derive(Default)]
struct Speaker {
    enders: Mutex<HashMap<AlarmId, oneshot::Sender<PlaybackEnd>>>,
}

impl Speaker {
    fn finish(&self, id: AlarmId) {
        if let Some(tx) = self.enders.lock().remove(&id) {
            let _ = tx.send(PlaybackEnd::Completed);
        }
    }
}

#[async_trait]
impl AudioOutput for Speaker {
    async fn resolve(&self, asset: &str) -> BridgeResult<()> {
        if asset.is_empty() {
            return Err(BridgeError::NotAvailable("empty asset".to_string()));
        }
        Ok(())
    }

    async fn play(
        &self,
        id: AlarmId,
        _asset: &str,
        _looping: bool,
        _gain: f32,
    ) -> BridgeResult<Box<dyn PlaybackCompletion>> {
        let (tx, rx) = oneshot::channel();
        self.enders.lock().insert(id, tx);
        Ok(Box::new(Completion(rx)))
    }

    async fn set_gain(&self, _id: AlarmId, _gain: f32) -> BridgeResult<()> {
        Ok(())
    }

    async fn stop(&self, id: AlarmId) -> BridgeResult<()> {
        self.enders.lock().remove(&id);
        Ok(())
    }
}

struct Mixer;

#[async_trait]
impl AudioSystem for Mixer {
    async fn stream_volume(&self, _stream: AudioStream) -> BridgeResult<u32> {
        Ok(5)
    }

    async fn max_stream_volume(&self, _stream: AudioStream) -> BridgeResult<u32> {
        Ok(15)
    }

    async fn set_stream_volume(&self, _stream: AudioStream, _level: u32, _show_ui: bool) -> BridgeResult<()> {
        Ok(())
    }

    async fn ringer_mode(&self) -> BridgeResult<RingerMode> {
        Ok(RingerMode::Normal)
    }

    async fn request_focus(&self, _request: FocusRequest) -> BridgeResult<FocusGrant> {
        Ok(FocusGrant::Granted)
    }

    async fn abandon_focus(&self) -> BridgeResult<()> {
        Ok(())
    }
}

struct Fixture {
    service: AlarmService,
    speaker: Arc<Speaker>,
    foreground: Arc<DesktopForegroundHost>,
    host: mpsc::UnboundedReceiver<HostMessage>,
}

fn fixture(storage: MockStorage) -> Fixture {
    fixture_with_buffer(storage, 64)
}

fn fixture_with_buffer(storage: MockStorage, event_buffer_size: usize) -> Fixture {
    let speaker = Arc::new(Speaker::default());
    let foreground = Arc::new(DesktopForegroundHost::new());
    let (sink, host) = ChannelHostEventSink::new();

    let config = RingerConfig::builder()
        .audio_output(speaker.clone())
        .audio_system(Arc::new(Mixer))
        .vibrator(Arc::new(DesktopVibrator::new()))
        .power_manager(Arc::new(DesktopPowerManager::new()))
        .foreground_host(foreground.clone())
        .notification_builder(Arc::new(DesktopNotificationBuilder::new()))
        .alarm_storage(Arc::new(storage))
        .host_event_sink(Arc::new(sink))
        .event_buffer_size(event_buffer_size)
        .build()
        .expect("config builds");

    Fixture {
        service: AlarmService::new(config),
        speaker,
        foreground,
        host,
    }
}

fn ring(id: i32) -> InboundCommand {
    InboundCommand::from_extras(
        json!({"id": id, "assetAudioPath": "assets/alarm.mp3"})
            .as_object()
            .expect("object"),
    )
    .expect("valid command")
}

async fn next_message(host: &mut mpsc::UnboundedReceiver<HostMessage>) -> HostMessage {
    tokio::time::timeout(Duration::from_secs(2), host.recv())
        .await
        .expect("timed out waiting for a host message")
        .expect("host channel closed")
}

#[tokio::test]
async fn test_ring_and_stop_reach_the_host() {
    let mut storage = MockStorage::new();
    storage
        .expect_unsave_alarm()
        .with(eq(AlarmId(1)))
        .times(1)
        .returning(|_| Ok(()));
    let mut f = fixture(storage);

    let outcome = f.service.handle_command(ring(1)).await.unwrap();
    assert!(matches!(outcome, CommandOutcome::Started(s) if s.id == AlarmId(1)));
    assert!(f.service.is_ringing().await);
    assert!(f.foreground.is_foreground().await);
    assert_eq!(next_message(&mut f.host).await, HostMessage::ring(AlarmId(1)));

    let stop = InboundCommand::StopAlarm { id: AlarmId(1) };
    assert_eq!(
        f.service.handle_command(stop).await.unwrap(),
        CommandOutcome::Unsaved(AlarmId(1))
    );
    assert!(!f.service.is_ringing().await);
    assert!(!f.foreground.is_foreground().await);
    assert!(f.foreground.stop_was_requested());
    assert_eq!(next_message(&mut f.host).await, HostMessage::stop(AlarmId(1)));
}

#[tokio::test]
async fn test_command_while_ringing_is_unsaved() {
    let mut storage = MockStorage::new();
    storage
        .expect_unsave_alarm()
        .with(eq(AlarmId(3)))
        .times(1)
        .returning(|_| Ok(()));
    let mut f = fixture(storage);

    f.service.handle_command(ring(2)).await.unwrap();
    let outcome = f.service.handle_command(ring(3)).await.unwrap();

    assert_eq!(outcome, CommandOutcome::Unsaved(AlarmId(3)));
    assert_eq!(f.service.controller().active_id().await, Some(AlarmId(2)));
    assert_eq!(f.service.ringing_ids(), vec![AlarmId(2)]);

    assert_eq!(next_message(&mut f.host).await, HostMessage::ring(AlarmId(2)));
    assert_eq!(next_message(&mut f.host).await, HostMessage::stop(AlarmId(3)));
}

#[tokio::test]
async fn test_storage_failure_still_stops() {
    let mut storage = MockStorage::new();
    storage
        .expect_unsave_alarm()
        .returning(|_| Err(BridgeError::DatabaseError("disk full".to_string())));
    let f = fixture(storage);

    f.service.handle_command(ring(5)).await.unwrap();
    f.service.unsave(AlarmId(5)).await;

    assert!(!f.service.is_ringing().await);
}

#[tokio::test]
async fn test_missing_asset_is_rejected_before_touching_anything() {
    let mut storage = MockStorage::new();
    storage.expect_unsave_alarm().never();
    let f = fixture(storage);

    let extras = json!({"id": 4});
    let err = f
        .service
        .handle_extras(extras.as_object().expect("object"))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Ringing(RingError::InvalidRequest(_))));
    assert!(!f.foreground.is_foreground().await);
}

#[tokio::test]
async fn test_completion_reports_stop_to_host() {
    let storage = MockStorage::new();
    let mut f = fixture(storage);

    let extras = json!({"id": 8, "assetAudioPath": "assets/once.mp3", "loopAudio": false});
    f.service
        .handle_extras(extras.as_object().expect("object"))
        .await
        .unwrap();
    assert_eq!(next_message(&mut f.host).await, HostMessage::ring(AlarmId(8)));

    f.speaker.finish(AlarmId(8));

    assert_eq!(next_message(&mut f.host).await, HostMessage::stop(AlarmId(8)));
    assert!(!f.service.is_ringing().await);
}

#[tokio::test]
async fn test_destroy_releases_everything() {
    let storage = MockStorage::new();
    let mut f = fixture(storage);

    f.service.handle_command(ring(6)).await.unwrap();
    f.service.destroy().await;

    assert_eq!(next_message(&mut f.host).await, HostMessage::ring(AlarmId(6)));
    assert_eq!(next_message(&mut f.host).await, HostMessage::stop(AlarmId(6)));

    assert!(!f.service.is_ringing().await);
    assert!(f.service.ringing_ids().is_empty());
    assert!(!f.foreground.is_foreground().await);
    assert!(!f.foreground.notification_visible().await);
}

#[tokio::test]
async fn test_host_sees_every_stop_in_a_burst() {
    let mut storage = MockStorage::new();
    storage
        .expect_unsave_alarm()
        .times(10)
        .returning(|_| Ok(()));
    let mut f = fixture_with_buffer(storage, 4);
    let mut bus = f.service.event_bus().subscribe();

    f.service.handle_command(ring(1)).await.unwrap();
    for id in 100..110 {
        let outcome = f.service.handle_command(ring(id)).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Unsaved(AlarmId(id)));
    }

    // The bus overflowed, the host channel did not
    assert!(matches!(bus.try_recv(), Err(TryRecvError::Lagged(_))));

    assert_eq!(f.host.try_recv().ok(), Some(HostMessage::ring(AlarmId(1))));
    for id in 100..110 {
        assert_eq!(f.host.try_recv().ok(), Some(HostMessage::stop(AlarmId(id))));
    }
    assert!(f.host.try_recv().is_err());
}
