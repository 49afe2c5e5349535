//! # Audio Channel
//!
//! Owns one player session per alarm id on top of [`AudioOutput`].
//!
//! Each session gets a [`CancellationToken`] shared by two background tasks:
//! - a fade task stepping the gain from silence to full over the fade duration
//! - a completion watcher waiting on the player's [`PlaybackCompletion`]
//!
//! Stopping a session cancels both before the player is released, so the
//! completion callback of a non-looping session fires at most once and never
//! after an explicit stop.

use bridge_traits::{AlarmId, AudioOutput, PlaybackCompletion, PlaybackEnd};
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::{Result, RingError};
use crate::state::Resource;

/// Invoked with the alarm id when a non-looping session reaches its end.
pub type CompletionCallback = Box<dyn FnOnce(AlarmId) + Send + 'static>;

struct PlayerSession {
    generation: u64,
    cancel: CancellationToken,
}

type Sessions = Arc<Mutex<HashMap<AlarmId, PlayerSession>>>;

/// Playback of alarm assets, one session per alarm id.
pub struct AudioChannel {
    output: Arc<dyn AudioOutput>,
    fade_step: Duration,
    sessions: Sessions,
    next_generation: AtomicU64,
}

impl AudioChannel {
    pub fn new(output: Arc<dyn AudioOutput>, fade_step: Duration) -> Self {
        Self {
            output,
            fade_step,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Checks that `asset` can be opened.
    pub async fn resolve(&self, asset: &str) -> Result<()> {
        self.output
            .resolve(asset)
            .await
            .map_err(|e| RingError::UnresolvableAsset {
                asset: strip_path(asset).to_string(),
                message: e.to_string(),
            })
    }

    /// Starts playback for `id`, replacing any session already running for it.
    ///
    /// `on_complete` is only used when `looping` is false.
    #[instrument(skip(self, on_complete), fields(alarm_id = %id, asset = %strip_path(asset)))]
    pub async fn play(
        &self,
        id: AlarmId,
        asset: &str,
        looping: bool,
        fade: Duration,
        on_complete: Option<CompletionCallback>,
    ) -> Result<()> {
        self.resolve(asset).await?;

        if self.is_playing(id) {
            debug!("Replacing running session");
            self.stop(id).await?;
        }

        let fading = !fade.is_zero();
        let initial_gain = if fading { 0.0 } else { 1.0 };

        let completion = self
            .output
            .play(id, asset, looping, initial_gain)
            .await
            .map_err(|e| RingError::acquire(Resource::Audio, e))?;

        let cancel = CancellationToken::new();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().insert(
            id,
            PlayerSession {
                generation,
                cancel: cancel.clone(),
            },
        );

        if fading {
            tokio::spawn(fade_in(
                Arc::clone(&self.output),
                id,
                fade,
                self.fade_step,
                cancel.clone(),
            ));
        }

        let on_complete = if looping { None } else { on_complete };
        tokio::spawn(watch_completion(
            Arc::clone(&self.output),
            Arc::clone(&self.sessions),
            id,
            generation,
            completion,
            cancel,
            on_complete,
        ));

        debug!(looping, fade_ms = fade.as_millis() as u64, "Playback started");
        Ok(())
    }

    /// Stops the session for `id`. Unknown ids are a no-op.
    pub async fn stop(&self, id: AlarmId) -> Result<()> {
        let Some(session) = self.sessions.lock().remove(&id) else {
            return Ok(());
        };

        session.cancel.cancel();
        self.output
            .stop(id)
            .await
            .map_err(|e| RingError::release(Resource::Audio, e))?;

        debug!(alarm_id = %id, "Playback stopped");
        Ok(())
    }

    /// Stops every session, attempting all of them before reporting the first failure.
    pub async fn stop_all(&self) -> Result<()> {
        let mut first_error = None;
        for id in self.playing_ids() {
            if let Err(e) = self.stop(id).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn is_playing(&self, id: AlarmId) -> bool {
        self.sessions.lock().contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Ids with a running session, ascending.
    pub fn playing_ids(&self) -> Vec<AlarmId> {
        let mut ids: Vec<AlarmId> = self.sessions.lock().keys().copied().collect();
        ids.sort();
        ids
    }
}

async fn fade_in(
    output: Arc<dyn AudioOutput>,
    id: AlarmId,
    fade: Duration,
    step: Duration,
    cancel: CancellationToken,
) {
    let (steps, interval) = fade_schedule(fade, step);

    for i in 1..=steps {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        let gain = i as f32 / steps as f32;
        if let Err(e) = output.set_gain(id, gain).await {
            warn!(alarm_id = %id, error = %e, "Fade step failed; leaving gain as is");
            return;
        }
    }
}

/// Number of gain steps and the wait between them. Saturates at `u32::MAX`
/// steps for fades far longer than the step.
fn fade_schedule(fade: Duration, step: Duration) -> (u32, Duration) {
    let steps = u32::try_from(fade.as_millis() / step.as_millis().max(1))
        .unwrap_or(u32::MAX)
        .max(1);
    let interval = fade.checked_div(steps).unwrap_or(step);
    (steps, interval)
}

async fn watch_completion(
    output: Arc<dyn AudioOutput>,
    sessions: Sessions,
    id: AlarmId,
    generation: u64,
    mut completion: Box<dyn PlaybackCompletion>,
    cancel: CancellationToken,
    on_complete: Option<CompletionCallback>,
) {
    let end = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        end = completion.wait() => end,
    };

    // A stop or a replacement may have raced the end of playback.
    let owned = {
        let mut sessions = sessions.lock();
        match sessions.get(&id) {
            Some(session) if session.generation == generation => {
                sessions.remove(&id);
                true
            }
            _ => false,
        }
    };
    if !owned {
        return;
    }

    match &end {
        PlaybackEnd::Completed => debug!(alarm_id = %id, "Playback reached its end"),
        PlaybackEnd::Released => debug!(alarm_id = %id, "Player released externally"),
        PlaybackEnd::Failed(reason) => warn!(alarm_id = %id, reason = %reason, "Player failed"),
    }

    if let Err(e) = output.stop(id).await {
        warn!(alarm_id = %id, resource = "audio", error = %e, "Failed to release finished player");
    }

    if matches!(end, PlaybackEnd::Completed | PlaybackEnd::Failed(_)) {
        if let Some(callback) = on_complete {
            callback(id);
        }
    }
}
