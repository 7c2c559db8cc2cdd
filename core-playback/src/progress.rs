//! Periodic playhead sampling.
//!
//! The poller runs as its own tokio task and publishes
//! [`PlaybackEvent::Progress`] while the session is playing. It stops when
//! its cancellation token fires, which the owning session does on teardown
//! and on drop.

use bridge_traits::playback::MediaElement;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ProgressPoller {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressPoller {
    /// Spawns the polling task. Must be called from within a tokio runtime.
    pub fn spawn(
        media: Arc<dyn MediaElement>,
        event_bus: EventBus,
        playing: Arc<AtomicBool>,
        interval: Duration,
        token: CancellationToken,
    ) -> Self {
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !playing.load(Ordering::Acquire) {
                            continue;
                        }
                        match sample(media.as_ref()).await {
                            Ok(event) => {
                                event_bus.emit(CoreEvent::Playback(event)).ok();
                            }
                            Err(e) => debug!("Progress sample failed: {}", e),
                        }
                    }
                }
            }
            debug!("Progress poller stopped");
        });

        Self { token, handle }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the task and waits for it to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        self.handle.await.ok();
    }
}

async fn sample(media: &dyn MediaElement) -> bridge_traits::error::Result<PlaybackEvent> {
    let position = media.position().await?;
    let duration = media.duration().await?.unwrap_or_default();

    Ok(PlaybackEvent::Progress {
        position_ms: position.as_millis() as u64,
        duration_ms: duration.as_millis() as u64,
    })
}
