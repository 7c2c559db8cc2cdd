//! # Playback State Machine
//!
//! One [`PlaybackStateMachine`] is one player session: it owns the playlist,
//! the current index and the shuffle/repeat modes, and drives exactly one
//! host [`MediaElement`].
//!
//! ## States
//!
//! - `Idle`: the playlist is empty and `current_index` is meaningless
//! - `Playing` / `Paused`: the playlist is non-empty and `current_index` is
//!   a valid index into it
//!
//! Every transition takes `&mut self`, so transitions run to completion one
//! at a time. Media failures during automatic transitions (load, next,
//! track end, queue edits) are logged and published as
//! [`PlaybackEvent::Error`] rather than returned; the session is left
//! `Paused` so the user can retry with [`PlaybackStateMachine::play_pause`].

use bridge_traits::playback::MediaElement;
use core_library::playlist::Track;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::progress::ProgressPoller;
use crate::state::{PlaybackSnapshot, PlayerStatus, RepeatMode};

pub struct PlaybackStateMachine {
    media: Arc<dyn MediaElement>,
    event_bus: EventBus,
    config: PlayerConfig,
    playlist: Vec<Track>,
    current_index: usize,
    status: PlayerStatus,
    shuffle: bool,
    repeat: RepeatMode,
    volume: f32,
    /// URL the media element currently points at
    loaded_url: Option<String>,
    rng: StdRng,
    playing: Arc<AtomicBool>,
    shutdown: CancellationToken,
    poller: Option<ProgressPoller>,
    released: bool,
}

impl PlaybackStateMachine {
    pub fn new(media: Arc<dyn MediaElement>, event_bus: EventBus, config: PlayerConfig) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            media,
            event_bus,
            volume: clamp_unit(config.initial_volume),
            config,
            playlist: Vec::new(),
            current_index: 0,
            status: PlayerStatus::Idle,
            shuffle: false,
            repeat: RepeatMode::Off,
            loaded_url: None,
            rng,
            playing: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
            poller: None,
            released: false,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    /// `None` while idle.
    pub fn current_index(&self) -> Option<usize> {
        self.status.is_loaded().then_some(self.current_index)
    }

    pub fn current_track(&self) -> Option<&Track> {
        if self.status.is_loaded() {
            self.playlist.get(self.current_index)
        } else {
            None
        }
    }

    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            current_index: self.current_index(),
            current_track: self.current_track().cloned(),
            playlist_len: self.playlist.len(),
            shuffle: self.shuffle,
            repeat: self.repeat,
            volume: self.volume,
        }
    }

    // ------------------------------------------------------------------
    // Playlist transitions
    // ------------------------------------------------------------------

    /// Replaces the playlist and starts track 0. An empty list leaves the
    /// session idle.
    #[instrument(skip(self, tracks), fields(count = tracks.len()))]
    pub async fn load_playlist(&mut self, tracks: Vec<Track>) -> Result<()> {
        self.ensure_active()?;

        if tracks.is_empty() {
            self.clear().await;
            return Ok(());
        }

        info!("Loading playlist of {} tracks", tracks.len());
        self.playlist = tracks;
        self.current_index = 0;
        self.start_current().await.ok();
        Ok(())
    }

    /// Replaces the playlist with a single track and plays it.
    pub async fn play_now(&mut self, track: Track) -> Result<()> {
        self.load_playlist(vec![track]).await
    }

    /// Toggles between playing and paused.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Media`] when the media element refuses to start;
    /// the session stays `Paused`. [`PlaybackError::EmptyPlaylist`] when idle.
    pub async fn play_pause(&mut self) -> Result<()> {
        self.ensure_active()?;
        let track = self
            .current_track()
            .cloned()
            .ok_or(PlaybackError::EmptyPlaylist)?;

        if self.status == PlayerStatus::Playing {
            self.media.pause().await?;
            let position = self.media.position().await.unwrap_or_default();
            self.set_status(PlayerStatus::Paused);
            self.emit(PlaybackEvent::Paused {
                title: track.title,
                position_ms: position.as_millis() as u64,
            });
            return Ok(());
        }

        let result = if self.loaded_url.as_deref() == Some(track.url.as_str()) {
            self.media.play().await
        } else {
            self.load_and_play(&track.url).await
        };
        self.after_play_attempt(&track, result)
    }

    pub async fn next(&mut self) -> Result<()> {
        self.ensure_active()?;
        if self.playlist.is_empty() {
            return Ok(());
        }

        self.current_index = self.step(1);
        self.start_current().await.ok();
        Ok(())
    }

    pub async fn prev(&mut self) -> Result<()> {
        self.ensure_active()?;
        if self.playlist.is_empty() {
            return Ok(());
        }

        self.current_index = self.step(-1);
        self.start_current().await.ok();
        Ok(())
    }

    /// Jumps to the track at `index` and plays it.
    pub async fn select(&mut self, index: usize) -> Result<()> {
        self.ensure_active()?;
        self.check_index(index)?;

        self.current_index = index;
        self.start_current().await.ok();
        Ok(())
    }

    /// Called by the host when the media element reports the end of a track.
    pub async fn on_track_end(&mut self) -> Result<()> {
        self.ensure_active()?;
        let Some(track) = self.current_track().cloned() else {
            return Ok(());
        };

        if self.repeat == RepeatMode::One {
            let result = match self.media.set_position(Duration::ZERO).await {
                Ok(()) => self.media.play().await,
                Err(e) => Err(e),
            };
            self.after_play_attempt(&track, result).ok();
            return Ok(());
        }

        let last = self.current_index + 1 >= self.playlist.len();
        if self.repeat == RepeatMode::All || !last {
            return self.next().await;
        }

        debug!("End of playlist reached");
        self.set_status(PlayerStatus::Paused);
        self.emit(PlaybackEvent::Ended);
        Ok(())
    }

    /// Called by the host when the media element reports an error.
    pub fn on_media_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        let title = self.current_track().map(|t| t.title.clone());
        warn!(title = ?title, "Media element error: {}", message);

        if self.status.is_loaded() {
            self.set_status(PlayerStatus::Paused);
        }
        self.emit(PlaybackEvent::Error { title, message });
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    /// Advances the repeat mode: `Off -> All -> One -> Off`.
    pub fn toggle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.repeat
    }

    // ------------------------------------------------------------------
    // Queue edits
    // ------------------------------------------------------------------

    /// Appends a track. Starts playback only if the playlist was empty.
    pub async fn enqueue(&mut self, track: Track) -> Result<()> {
        self.ensure_active()?;
        let was_empty = self.playlist.is_empty();
        self.playlist.push(track);

        if was_empty {
            self.current_index = 0;
            self.start_current().await.ok();
        }
        Ok(())
    }

    /// Inserts a track right after the current one. Starts playback only if
    /// the playlist was empty.
    pub async fn insert_next(&mut self, track: Track) -> Result<()> {
        self.ensure_active()?;
        if self.playlist.is_empty() {
            return self.enqueue(track).await;
        }

        self.playlist.insert(self.current_index + 1, track);
        Ok(())
    }

    /// Removes the track at `index` and returns it.
    ///
    /// Removing an earlier track keeps the current one playing; removing the
    /// current track plays whatever now occupies its slot (wrapping to the
    /// start); removing the last track makes the session idle.
    pub async fn remove_at(&mut self, index: usize) -> Result<Track> {
        self.ensure_active()?;
        self.check_index(index)?;

        let removed = self.playlist.remove(index);

        if self.playlist.is_empty() {
            self.clear().await;
        } else if index < self.current_index {
            self.current_index -= 1;
        } else if index == self.current_index {
            self.current_index %= self.playlist.len();
            self.start_current().await.ok();
        }

        Ok(removed)
    }

    /// Pauses, rewinds and empties the playlist.
    pub async fn stop_and_clear(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.clear().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Media controls
    // ------------------------------------------------------------------

    /// Moves the playhead to `fraction` of the track duration. Does nothing
    /// while the duration is unknown.
    pub async fn seek(&mut self, fraction: f64) -> Result<()> {
        self.ensure_active()?;
        if !self.status.is_loaded() {
            return Ok(());
        }

        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };

        if let Some(duration) = self.media.duration().await? {
            self.media.set_position(duration.mul_f64(fraction)).await?;
        }
        Ok(())
    }

    pub async fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.ensure_active()?;
        let volume = clamp_unit(volume);
        self.media.set_volume(volume).await?;
        self.volume = volume;
        Ok(())
    }

    /// Starts publishing [`PlaybackEvent::Progress`] at the configured
    /// interval. Replaces any running poller. Requires a tokio runtime.
    pub fn start_progress(&mut self) -> Result<()> {
        self.ensure_active()?;
        if let Some(previous) = self.poller.take() {
            previous.stop();
        }

        self.poller = Some(ProgressPoller::spawn(
            Arc::clone(&self.media),
            self.event_bus.clone(),
            Arc::clone(&self.playing),
            self.config.progress_interval,
            self.shutdown.child_token(),
        ));
        Ok(())
    }

    /// Ends the session: stops progress polling and releases the media
    /// element. Idempotent; every other operation fails afterwards.
    pub async fn teardown(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }

        self.shutdown.cancel();
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }

        self.playlist.clear();
        self.current_index = 0;
        self.loaded_url = None;
        self.set_status(PlayerStatus::Idle);
        self.released = true;

        self.media.release().await?;
        info!("Player session released");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_active(&self) -> Result<()> {
        if self.released {
            Err(PlaybackError::Released)
        } else {
            Ok(())
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.playlist.len() {
            Ok(())
        } else {
            Err(PlaybackError::InvalidIndex {
                index,
                len: self.playlist.len(),
            })
        }
    }

    /// Index reached by moving `delta` tracks, honoring shuffle.
    fn step(&mut self, delta: isize) -> usize {
        let len = self.playlist.len();
        if self.shuffle {
            return self.rng.gen_range(0..len);
        }
        (self.current_index as isize + delta).rem_euclid(len as isize) as usize
    }

    fn set_status(&mut self, status: PlayerStatus) {
        self.status = status;
        self.playing
            .store(status == PlayerStatus::Playing, Ordering::Release);
    }

    fn emit(&self, event: PlaybackEvent) {
        self.event_bus.emit(CoreEvent::Playback(event)).ok();
    }

    async fn start_current(&mut self) -> Result<()> {
        let Some(track) = self.playlist.get(self.current_index).cloned() else {
            self.set_status(PlayerStatus::Idle);
            return Err(PlaybackError::EmptyPlaylist);
        };

        self.emit(PlaybackEvent::TrackChanged {
            index: self.current_index,
            title: track.title.clone(),
        });
        let result = self.load_and_play(&track.url).await;
        self.after_play_attempt(&track, result)
    }

    async fn load_and_play(&mut self, url: &str) -> bridge_traits::error::Result<()> {
        self.loaded_url = None;
        self.media.set_source(url).await?;
        self.loaded_url = Some(url.to_string());
        self.media.set_volume(self.volume).await?;
        self.media.play().await
    }

    fn after_play_attempt(
        &mut self,
        track: &Track,
        result: bridge_traits::error::Result<()>,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                self.set_status(PlayerStatus::Playing);
                self.emit(PlaybackEvent::Started {
                    title: track.title.clone(),
                });
                Ok(())
            }
            Err(e) => {
                warn!(title = %track.title, "Playback did not start: {}", e);
                self.set_status(PlayerStatus::Paused);
                self.emit(PlaybackEvent::Error {
                    title: Some(track.title.clone()),
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    async fn clear(&mut self) {
        if self.status.is_loaded() {
            if let Err(e) = self.media.pause().await {
                warn!("Failed to pause media while clearing: {}", e);
            }
            if let Err(e) = self.media.set_position(Duration::ZERO).await {
                warn!("Failed to rewind media while clearing: {}", e);
            }
        }

        let was_loaded = self.status.is_loaded();
        self.playlist.clear();
        self.current_index = 0;
        self.set_status(PlayerStatus::Idle);
        if was_loaded {
            self.emit(PlaybackEvent::Stopped);
        }
    }
}

impl Drop for PlaybackStateMachine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::BridgeError;
    use mockall::mock;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::broadcast::Receiver;

    mock! {
        Media {}

        #[async_trait]
        impl MediaElement for Media {
            async fn set_source(&self, url: &str) -> bridge_traits::error::Result<()>;
            async fn play(&self) -> bridge_traits::error::Result<()>;
            async fn pause(&self) -> bridge_traits::error::Result<()>;
            async fn set_position(&self, position: Duration) -> bridge_traits::error::Result<()>;
            async fn position(&self) -> bridge_traits::error::Result<Duration>;
            async fn duration(&self) -> bridge_traits::error::Result<Option<Duration>>;
            async fn set_volume(&self, volume: f32) -> bridge_traits::error::Result<()>;
            async fn release(&self) -> bridge_traits::error::Result<()>;
        }
    }

    /// What the mock media element was asked to do.
    #[derive(Default)]
    struct MediaLog {
        sources: Mutex<Vec<String>>,
        positions: Mutex<Vec<Duration>>,
        volumes: Mutex<Vec<f32>>,
        plays: AtomicUsize,
        pauses: AtomicUsize,
        releases: AtomicUsize,
        reject_play: AtomicBool,
        duration: Mutex<Option<Duration>>,
    }

    impl MediaLog {
        fn sources(&self) -> Vec<String> {
            self.sources.lock().unwrap().clone()
        }
    }

    fn mock_media(log: &Arc<MediaLog>) -> MockMedia {
        let mut media = MockMedia::new();

        let l = Arc::clone(log);
        media.expect_set_source().returning(move |url| {
            l.sources.lock().unwrap().push(url.to_string());
            Ok(())
        });
        let l = Arc::clone(log);
        media.expect_play().returning(move || {
            l.plays.fetch_add(1, Ordering::SeqCst);
            if l.reject_play.load(Ordering::SeqCst) {
                Err(BridgeError::Media("autoplay blocked".to_string()))
            } else {
                Ok(())
            }
        });
        let l = Arc::clone(log);
        media.expect_pause().returning(move || {
            l.pauses.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let l = Arc::clone(log);
        media.expect_set_position().returning(move |position| {
            l.positions.lock().unwrap().push(position);
            Ok(())
        });
        media
            .expect_position()
            .returning(|| Ok(Duration::from_secs(3)));
        let l = Arc::clone(log);
        media
            .expect_duration()
            .returning(move || Ok(*l.duration.lock().unwrap()));
        let l = Arc::clone(log);
        media.expect_set_volume().returning(move |volume| {
            l.volumes.lock().unwrap().push(volume);
            Ok(())
        });
        let l = Arc::clone(log);
        media.expect_release().returning(move || {
            l.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        media
    }

    fn player(log: &Arc<MediaLog>) -> (PlaybackStateMachine, Receiver<CoreEvent>) {
        let event_bus = EventBus::new(128);
        let events = event_bus.subscribe();
        let player = PlaybackStateMachine::new(
            Arc::new(mock_media(log)),
            event_bus,
            PlayerConfig::default().with_shuffle_seed(7),
        );
        (player, events)
    }

    fn tracks(count: usize) -> Vec<Track> {
        (0..count)
            .map(|i| Track::new(format!("Song {}", i), format!("https://cdn.test/audio/{}.mp3", i)))
            .collect()
    }

    fn drain(events: &mut Receiver<CoreEvent>) -> Vec<PlaybackEvent> {
        let mut out = Vec::new();
        while let Ok(CoreEvent::Playback(event)) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_load_playlist_starts_first_track() {
        let log = Arc::new(MediaLog::default());
        let (mut player, mut events) = player(&log);

        player.load_playlist(tracks(3)).await.unwrap();

        assert_eq!(player.status(), PlayerStatus::Playing);
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(log.sources(), vec!["https://cdn.test/audio/0.mp3"]);
        assert_eq!(
            drain(&mut events),
            vec![
                PlaybackEvent::TrackChanged {
                    index: 0,
                    title: "Song 0".to_string()
                },
                PlaybackEvent::Started {
                    title: "Song 0".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_autoplay_is_reported_not_thrown() {
        let log = Arc::new(MediaLog::default());
        log.reject_play.store(true, Ordering::SeqCst);
        let (mut player, mut events) = player(&log);

        player
            .load_playlist(tracks(2))
            .await
            .expect("Should swallow media errors on load");

        assert_eq!(player.status(), PlayerStatus::Paused);
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, PlaybackEvent::Error { .. })));

        let result = player.play_pause().await;
        assert!(matches!(result, Err(PlaybackError::Media(_))));
        assert_eq!(player.status(), PlayerStatus::Paused);

        log.reject_play.store(false, Ordering::SeqCst);
        player.play_pause().await.unwrap();
        assert_eq!(player.status(), PlayerStatus::Playing);
        assert_eq!(log.sources().len(), 1, "Should reuse the loaded source");
    }

    #[tokio::test]
    async fn test_play_pause_toggles() {
        let log = Arc::new(MediaLog::default());
        let (mut player, mut events) = player(&log);
        player.load_playlist(tracks(1)).await.unwrap();
        drain(&mut events);

        player.play_pause().await.unwrap();
        assert_eq!(player.status(), PlayerStatus::Paused);
        assert_eq!(
            drain(&mut events),
            vec![PlaybackEvent::Paused {
                title: "Song 0".to_string(),
                position_ms: 3_000
            }]
        );

        player.play_pause().await.unwrap();
        assert_eq!(player.status(), PlayerStatus::Playing);
    }

    #[tokio::test]
    async fn test_empty_playlist_stays_idle() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);

        player.load_playlist(Vec::new()).await.unwrap();
        player.next().await.unwrap();
        player.prev().await.unwrap();
        player.on_track_end().await.unwrap();

        assert_eq!(player.status(), PlayerStatus::Idle);
        assert_eq!(player.current_index(), None);
        assert!(matches!(
            player.play_pause().await,
            Err(PlaybackError::EmptyPlaylist)
        ));
        assert!(log.sources().is_empty());
    }

    #[tokio::test]
    async fn test_next_wraps_around() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(3)).await.unwrap();

        let mut visited = Vec::new();
        for _ in 0..3 {
            player.next().await.unwrap();
            visited.push(player.current_index().unwrap());
        }

        assert_eq!(visited, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_prev_wraps_to_last() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(4)).await.unwrap();

        player.prev().await.unwrap();

        assert_eq!(player.current_index(), Some(3));
        assert_eq!(log.sources().last().unwrap(), "https://cdn.test/audio/3.mp3");
    }

    #[tokio::test]
    async fn test_shuffle_picks_valid_indices() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(5)).await.unwrap();
        assert!(player.toggle_shuffle());

        for _ in 0..50 {
            player.next().await.unwrap();
            assert!(player.current_index().unwrap() < 5);
        }
        assert_eq!(player.status(), PlayerStatus::Playing);
    }

    #[tokio::test]
    async fn test_toggles_have_no_media_side_effects() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(2)).await.unwrap();
        let plays = log.plays.load(Ordering::SeqCst);

        assert_eq!(player.toggle_repeat(), RepeatMode::All);
        assert_eq!(player.toggle_repeat(), RepeatMode::One);
        assert_eq!(player.toggle_repeat(), RepeatMode::Off);
        player.toggle_shuffle();
        player.toggle_shuffle();

        assert_eq!(log.plays.load(Ordering::SeqCst), plays);
        assert_eq!(log.sources().len(), 1);
        assert_eq!(player.current_index(), Some(0));
    }

    #[tokio::test]
    async fn test_track_end_advances_then_stops() {
        let log = Arc::new(MediaLog::default());
        let (mut player, mut events) = player(&log);
        player.load_playlist(tracks(2)).await.unwrap();

        player.on_track_end().await.unwrap();
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.status(), PlayerStatus::Playing);
        drain(&mut events);

        player.on_track_end().await.unwrap();
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.status(), PlayerStatus::Paused);
        assert_eq!(drain(&mut events), vec![PlaybackEvent::Ended]);
    }

    #[tokio::test]
    async fn test_track_end_repeat_all_wraps() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(2)).await.unwrap();
        player.toggle_repeat();
        player.select(1).await.unwrap();

        player.on_track_end().await.unwrap();

        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.status(), PlayerStatus::Playing);
    }

    #[tokio::test]
    async fn test_track_end_repeat_one_restarts() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(3)).await.unwrap();
        player.toggle_repeat();
        player.toggle_repeat();

        player.on_track_end().await.unwrap();

        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.status(), PlayerStatus::Playing);
        assert_eq!(*log.positions.lock().unwrap(), vec![Duration::ZERO]);
        assert_eq!(log.sources().len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_does_not_interrupt() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(2)).await.unwrap();
        let plays = log.plays.load(Ordering::SeqCst);

        player
            .enqueue(Track::new("Extra", "https://cdn.test/audio/extra.mp3"))
            .await
            .unwrap();

        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.playlist().len(), 3);
        assert_eq!(player.playlist()[2].title, "Extra");
        assert_eq!(log.plays.load(Ordering::SeqCst), plays);
        assert_eq!(player.status(), PlayerStatus::Playing);
    }

    #[tokio::test]
    async fn test_enqueue_on_empty_starts_playback() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);

        player
            .enqueue(Track::new("Only", "https://cdn.test/audio/only.mp3"))
            .await
            .unwrap();

        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.status(), PlayerStatus::Playing);
        assert_eq!(log.sources(), vec!["https://cdn.test/audio/only.mp3"]);
    }

    #[tokio::test]
    async fn test_insert_next_splices_after_current() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(3)).await.unwrap();
        player.select(1).await.unwrap();

        player
            .insert_next(Track::new("Next", "https://cdn.test/audio/next.mp3"))
            .await
            .unwrap();

        let titles: Vec<_> = player.playlist().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Song 0", "Song 1", "Next", "Song 2"]);
        assert_eq!(player.current_index(), Some(1));

        player.next().await.unwrap();
        assert_eq!(player.current_track().unwrap().title, "Next");
    }

    #[tokio::test]
    async fn test_remove_before_current_keeps_track() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(3)).await.unwrap();
        player.select(2).await.unwrap();
        let sources = log.sources().len();

        let removed = player.remove_at(0).await.unwrap();

        assert_eq!(removed.title, "Song 0");
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.current_track().unwrap().title, "Song 2");
        assert_eq!(log.sources().len(), sources, "Should not reload the playing track");
    }

    #[tokio::test]
    async fn test_remove_current_plays_successor() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(3)).await.unwrap();

        player.remove_at(0).await.unwrap();
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.current_track().unwrap().title, "Song 1");
        assert_eq!(player.status(), PlayerStatus::Playing);

        player.select(1).await.unwrap();
        player.remove_at(1).await.unwrap();
        assert_eq!(player.current_index(), Some(0), "Should wrap to the start");
        assert_eq!(log.sources().last().unwrap(), "https://cdn.test/audio/1.mp3");
    }

    #[tokio::test]
    async fn test_remove_last_track_goes_idle() {
        let log = Arc::new(MediaLog::default());
        let (mut player, mut events) = player(&log);
        player.load_playlist(tracks(1)).await.unwrap();
        drain(&mut events);

        player.remove_at(0).await.unwrap();

        assert_eq!(player.status(), PlayerStatus::Idle);
        assert!(player.playlist().is_empty());
        assert_eq!(drain(&mut events), vec![PlaybackEvent::Stopped]);
    }

    #[tokio::test]
    async fn test_remove_out_of_range() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(2)).await.unwrap();

        let result = player.remove_at(5).await;

        assert!(matches!(
            result,
            Err(PlaybackError::InvalidIndex { index: 5, len: 2 })
        ));
        assert_eq!(player.playlist().len(), 2);
    }

    #[tokio::test]
    async fn test_seek_clamps_fraction() {
        let log = Arc::new(MediaLog::default());
        *log.duration.lock().unwrap() = Some(Duration::from_secs(200));
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(1)).await.unwrap();

        player.seek(0.5).await.unwrap();
        player.seek(1.5).await.unwrap();
        player.seek(-1.0).await.unwrap();

        assert_eq!(
            *log.positions.lock().unwrap(),
            vec![
                Duration::from_secs(100),
                Duration::from_secs(200),
                Duration::ZERO
            ]
        );
        assert_eq!(player.status(), PlayerStatus::Playing);
    }

    #[tokio::test]
    async fn test_seek_without_duration_is_noop() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(1)).await.unwrap();

        player.seek(0.5).await.unwrap();

        assert!(log.positions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_and_clear() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(3)).await.unwrap();

        player.stop_and_clear().await.unwrap();

        assert_eq!(player.status(), PlayerStatus::Idle);
        assert!(player.playlist().is_empty());
        assert_eq!(log.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(*log.positions.lock().unwrap(), vec![Duration::ZERO]);
    }

    #[tokio::test]
    async fn test_set_volume_clamps() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);

        player.set_volume(1.7).await.unwrap();
        assert_eq!(player.volume(), 1.0);

        player.set_volume(-0.2).await.unwrap();
        assert_eq!(player.volume(), 0.0);
        assert_eq!(*log.volumes.lock().unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_snapshot() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(2)).await.unwrap();
        player.toggle_repeat();

        let snapshot = player.snapshot();

        assert_eq!(snapshot.status, PlayerStatus::Playing);
        assert_eq!(snapshot.current_index, Some(0));
        assert_eq!(snapshot.current_track.unwrap().title, "Song 0");
        assert_eq!(snapshot.playlist_len, 2);
        assert_eq!(snapshot.repeat, RepeatMode::All);
        assert!(!snapshot.shuffle);
    }

    #[tokio::test]
    async fn test_teardown_releases_once() {
        let log = Arc::new(MediaLog::default());
        let (mut player, _events) = player(&log);
        player.load_playlist(tracks(2)).await.unwrap();
        player.start_progress().unwrap();

        player.teardown().await.unwrap();
        player.teardown().await.unwrap();

        assert_eq!(log.releases.load(Ordering::SeqCst), 1);
        assert_eq!(player.status(), PlayerStatus::Idle);
        assert!(matches!(
            player.load_playlist(tracks(1)).await,
            Err(PlaybackError::Released)
        ));
    }

    #[tokio::test]
    async fn test_media_error_pauses() {
        let log = Arc::new(MediaLog::default());
        let (mut player, mut events) = player(&log);
        player.load_playlist(tracks(1)).await.unwrap();
        drain(&mut events);

        player.on_media_error("decode failed");

        assert_eq!(player.status(), PlayerStatus::Paused);
        assert_eq!(
            drain(&mut events),
            vec![PlaybackEvent::Error {
                title: Some("Song 0".to_string()),
                message: "decode failed".to_string()
            }]
        );
    }
}
