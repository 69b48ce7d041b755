//! Native player — one rodio sink per identifier, one stream at a time.
//!
//! ```text
//! play(id) → [fetch + decode-check <id>.wav on first play]
//!     → Load → playback thread creates a paused sink, replies on a oneshot
//!     → Play → sink for id: append decoder if drained, play
//!     → PlaybackExclusivity::on_play: pause + rewind whichever sink held the slot
//! ```
//!
//! The playback thread owns the rodio `OutputStream` (it is `!Send`), every
//! sink, and the active audio handle.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, warn};

use audiodeck_core::playback::{AudioElement, ElementId, PlaybackExclusivity};
use audiodeck_core::types::{Catalog, Identifier, ResourceKind};

use crate::error::PlayerError;
use crate::fetch::SharedFetcher;

/// Observable player state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    /// Identifier currently holding the active audio handle.
    pub active: Option<Identifier>,
    /// Identifiers whose audio has been loaded.
    pub loaded: Vec<Identifier>,
}

enum PlayCmd {
    Load(Identifier, Arc<[u8]>, oneshot::Sender<Result<(), String>>),
    Play(Identifier),
    Stop,
}

/// Cloneable handle to the playback thread.
#[derive(Clone)]
pub struct Player {
    catalog: Arc<Catalog>,
    fetcher: SharedFetcher,
    cmd_tx: std::sync::mpsc::Sender<PlayCmd>,
    status_rx: watch::Receiver<PlayerStatus>,
    loaded: Arc<Mutex<HashSet<Identifier>>>,
}

impl Player {
    /// Spawn the playback thread.
    pub fn new(catalog: Catalog, fetcher: SharedFetcher) -> Result<Self, PlayerError> {
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel::<PlayCmd>();
        let (status_tx, status_rx) = watch::channel(PlayerStatus::default());

        std::thread::Builder::new()
            .name("audiodeck-playback".into())
            .spawn(move || playback_thread(cmd_rx, status_tx))
            .map_err(PlayerError::Spawn)?;

        Ok(Self {
            catalog: Arc::new(catalog),
            fetcher,
            cmd_tx,
            status_rx,
            loaded: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Start `id`, silencing whatever else was playing.
    pub async fn play(&self, id: &Identifier) -> Result<(), PlayerError> {
        if !self.catalog.contains(id) {
            return Err(PlayerError::UnknownIdentifier(id.to_string()));
        }

        if !self.is_loaded(id) {
            let path = self.catalog.resource(id, ResourceKind::Audio);
            let bytes: Arc<[u8]> = Arc::from(self.fetcher.fetch(&path).await?);
            check_decodable(&bytes)?;

            let (reply_tx, reply_rx) = oneshot::channel();
            self.send(PlayCmd::Load(id.clone(), bytes.clone(), reply_tx))?;
            reply_rx
                .await
                .map_err(|_| PlayerError::Closed)?
                .map_err(PlayerError::Output)?;
            debug!("player: loaded {path} ({} bytes)", bytes.len());

            self.loaded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id.clone());
        }

        self.send(PlayCmd::Play(id.clone()))
    }

    /// Pause and rewind the active track.
    pub fn stop(&self) -> Result<(), PlayerError> {
        self.send(PlayCmd::Stop)
    }

    pub fn status(&self) -> PlayerStatus {
        self.status_rx.borrow().clone()
    }

    fn is_loaded(&self, id: &Identifier) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    fn send(&self, cmd: PlayCmd) -> Result<(), PlayerError> {
        self.cmd_tx.send(cmd).map_err(|_| PlayerError::Closed)
    }
}

/// Reject bytes rodio cannot decode before they reach the playback thread.
fn check_decodable(bytes: &Arc<[u8]>) -> Result<(), PlayerError> {
    Decoder::new(Cursor::new(bytes.clone()))
        .map(drop)
        .map_err(|e| PlayerError::Decode(e.to_string()))
}

// ─── Playback OS thread ───────────────────────────────────────────────────

/// One identifier's sink plus the bytes to refill it once drained.
#[derive(Clone)]
struct SinkElement {
    id: ElementId,
    sink: Arc<Sink>,
    bytes: Arc<[u8]>,
}

impl SinkElement {
    fn refill_if_drained(&self) {
        if !self.sink.empty() {
            return;
        }
        match Decoder::new(Cursor::new(self.bytes.clone())) {
            Ok(source) => self.sink.append(source),
            Err(e) => error!("playback: failed to decode audio: {e}"),
        }
    }
}

impl AudioElement for SinkElement {
    fn element_id(&self) -> ElementId {
        self.id
    }

    fn pause(&self) {
        self.sink.pause();
    }

    fn rewind(&self) {
        if let Err(e) = self.sink.try_seek(Duration::ZERO) {
            debug!("playback: rewind failed: {e}");
        }
    }
}

fn playback_thread(
    cmd_rx: std::sync::mpsc::Receiver<PlayCmd>,
    status_tx: watch::Sender<PlayerStatus>,
) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            error!("playback: failed to open audio output: {e}");
            return;
        }
    };

    let mut sinks: HashMap<Identifier, SinkElement> = HashMap::new();
    let mut exclusivity = PlaybackExclusivity::new();
    let mut next_id = 0u64;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            PlayCmd::Load(id, bytes, reply) => {
                let sink = match new_paused_sink(&stream_handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        error!("playback: failed to create sink: {e}");
                        let _ = reply.send(Err(e));
                        continue;
                    }
                };
                next_id += 1;
                let element = SinkElement {
                    id: ElementId(next_id),
                    sink: Arc::new(sink),
                    bytes,
                };
                element.refill_if_drained();
                sinks.insert(id.clone(), element);
                status_tx.send_modify(|s| s.loaded.push(id));
                let _ = reply.send(Ok(()));
            }
            PlayCmd::Play(id) => {
                let Some(element) = sinks.get(&id).cloned() else {
                    warn!("playback: {id} not loaded");
                    continue;
                };
                element.refill_if_drained();
                element.sink.play();
                if let Some(silenced) = exclusivity.on_play(element) {
                    debug!("playback: silenced element {}", silenced.0);
                }
                status_tx.send_modify(|s| s.active = Some(id));
            }
            PlayCmd::Stop => {
                exclusivity.reset();
                status_tx.send_modify(|s| s.active = None);
            }
        }
    }

    exclusivity.reset();
}

fn new_paused_sink(handle: &OutputStreamHandle) -> Result<Sink, String> {
    let sink = Sink::try_new(handle).map_err(|e| e.to_string())?;
    sink.pause();
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MemoryFetcher;

    // The playback thread needs an audio device; these tests stay on the
    // handle side, where commands are validated before they are sent.

    #[tokio::test]
    async fn unknown_identifier_is_rejected_without_fetch() {
        let catalog = Catalog::from_count("audio", 2);
        let fetcher = Arc::new(MemoryFetcher::full(&catalog));
        let player = Player::new(catalog, fetcher.clone()).unwrap();

        let err = player.play(&Identifier::ordinal(9)).await.unwrap_err();
        assert!(matches!(err, PlayerError::UnknownIdentifier(_)));
        assert_eq!(fetcher.requests(), 0);
    }

    #[tokio::test]
    async fn missing_audio_surfaces_fetch_error() {
        let catalog = Catalog::from_count("audio", 1);
        let fetcher = Arc::new(MemoryFetcher::default());
        let player = Player::new(catalog, fetcher.clone()).unwrap();

        let err = player.play(&Identifier::ordinal(1)).await.unwrap_err();
        assert!(matches!(err, PlayerError::Fetch(_)));
        assert_eq!(err.to_string(), "failed to load audio: Not Found");
        assert_eq!(fetcher.log(), ["audio/001.wav"]);
    }

    #[tokio::test]
    async fn undecodable_audio_is_an_error_and_stays_unloaded() {
        let catalog = Catalog::from_count("audio", 1);
        let fetcher =
            Arc::new(MemoryFetcher::default().with_file("audio/001.wav", b"not a wav"));
        let player = Player::new(catalog, fetcher.clone()).unwrap();
        let id = Identifier::ordinal(1);

        let err = player.play(&id).await.unwrap_err();
        assert!(matches!(err, PlayerError::Decode(_)), "{err}");
        assert!(!player.is_loaded(&id));

        // A later attempt fetches again instead of trusting a dead sink.
        let err = player.play(&id).await.unwrap_err();
        assert!(matches!(err, PlayerError::Decode(_)));
        assert_eq!(fetcher.requests(), 2);
        assert_eq!(player.status(), PlayerStatus::default());
    }

    #[test]
    fn wav_bytes_pass_the_decode_check() {
        let wav: Arc<[u8]> = Arc::from(audiodeck_core::wav::write_wav(&[0, 1, -1, 0], 24_000));
        assert!(check_decodable(&wav).is_ok());
        let junk: Arc<[u8]> = Arc::from(&b"RIFF"[..]);
        assert!(matches!(check_decodable(&junk), Err(PlayerError::Decode(_))));
    }

    #[test]
    fn status_starts_empty() {
        let player =
            Player::new(Catalog::default(), Arc::new(MemoryFetcher::default())).unwrap();
        assert_eq!(player.status(), PlayerStatus::default());
    }
}
