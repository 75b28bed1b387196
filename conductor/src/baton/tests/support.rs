use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use shared_types::{Worker, WorkerId};

use crate::baton::{PlaybackSession, SessionConfig, WorkerRegistry};
use crate::client::{DeliveryError, WorkerClient};
use crate::score::{Event, Score, ScoreError, ScoreSource};
use tokio_util::sync::CancellationToken;

/// Records every delivery; can fail or stall chosen addresses.
#[derive(Default)]
pub(crate) struct RecordingClient {
    deliveries: Mutex<Vec<(String, Vec<u8>)>>,
    failing: Mutex<HashSet<String>>,
    slow: Mutex<Option<(String, Duration)>>,
}

impl RecordingClient {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub(crate) fn slow_for(&self, address: &str, delay: Duration) {
        *self.slow.lock().unwrap() = Some((address.to_string(), delay));
    }

    pub(crate) fn deliveries(&self) -> Vec<(String, Vec<u8>)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub(crate) fn payloads_for(&self, address: &str) -> Vec<Vec<u8>> {
        self.deliveries()
            .into_iter()
            .filter(|(a, _)| a == address)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait]
impl WorkerClient for RecordingClient {
    async fn deliver_event(&self, address: &str, payload: &[u8]) -> Result<(), DeliveryError> {
        let delay = self
            .slow
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(slow, _)| slow == address)
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(address) {
            return Err(DeliveryError::Transport("connection refused".to_string()));
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((address.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Returns a fixed score; the bytes `b"bad"` fail to parse and `b"panic"`
/// panics.
pub(crate) struct ScriptedSource {
    score: Score,
}

impl ScriptedSource {
    pub(crate) fn new(score: Score) -> Arc<Self> {
        Arc::new(Self { score })
    }
}

impl ScoreSource for ScriptedSource {
    fn parse(&self, raw: &[u8]) -> Result<Score, ScoreError> {
        if raw == b"bad" {
            return Err(ScoreError::Malformed("scripted failure".to_string()));
        }
        if raw == b"panic" {
            panic!("scripted parser panic");
        }
        Ok(self.score.clone())
    }
}

/// `tracks` tracks of `per_track` events spaced `step` apart.
/// Payload is `[track, event_index]`.
pub(crate) fn score(tracks: usize, per_track: usize, step: Duration) -> Score {
    let events = (0..tracks).flat_map(move |t| {
        (0..per_track).map(move |i| Event::new(t, step * i as u32, vec![t as u8, i as u8]))
    });
    Score::from_events(tracks, events)
}

pub(crate) fn worker(byte: u8, address: &str) -> Worker {
    Worker {
        id: WorkerId::from_bytes([byte; shared_types::ID_SIZE]),
        address: address.to_string(),
    }
}

pub(crate) fn config(realtime: bool) -> SessionConfig {
    SessionConfig {
        channel_capacity: 4,
        delivery_timeout: Duration::from_secs(5),
        realtime,
    }
}

/// Pauses the session it is attached to while parsing, then returns `score`.
pub(crate) struct PausingSource {
    score: Score,
    session: OnceLock<Weak<PlaybackSession>>,
}

impl PausingSource {
    pub(crate) fn new(score: Score) -> Arc<Self> {
        Arc::new(Self {
            score,
            session: OnceLock::new(),
        })
    }

    pub(crate) fn attach(&self, session: &Arc<PlaybackSession>) {
        let _ = self.session.set(Arc::downgrade(session));
    }
}

impl ScoreSource for PausingSource {
    fn parse(&self, _raw: &[u8]) -> Result<Score, ScoreError> {
        if let Some(session) = self.session.get().and_then(Weak::upgrade) {
            session.pause().unwrap();
        }
        Ok(self.score.clone())
    }
}

/// Format 0 file at the slowest tempo with `notes` note-ons, each the
/// largest encodable delta after the previous one.
pub(crate) fn stretched_smf(division: u16, notes: usize) -> Vec<u8> {
    let mut track = vec![0x00, 0xFF, 0x51, 0x03, 0xFF, 0xFF, 0xFF];
    for _ in 0..notes {
        track.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x7F, 0x90, 0x3C, 0x40]);
    }
    track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut raw = b"MThd".to_vec();
    raw.extend_from_slice(&6u32.to_be_bytes());
    raw.extend_from_slice(&0u16.to_be_bytes());
    raw.extend_from_slice(&1u16.to_be_bytes());
    raw.extend_from_slice(&division.to_be_bytes());
    raw.extend_from_slice(b"MTrk");
    raw.extend_from_slice(&(track.len() as u32).to_be_bytes());
    raw.extend(track);
    raw
}

pub(crate) fn setup_session(
    score: Score,
    config: SessionConfig,
) -> (Arc<PlaybackSession>, Arc<WorkerRegistry>, Arc<RecordingClient>) {
    setup_with_source(ScriptedSource::new(score), config)
}

pub(crate) fn setup_with_source(
    source: Arc<dyn ScoreSource>,
    config: SessionConfig,
) -> (Arc<PlaybackSession>, Arc<WorkerRegistry>, Arc<RecordingClient>) {
    let registry = WorkerRegistry::new();
    let client = RecordingClient::new();
    let session = PlaybackSession::new(
        Arc::clone(&registry),
        client.clone(),
        source,
        config,
        CancellationToken::new(),
    );
    (session, registry, client)
}
