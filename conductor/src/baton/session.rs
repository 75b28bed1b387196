//! Single-flight playback session.
//!
//! `Idle → Playing → Idle`. The transition out of `Idle` is a compare-and-swap
//! on a watch cell, so concurrent `play` calls can never both start. The
//! distribution itself runs on a background task; the caller only learns
//! whether the session started.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shared_types::{PlaybackState, SessionStatus, SessionSummary};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::control::{PlaybackControl, SessionClock};
use super::registry::WorkerRegistry;
use super::router::{dispatch_track, TrackRouter};
use super::sender::{SenderReport, WorkerSender};
use super::BatonError;
use crate::client::WorkerClient;
use crate::score::{Score, ScoreSource};

/// Default per-worker channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of each worker's event channel
    pub channel_capacity: usize,
    /// Deadline for a single delivery call
    pub delivery_timeout: Duration,
    /// Pace events by their score offsets instead of sending as fast as possible
    pub realtime: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            delivery_timeout: Duration::from_secs(5),
            realtime: true,
        }
    }
}

#[derive(Clone, Default)]
enum Phase {
    #[default]
    Idle,
    Playing {
        session_id: String,
        cancel: CancellationToken,
    },
}

#[derive(Default)]
struct History {
    completed: u64,
    last: Option<SessionSummary>,
}

pub struct PlaybackSession {
    registry: Arc<WorkerRegistry>,
    client: Arc<dyn WorkerClient>,
    source: Arc<dyn ScoreSource>,
    config: SessionConfig,
    phase: watch::Sender<Phase>,
    control: PlaybackControl,
    history: RwLock<History>,
    /// Parent of every session token; cancelled on process shutdown
    shutdown: CancellationToken,
}

impl PlaybackSession {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        client: Arc<dyn WorkerClient>,
        source: Arc<dyn ScoreSource>,
        config: SessionConfig,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        let (phase, _) = watch::channel(Phase::Idle);
        Arc::new(Self {
            registry,
            client,
            source,
            config,
            phase,
            control: PlaybackControl::new(),
            history: RwLock::new(History::default()),
            shutdown,
        })
    }

    /// Start distributing `raw` and return the new session id.
    ///
    /// Fails with [`BatonError::AlreadyPlaying`] while another session runs and
    /// with [`BatonError::InvalidScore`] if the score does not parse; in both
    /// cases nothing is started.
    pub fn play(self: &Arc<Self>, raw: &[u8]) -> Result<String, BatonError> {
        let session_id = shared_types::new_session_id();
        let cancel = self.shutdown.child_token();

        let started = self.phase.send_if_modified(|phase| match phase {
            Phase::Idle => {
                self.control.reset();
                *phase = Phase::Playing {
                    session_id: session_id.clone(),
                    cancel: cancel.clone(),
                };
                true
            }
            Phase::Playing { .. } => false,
        });
        if !started {
            return Err(BatonError::AlreadyPlaying);
        }

        // Parsing runs while the session already counts as playing; the
        // guard hands the slot back if it errors or panics.
        let mut guard = StartGuard {
            session: &**self,
            armed: true,
        };
        let score = self.source.parse(raw)?;
        guard.armed = false;

        let this = Arc::clone(self);
        let id = session_id.clone();
        tokio::spawn(async move { this.run(id, score, cancel).await });
        Ok(session_id)
    }

    pub fn pause(&self) -> Result<(), BatonError> {
        let phase = self.phase.borrow();
        if matches!(*phase, Phase::Idle) {
            return Err(BatonError::NotPlaying);
        }
        let changed = self.control.pause();
        drop(phase);

        if changed {
            info!("playback paused");
        }
        Ok(())
    }

    pub fn resume(&self) -> Result<(), BatonError> {
        let phase = self.phase.borrow();
        if matches!(*phase, Phase::Idle) {
            return Err(BatonError::NotPlaying);
        }
        let changed = self.control.resume();
        drop(phase);

        if changed {
            info!("playback resumed");
        }
        Ok(())
    }

    /// Cancel the active session. Queued events are discarded; in-flight
    /// deliveries finish.
    pub fn stop(&self) -> Result<(), BatonError> {
        let phase = self.phase.borrow().clone();
        match phase {
            Phase::Idle => Err(BatonError::NotPlaying),
            Phase::Playing { session_id, cancel } => {
                info!(session = %session_id, "stopping session");
                cancel.cancel();
                Ok(())
            }
        }
    }

    pub fn state(&self) -> PlaybackState {
        match *self.phase.borrow() {
            Phase::Idle => PlaybackState::Idle,
            Phase::Playing { .. } => PlaybackState::Playing,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    /// Resolves once no session is active.
    pub async fn wait_idle(&self) {
        let mut phase = self.phase.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = phase.wait_for(|p| matches!(p, Phase::Idle)).await;
    }

    pub async fn status(&self) -> SessionStatus {
        let history = self.history.read().await;
        let (state, paused) = {
            let phase = self.phase.borrow();
            match *phase {
                Phase::Idle => (PlaybackState::Idle, false),
                Phase::Playing { .. } => (PlaybackState::Playing, self.control.is_paused()),
            }
        };
        SessionStatus {
            state,
            paused,
            workers: self.registry.len().await,
            sessions_completed: history.completed,
            last_session: history.last.clone(),
        }
    }

    /// Clear the pause flag and return to `Idle` in one step. The phase lock is
    /// taken before the control's, as in `play`, `pause` and `resume`.
    fn finish(&self) {
        self.phase.send_modify(|phase| {
            self.control.reset();
            *phase = Phase::Idle;
        });
    }

    async fn run(self: Arc<Self>, session_id: String, score: Score, cancel: CancellationToken) {
        let started_at = Utc::now();
        let tracks = score.track_count();
        info!(
            session = %session_id,
            tracks,
            events = score.event_count(),
            "session started"
        );

        let plan = TrackRouter::new(Arc::clone(&self.registry))
            .plan(score.into_tracks())
            .await;
        let routed_tracks = plan.routes.len();
        let clock_start = Instant::now();

        let mut senders = JoinSet::new();
        let mut dispatchers = JoinSet::new();
        for route in plan.routes {
            let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
            let sender = WorkerSender::new(
                route.worker.id,
                route.track.index,
                Arc::clone(&self.registry),
                Arc::clone(&self.client),
                self.control.subscribe(),
                self.config.delivery_timeout,
                cancel.clone(),
            );
            senders.spawn(sender.run(rx));

            let clock = self
                .config
                .realtime
                .then(|| SessionClock::new(clock_start, self.control.subscribe()));
            dispatchers.spawn(dispatch_track(route.track, tx, clock, cancel.clone()));
        }

        let mut unsent = 0u64;
        while let Some(joined) = dispatchers.join_next().await {
            match joined {
                Ok(n) => unsent += n,
                Err(e) => error!(session = %session_id, error = %e, "track dispatcher panicked"),
            }
        }

        let mut totals = SenderReport::default();
        while let Some(joined) = senders.join_next().await {
            match joined {
                Ok(report) => totals += report,
                Err(e) => error!(session = %session_id, error = %e, "worker sender panicked"),
            }
        }

        let summary = SessionSummary {
            session_id: session_id.clone(),
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
            tracks,
            routed_tracks,
            dropped_tracks: plan.dropped,
            delivered: totals.delivered,
            failed: totals.failed,
            skipped: totals.skipped + unsent,
            cancelled: cancel.is_cancelled(),
        };
        info!(
            session = %session_id,
            tracks,
            routed_tracks,
            dropped_tracks = summary.dropped_tracks.len(),
            delivered = summary.delivered,
            failed = summary.failed,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "session finished"
        );

        {
            let mut history = self.history.write().await;
            history.completed += 1;
            history.last = Some(summary);
        }
        self.finish();
    }
}

struct StartGuard<'a> {
    session: &'a PlaybackSession,
    armed: bool,
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.finish();
        }
    }
}
