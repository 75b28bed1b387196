//! Track routing: track index → worker at that registration position.

use std::sync::Arc;

use shared_types::Worker;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::control::SessionClock;
use super::registry::WorkerRegistry;
use crate::score::{Event, Track};

/// A track together with the worker it was assigned to.
pub struct Route {
    pub track: Track,
    pub worker: Worker,
}

#[derive(Default)]
pub struct RoutingPlan {
    pub routes: Vec<Route>,
    /// Indices of tracks that had no worker
    pub dropped: Vec<usize>,
}

pub struct TrackRouter {
    registry: Arc<WorkerRegistry>,
}

impl TrackRouter {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }

    /// Assign every track to the worker at the same registration position.
    ///
    /// The assignment is taken from one registry snapshot, so registrations
    /// arriving mid-session never reshuffle tracks of the running session.
    /// Tracks beyond the number of workers are dropped with a warning.
    pub async fn plan(&self, tracks: Vec<Track>) -> RoutingPlan {
        let workers = self.registry.snapshot().await;
        let mut plan = RoutingPlan::default();

        for track in tracks {
            match workers.get(track.index) {
                Some(worker) => {
                    debug!(track = track.index, worker = %worker.id, address = %worker.address, "track routed");
                    plan.routes.push(Route {
                        track,
                        worker: worker.clone(),
                    });
                }
                None => {
                    warn!(
                        track = track.index,
                        events = track.len(),
                        workers = workers.len(),
                        "skipping track: no worker at this position"
                    );
                    plan.dropped.push(track.index);
                }
            }
        }
        plan
    }
}

/// Feed one track into its worker's channel, in order.
///
/// Blocks on a full channel rather than dropping; each track runs in its own
/// task so a slow worker only holds up its own track. Returns the number of
/// events left unsent because the session was cancelled or the sender went away.
pub async fn dispatch_track(
    track: Track,
    events: mpsc::Sender<Event>,
    mut clock: Option<SessionClock>,
    cancel: CancellationToken,
) -> u64 {
    let index = track.index;
    let mut remaining = track.len() as u64;

    for event in track {
        if let Some(clock) = clock.as_mut() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = clock.wait_until(event.offset) => {}
            }
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = events.send(event) => {
                if sent.is_err() {
                    warn!(track = index, "sender closed before track finished");
                    break;
                }
            }
        }
        remaining -= 1;
    }

    debug!(track = index, unsent = remaining, "track dispatch finished");
    remaining
}
