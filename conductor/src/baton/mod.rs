//! The distribution engine.
//!
//! A [`PlaybackSession`] parses a score, asks the [`TrackRouter`] which worker
//! owns each track, and fans the tracks out: one dispatcher task per track
//! feeds a bounded channel, one [`WorkerSender`] per channel delivers to the
//! worker. Tracks never wait on each other.

mod control;
mod registry;
mod router;
mod sender;
mod session;

#[cfg(test)]
mod tests;

pub use control::{PauseState, PlaybackControl, SessionClock};
pub use registry::{Registration, WorkerRegistry};
pub use router::{dispatch_track, Route, RoutingPlan, TrackRouter};
pub use sender::{SenderReport, WorkerSender};
pub use session::{PlaybackSession, SessionConfig, DEFAULT_CHANNEL_CAPACITY};

use crate::score::ScoreError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BatonError {
    #[error("music already being played")]
    AlreadyPlaying,
    #[error("no music is being played")]
    NotPlaying,
    #[error(transparent)]
    InvalidScore(#[from] ScoreError),
}
