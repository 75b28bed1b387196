//! Scores and the sources that parse them.
//!
//! A [`ScoreSource`] turns raw bytes into a [`Score`]: a finite set of
//! per-track event streams, each ordered by time. A score is consumed by
//! exactly one playback session; nothing keeps it afterwards.

use std::time::Duration;

mod smf;

pub use smf::SmfScoreSource;

/// One performable unit tied to a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub track: usize,
    /// Time from the start of the score
    pub offset: Duration,
    /// Opaque payload delivered to the worker as-is
    pub payload: Vec<u8>,
}

impl Event {
    pub fn new(track: usize, offset: Duration, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            track,
            offset,
            payload: payload.into(),
        }
    }
}

/// Ordered events of a single track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub index: usize,
    events: Vec<Event>,
}

impl Track {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl IntoIterator for Track {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    tracks: Vec<Track>,
}

impl Score {
    /// Group a time-ordered event sequence into tracks.
    ///
    /// `track_count` may exceed the highest track index seen (tracks with no
    /// events still count); events with a larger index grow the score.
    pub fn from_events(track_count: usize, events: impl IntoIterator<Item = Event>) -> Self {
        let mut tracks: Vec<Track> = (0..track_count)
            .map(|index| Track {
                index,
                events: Vec::new(),
            })
            .collect();
        for event in events {
            while tracks.len() <= event.track {
                let index = tracks.len();
                tracks.push(Track {
                    index,
                    events: Vec::new(),
                });
            }
            tracks[event.track].events.push(event);
        }
        Self { tracks }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScoreError {
    #[error("malformed score: {0}")]
    Malformed(String),
}

/// Parses raw score bytes into per-track event streams.
pub trait ScoreSource: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<Score, ScoreError>;
}
