use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::note::Note;

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("empty payload")]
    Empty,
    #[error("malformed MIDI message: {0}")]
    Malformed(String),
    #[error("output unavailable: {0}")]
    Output(String),
}

/// Where performed notes go.
pub trait NoteSink: Send + Sync {
    fn perform(&self, note: &Note) -> Result<(), NoteError>;
}

/// Records every performed note through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink {
    performed: AtomicU64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn performed(&self) -> u64 {
        self.performed.load(Ordering::Relaxed)
    }
}

impl NoteSink for LogSink {
    fn perform(&self, note: &Note) -> Result<(), NoteError> {
        self.performed.fetch_add(1, Ordering::Relaxed);
        info!(channel = note.channel, message = %note.kind, "playing sound");
        Ok(())
    }
}
