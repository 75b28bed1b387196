//! Musician: a worker that performs the events a conductor sends it.

pub mod api;
pub mod config;
pub mod error;
pub mod note;
pub mod registration;
pub mod sink;

pub use error::MusicianError;
pub use note::Note;
pub use sink::{LogSink, NoteError, NoteSink};
