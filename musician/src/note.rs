//! Validation of incoming event payloads.

use midly::live::LiveEvent;
use midly::MidiMessage;

use crate::sink::NoteError;

/// A MIDI channel message received from the conductor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub channel: u8,
    pub kind: NoteKind,
    raw: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8, velocity: u8 },
    Aftertouch { key: u8, pressure: u8 },
    Controller { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    ChannelAftertouch { pressure: u8 },
    PitchBend { value: i16 },
}

impl Note {
    /// Parse `raw` as exactly one channel message.
    pub fn parse(raw: &[u8]) -> Result<Self, NoteError> {
        if raw.is_empty() {
            return Err(NoteError::Empty);
        }
        let event = LiveEvent::parse(raw).map_err(|e| NoteError::Malformed(e.to_string()))?;
        let LiveEvent::Midi { channel, message } = event else {
            return Err(NoteError::Malformed(
                "not a channel voice message".to_string(),
            ));
        };

        let kind = match message {
            MidiMessage::NoteOn { key, vel } => NoteKind::NoteOn {
                key: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, vel } => NoteKind::NoteOff {
                key: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::Aftertouch { key, vel } => NoteKind::Aftertouch {
                key: key.as_int(),
                pressure: vel.as_int(),
            },
            MidiMessage::Controller { controller, value } => NoteKind::Controller {
                controller: controller.as_int(),
                value: value.as_int(),
            },
            MidiMessage::ProgramChange { program } => NoteKind::ProgramChange {
                program: program.as_int(),
            },
            MidiMessage::ChannelAftertouch { vel } => NoteKind::ChannelAftertouch {
                pressure: vel.as_int(),
            },
            MidiMessage::PitchBend { bend } => NoteKind::PitchBend {
                value: bend.as_int(),
            },
        };

        Ok(Self {
            channel: channel.as_int(),
            kind,
            raw: raw.to_vec(),
        })
    }

    /// The message bytes as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

impl std::fmt::Display for NoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteKind::NoteOn { key, velocity } => write!(f, "note_on key={key} vel={velocity}"),
            NoteKind::NoteOff { key, velocity } => write!(f, "note_off key={key} vel={velocity}"),
            NoteKind::Aftertouch { key, pressure } => {
                write!(f, "aftertouch key={key} pressure={pressure}")
            }
            NoteKind::Controller { controller, value } => {
                write!(f, "controller cc={controller} value={value}")
            }
            NoteKind::ProgramChange { program } => write!(f, "program_change program={program}"),
            NoteKind::ChannelAftertouch { pressure } => {
                write!(f, "channel_aftertouch pressure={pressure}")
            }
            NoteKind::PitchBend { value } => write!(f, "pitch_bend value={value}"),
        }
    }
}
