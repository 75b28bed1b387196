//! Standard MIDI File source.
//!
//! Emits one event per channel message; the payload is the message's wire
//! bytes (status + data). Meta and SysEx events only feed the tempo map.

use std::time::Duration;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use super::{Event, Score, ScoreError, ScoreSource};

/// Tempo assumed until the first Set-Tempo event (120 bpm).
const DEFAULT_TEMPO_US_PER_BEAT: u64 = 500_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct SmfScoreSource;

impl ScoreSource for SmfScoreSource {
    fn parse(&self, raw: &[u8]) -> Result<Score, ScoreError> {
        let smf = Smf::parse(raw).map_err(|e| ScoreError::Malformed(e.to_string()))?;
        let clock = TickClock::new(&smf)?;

        let mut events = Vec::new();
        for (index, track) in smf.tracks.iter().enumerate() {
            let mut tick: u64 = 0;
            for ev in track {
                tick = advance(tick, ev.delta.as_int())?;
                if let TrackEventKind::Midi { channel, message } = ev.kind {
                    events.push(Event::new(
                        index,
                        clock.offset_at(tick)?,
                        encode_channel_message(channel.as_int(), message),
                    ));
                }
            }
        }

        tracing::debug!(
            tracks = smf.tracks.len(),
            events = events.len(),
            "parsed standard midi file"
        );
        Ok(Score::from_events(smf.tracks.len(), events))
    }
}

fn encode_channel_message(channel: u8, message: MidiMessage) -> Vec<u8> {
    let ch = channel & 0x0F;
    match message {
        MidiMessage::NoteOff { key, vel } => vec![0x80 | ch, key.as_int(), vel.as_int()],
        MidiMessage::NoteOn { key, vel } => vec![0x90 | ch, key.as_int(), vel.as_int()],
        MidiMessage::Aftertouch { key, vel } => vec![0xA0 | ch, key.as_int(), vel.as_int()],
        MidiMessage::Controller { controller, value } => {
            vec![0xB0 | ch, controller.as_int(), value.as_int()]
        }
        MidiMessage::ProgramChange { program } => vec![0xC0 | ch, program.as_int()],
        MidiMessage::ChannelAftertouch { vel } => vec![0xD0 | ch, vel.as_int()],
        MidiMessage::PitchBend { bend } => {
            let value = bend.0.as_int();
            vec![0xE0 | ch, (value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
        }
    }
}

fn advance(tick: u64, delta: u32) -> Result<u64, ScoreError> {
    tick.checked_add(u64::from(delta))
        .ok_or_else(|| ScoreError::Malformed("track length overflows the tick counter".to_string()))
}

fn too_long() -> ScoreError {
    ScoreError::Malformed("event offset exceeds the playable range".to_string())
}

/// Converts absolute ticks to wall-clock offsets.
///
/// Microsecond arithmetic is done in `u128`; an offset that does not fit a
/// `u64` of microseconds is rejected as malformed.
enum TickClock {
    /// Tempo segments `(start_tick, start_us, us_per_beat)`, sorted by tick.
    Metrical {
        ticks_per_beat: u64,
        segments: Vec<(u64, u128, u64)>,
    },
    Timecode {
        us_per_tick: f64,
    },
}

impl TickClock {
    fn new(smf: &Smf<'_>) -> Result<Self, ScoreError> {
        match smf.header.timing {
            Timing::Timecode(fps, subframes) => {
                let ticks_per_second = f64::from(fps.as_f32()) * f64::from(subframes.max(1));
                Ok(TickClock::Timecode {
                    us_per_tick: 1_000_000.0 / ticks_per_second,
                })
            }
            Timing::Metrical(tpb) => {
                let ticks_per_beat = u64::from(tpb.as_int()).max(1);

                let mut changes: Vec<(u64, u64)> = Vec::new();
                for track in &smf.tracks {
                    let mut tick = 0u64;
                    for ev in track {
                        tick = advance(tick, ev.delta.as_int())?;
                        if let TrackEventKind::Meta(MetaMessage::Tempo(t)) = ev.kind {
                            changes.push((tick, u64::from(t.as_int())));
                        }
                    }
                }
                changes.sort_by_key(|(tick, _)| *tick);

                let mut segments = vec![(0u64, 0u128, DEFAULT_TEMPO_US_PER_BEAT)];
                for (tick, tempo) in changes {
                    let &(seg_tick, seg_us, seg_tempo) =
                        segments.last().unwrap_or(&(0, 0, DEFAULT_TEMPO_US_PER_BEAT));
                    let start_us = seg_us + span_us(tick - seg_tick, seg_tempo, ticks_per_beat);
                    if seg_tick == tick {
                        segments.pop();
                    }
                    segments.push((tick, start_us, tempo));
                }

                Ok(TickClock::Metrical {
                    ticks_per_beat,
                    segments,
                })
            }
        }
    }

    fn offset_at(&self, tick: u64) -> Result<Duration, ScoreError> {
        let micros = match self {
            TickClock::Timecode { us_per_tick } => {
                let us = tick as f64 * us_per_tick;
                if us.is_nan() || us >= u64::MAX as f64 {
                    return Err(too_long());
                }
                us as u128
            }
            TickClock::Metrical {
                ticks_per_beat,
                segments,
            } => {
                let idx = segments.partition_point(|(start, _, _)| *start <= tick);
                let (seg_tick, seg_us, tempo) = segments[idx.saturating_sub(1)];
                seg_us + span_us(tick - seg_tick, tempo, *ticks_per_beat)
            }
        };
        u64::try_from(micros)
            .map(Duration::from_micros)
            .map_err(|_| too_long())
    }
}

/// Microseconds covered by `ticks` at `tempo` µs per beat.
fn span_us(ticks: u64, tempo: u64, ticks_per_beat: u64) -> u128 {
    u128::from(ticks) * u128::from(tempo) / u128::from(ticks_per_beat)
}
