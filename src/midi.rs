//! MIDI utilities and message types
//!
//! Decodes the three-byte channel messages the APC Key 25 emits. LED output
//! goes through the batched cells in `render`.

use std::fmt;
use thiserror::Error;

/// Errors raised while decoding raw surface bytes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MidiError {
    #[error("empty MIDI message")]
    Empty,
    #[error("running status is not supported (first byte {0:#04X})")]
    RunningStatus(u8),
    #[error("message {status:#04X} is truncated ({len} bytes)")]
    Truncated { status: u8, len: usize },
    #[error("unsupported status byte {0:#04X}")]
    Unsupported(u8),
}

/// MIDI message types produced by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },
}

/// Coarse kind of a hardware event, the status nibble in domain terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Button or pad pressed
    Press,
    /// Button or pad released
    Release,
    /// Knob turned
    Control,
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes
    pub fn parse(data: &[u8]) -> Result<Self, MidiError> {
        let status = *data.first().ok_or(MidiError::Empty)?;

        if status < 0x80 {
            return Err(MidiError::RunningStatus(status));
        }

        let channel = status & 0x0F;
        let message_type = status & 0xF0;
        if !matches!(message_type, 0x80 | 0x90 | 0xB0) {
            return Err(MidiError::Unsupported(status));
        }
        if data.len() < 3 {
            return Err(MidiError::Truncated {
                status,
                len: data.len(),
            });
        }

        let data1 = data[1] & 0x7F;
        let data2 = data[2] & 0x7F;

        Ok(match message_type {
            0x80 => MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: data2,
            },
            // Note On with velocity 0 is a Note Off
            0x90 if data2 == 0 => MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: 0,
            },
            0x90 => MidiMessage::NoteOn {
                channel,
                note: data1,
                velocity: data2,
            },
            _ => MidiMessage::ControlChange {
                channel,
                cc: data1,
                value: data2,
            },
        })
    }

    /// Kind of event in surface terms
    pub fn kind(&self) -> EventKind {
        match self {
            MidiMessage::NoteOn { .. } => EventKind::Press,
            MidiMessage::NoteOff { .. } => EventKind::Release,
            MidiMessage::ControlChange { .. } => EventKind::Control,
        }
    }

    /// Button/knob identity (note or CC number)
    pub fn identity(&self) -> u8 {
        match *self {
            MidiMessage::NoteOff { note, .. } | MidiMessage::NoteOn { note, .. } => note,
            MidiMessage::ControlChange { cc, .. } => cc,
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
        }
    }
}

/// Decode a 7-bit sign-magnitude relative encoder tick
///
/// 0..63 are positive steps, 64..127 are `value - 128`.
pub fn relative_tick(value: u8) -> i32 {
    let value = (value & 0x7F) as i32;
    if value < 64 {
        value
    } else {
        value - 128
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
