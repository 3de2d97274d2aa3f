//! APC Key 25 mk2 layout, LED modes and palette
//!
//! Pads are notes 0..39 with the bottom row at 0..7. Rows here count from the
//! top: row 0 is pads 32..39, row 4 is pads 0..7.

pub const ROWS: u8 = 5;
pub const COLS: u8 = 8;
pub const PAD_COUNT: u8 = ROWS * COLS;

/// First and last knob CC
pub const KNOB_FIRST: u8 = 48;
pub const KNOB_LAST: u8 = 55;

/// Pad note for a (row, col), row 0 on top
pub fn pad_at(row: u8, col: u8) -> u8 {
    (ROWS - 1 - row) * COLS + col
}

/// Grid row (0 on top) of a pad note
pub fn row_of(pad: u8) -> u8 {
    ROWS - 1 - pad / COLS
}

pub fn col_of(pad: u8) -> u8 {
    pad % COLS
}

pub fn is_pad(note: u8) -> bool {
    note < PAD_COUNT
}

/// Knob index 0..7 for a CC number
pub fn knob_index(cc: u8) -> Option<u8> {
    (KNOB_FIRST..=KNOB_LAST).contains(&cc).then(|| cc - KNOB_FIRST)
}

/// Non-pad buttons, by note number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Volume,
    Pan,
    Send,
    Device,
    StopAllClips,
    ClipStop,
    Solo,
    Mute,
    RecArm,
    Select,
    Play,
    Record,
    Shift,
}

impl Button {
    pub fn from_note(note: u8) -> Option<Self> {
        Some(match note {
            64 => Button::Up,
            65 => Button::Down,
            66 => Button::Left,
            67 => Button::Right,
            68 => Button::Volume,
            69 => Button::Pan,
            70 => Button::Send,
            71 => Button::Device,
            81 => Button::StopAllClips,
            82 => Button::ClipStop,
            83 => Button::Solo,
            84 => Button::Mute,
            85 => Button::RecArm,
            86 => Button::Select,
            91 => Button::Play,
            93 => Button::Record,
            98 => Button::Shift,
            _ => return None,
        })
    }

    pub fn note(&self) -> u8 {
        match self {
            Button::Up => 64,
            Button::Down => 65,
            Button::Left => 66,
            Button::Right => 67,
            Button::Volume => 68,
            Button::Pan => 69,
            Button::Send => 70,
            Button::Device => 71,
            Button::StopAllClips => 81,
            Button::ClipStop => 82,
            Button::Solo => 83,
            Button::Mute => 84,
            Button::RecArm => 85,
            Button::Select => 86,
            Button::Play => 91,
            Button::Record => 93,
            Button::Shift => 98,
        }
    }
}

/// LED mode: the note-on status byte, channel selects brightness or animation
pub mod led {
    pub const BRIGHT_10: u8 = 0x90;
    pub const BRIGHT_25: u8 = 0x91;
    pub const BRIGHT_50: u8 = 0x92;
    pub const BRIGHT_65: u8 = 0x93;
    pub const BRIGHT_75: u8 = 0x94;
    pub const BRIGHT_90: u8 = 0x95;
    pub const BRIGHT_100: u8 = 0x96;
    pub const PULSE_16: u8 = 0x97;
    pub const PULSE_8: u8 = 0x98;
    pub const PULSE_4: u8 = 0x99;
    pub const PULSE_2: u8 = 0x9A;
    pub const BLINK_24: u8 = 0x9B;
    pub const BLINK_16: u8 = 0x9C;
    pub const BLINK_8: u8 = 0x9D;
    pub const BLINK_4: u8 = 0x9E;
    pub const BLINK_2: u8 = 0x9F;

    /// Solid brightness steps, dimmest first
    pub const SOLID: [u8; 7] = [
        BRIGHT_10, BRIGHT_25, BRIGHT_50, BRIGHT_65, BRIGHT_75, BRIGHT_90, BRIGHT_100,
    ];

    /// Solid brightness for a fill fraction in [0, 1]
    pub fn solid_for(fraction: f32) -> u8 {
        if !fraction.is_finite() {
            return BRIGHT_10;
        }
        let step = (fraction.clamp(0.0, 1.0) * (SOLID.len() - 1) as f32).round() as usize;
        SOLID[step.min(SOLID.len() - 1)]
    }
}

/// Velocity palette indices
pub mod color {
    pub const OFF: u8 = 0;
    pub const DARK_GREY: u8 = 1;
    pub const GREY: u8 = 2;
    pub const WHITE: u8 = 3;
    pub const RED: u8 = 5;
    pub const ORANGE: u8 = 9;
    pub const YELLOW: u8 = 13;
    pub const LIME: u8 = 17;
    pub const GREEN: u8 = 21;
    pub const SPRING: u8 = 29;
    pub const CYAN: u8 = 37;
    pub const SKY: u8 = 41;
    pub const BLUE: u8 = 45;
    pub const PURPLE: u8 = 49;
    pub const MAGENTA: u8 = 53;
    pub const PINK: u8 = 57;
    pub const AMBER: u8 = 84;
    pub const TEAL: u8 = 52;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_geometry() {
        assert_eq!(pad_at(0, 0), 32);
        assert_eq!(pad_at(4, 7), 7);
        assert_eq!(row_of(33), 0);
        assert_eq!(row_of(7), 4);
        assert_eq!(col_of(33), 1);

        for pad in 0..PAD_COUNT {
            assert_eq!(pad_at(row_of(pad), col_of(pad)), pad);
        }
    }

    #[test]
    fn test_buttons_and_knobs() {
        assert_eq!(Button::from_note(85), Some(Button::RecArm));
        assert_eq!(Button::from_note(Button::Shift.note()), Some(Button::Shift));
        assert_eq!(Button::from_note(72), None);
        assert_eq!(knob_index(48), Some(0));
        assert_eq!(knob_index(55), Some(7));
        assert_eq!(knob_index(56), None);
    }

    #[test]
    fn test_solid_brightness() {
        assert_eq!(led::solid_for(0.0), led::BRIGHT_10);
        assert_eq!(led::solid_for(1.0), led::BRIGHT_100);
        assert_eq!(led::solid_for(0.5), led::BRIGHT_65);
        assert_eq!(led::solid_for(f32::NAN), led::BRIGHT_10);
    }
}
