//! Projection of the mirrored model onto the pad grid
//!
//! `create_frame` picks one base mode, paints all 40 pads, then applies the
//! digit and eighths overlays on top. Later writes to a pad win.

pub mod frame;
pub mod glyphs;

pub use frame::{encode_batch, Frame, FrameDiffer, LedCell};

use crate::apc::layout::{color, led, pad_at, COLS, ROWS};
use crate::router::{InteractionFlags, Overlay};
use crate::state::{AppState, DeviceMode, PlaybackState, TrackState};

/// Base rendering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Sessions { save: bool },
    SyncSettings,
    Pan,
    Volume,
    Loops,
}

impl RenderMode {
    pub fn select(state: &AppState, flags: &InteractionFlags) -> Self {
        match Overlay::resolve(&state.device, flags) {
            Overlay::SessionLoad => RenderMode::Sessions { save: false },
            Overlay::SessionSave => RenderMode::Sessions { save: true },
            Overlay::SyncSettings => RenderMode::SyncSettings,
            // held modifiers keep showing the active bank
            _ if state.device.volume => RenderMode::Volume,
            _ if state.device.pan => RenderMode::Pan,
            _ => RenderMode::Loops,
        }
    }
}

/// Session file name for a grid ordinal
pub fn session_file_name(ordinal: u8) -> String {
    format!("session-{:02}.slsess", ordinal)
}

const DARK: (u8, u8) = (led::BRIGHT_10, color::OFF);

/// Sync settings columns, left to right
const SYNC_COLORS: [u8; 8] = [
    color::GREEN,
    color::LIME,
    color::WHITE, // quantize uses QUANTIZE_COLORS
    color::CYAN,
    color::RED,
    color::MAGENTA,
    color::ORANGE,
    color::BLUE,
];
const QUANTIZE_COLORS: [u8; 4] = [color::GREY, color::YELLOW, color::ORANGE, color::RED];
/// Indexed by `sync_source + 3`
const SYNC_SOURCE_COLORS: [u8; 8] = [
    color::PURPLE,
    color::BLUE,
    color::SKY,
    color::GREY,
    color::GREEN,
    color::LIME,
    color::YELLOW,
    color::ORANGE,
];

const PAN_1_COLOR: u8 = color::CYAN;
const PAN_2_COLOR: u8 = color::MAGENTA;
const PAN_BOTH_COLOR: u8 = color::WHITE;

const LEVEL_COLOR: u8 = color::GREEN;
const LEVEL_SELECTED_COLOR: u8 = color::YELLOW;
const LEVEL_GLOBAL_COLOR: u8 = color::BLUE;

const DIGIT_COLOR: u8 = color::WHITE;
const EIGHTHS_COLOR: u8 = color::YELLOW;
const BARS_COLOR: u8 = color::ORANGE;

/// LED mode and color for a playback state
pub fn state_look(state: PlaybackState) -> (u8, u8) {
    match state {
        PlaybackState::Unknown => DARK,
        PlaybackState::Off => (led::BRIGHT_10, color::TEAL),
        PlaybackState::WaitStart => (led::BLINK_8, color::RED),
        PlaybackState::Recording => (led::PULSE_2, color::RED),
        PlaybackState::WaitStop => (led::BLINK_8, color::ORANGE),
        PlaybackState::Playing => (led::BRIGHT_100, color::GREEN),
        PlaybackState::Overdubbing => (led::BLINK_2, color::MAGENTA),
        PlaybackState::Multiplying => (led::PULSE_4, color::ORANGE),
        PlaybackState::Inserting => (led::PULSE_4, color::YELLOW),
        PlaybackState::Replacing => (led::PULSE_4, color::PINK),
        PlaybackState::Delay => (led::BRIGHT_50, color::SKY),
        PlaybackState::Muted => (led::BRIGHT_25, color::GREY),
        PlaybackState::Scratching => (led::PULSE_8, color::CYAN),
        PlaybackState::OneShot => (led::PULSE_8, color::LIME),
        PlaybackState::Substitute => (led::PULSE_4, color::AMBER),
        PlaybackState::Paused => (led::BLINK_16, color::WHITE),
        PlaybackState::Other(_) => (led::BRIGHT_25, color::DARK_GREY),
    }
}

/// Grid of exactly one cell per pad
struct Canvas {
    cells: Vec<LedCell>,
}

impl Canvas {
    fn new() -> Self {
        let mut cells = Vec::with_capacity((ROWS * COLS) as usize);
        for row in 0..ROWS {
            for col in 0..COLS {
                cells.push(LedCell::new(DARK.0, pad_at(row, col), DARK.1));
            }
        }
        Self { cells }
    }

    fn put(&mut self, row: u8, col: u8, (mode, color): (u8, u8)) {
        if row < ROWS && col < COLS {
            let cell = &mut self.cells[(row * COLS + col) as usize];
            cell.mode = mode;
            cell.color = color;
        }
    }

    fn fill_row(&mut self, row: u8, look: (u8, u8)) {
        for col in 0..COLS {
            self.put(row, col, look);
        }
    }
}

/// Build the full LED frame for the current model and modifiers
pub fn create_frame(state: &AppState, flags: &InteractionFlags) -> Frame {
    let mut canvas = Canvas::new();

    match RenderMode::select(state, flags) {
        RenderMode::Sessions { save } => paint_sessions(&mut canvas, state, save),
        RenderMode::SyncSettings => paint_sync_settings(&mut canvas, state),
        RenderMode::Pan => paint_pan(&mut canvas, state),
        RenderMode::Volume => paint_volume(&mut canvas, state),
        RenderMode::Loops => paint_loops(&mut canvas, state),
    }

    if state.device.mode == DeviceMode::Loops {
        if flags.shifted {
            paint_track_number(&mut canvas, state);
        }
        if flags.show_8ths {
            paint_eighths(&mut canvas, state);
        }
    }

    canvas.cells
}

fn paint_sessions(canvas: &mut Canvas, state: &AppState, save: bool) {
    let theme = if save { color::ORANGE } else { color::GREEN };
    for row in 0..ROWS {
        for col in 0..COLS {
            let name = session_file_name(row * COLS + col);
            let known = state
                .device
                .sessions
                .iter()
                .any(|s| s == &name || s.ends_with(&format!("/{}", name)));
            let mode = if known { led::BRIGHT_100 } else { led::BRIGHT_25 };
            canvas.put(row, col, (mode, theme));
        }
    }
}

fn flag_look(on: bool, color: u8) -> (u8, u8) {
    if on {
        (led::BRIGHT_100, color)
    } else {
        (led::BRIGHT_10, color)
    }
}

fn paint_sync_settings(canvas: &mut Canvas, state: &AppState) {
    for row in 0..ROWS {
        if state.global_row() == Some(row) {
            let index = (state.device.sync_source() + 3).clamp(0, SYNC_SOURCE_COLORS.len() as i32 - 1);
            canvas.put(row, 0, (led::BRIGHT_100, SYNC_SOURCE_COLORS[index as usize]));
            continue;
        }
        let Some((_, track)) = state.row_track(row) else {
            continue;
        };
        let flags = [
            track.sync,
            track.relative_sync,
            None,
            track.playback_sync,
            track.mute_quantized,
            track.overdub_quantized,
            track.replace_quantized,
            track.reverse,
        ];
        for (col, flag) in flags.iter().enumerate() {
            let col = col as u8;
            if col == 2 {
                let q = track.quantize().min(3);
                canvas.put(row, col, flag_look(q > 0, QUANTIZE_COLORS[q as usize]));
            } else {
                canvas.put(row, col, flag_look(flag.unwrap_or(false), SYNC_COLORS[col as usize]));
            }
        }
    }
}

/// Pads lit for a pan value: primary, plus the next one on odd positions
fn pan_pads(pan: f32) -> (u8, Option<u8>) {
    let pos = if pan.is_finite() {
        (14.0 * pan.clamp(0.0, 1.0)).round() as u8
    } else {
        7
    };
    let primary = pos / 2;
    let secondary = (pos % 2 == 1).then_some(primary + 1);
    (primary, secondary)
}

fn paint_pan(canvas: &mut Canvas, state: &AppState) {
    for row in 0..ROWS {
        let Some((_, track)) = state.row_track(row) else {
            continue;
        };
        let mut lit = [None::<u8>; COLS as usize];
        let mut mark = |pan: f32, color: u8| {
            let (a, b) = pan_pads(pan);
            for pad in std::iter::once(a).chain(b) {
                let slot = &mut lit[pad.min(COLS - 1) as usize];
                *slot = match *slot {
                    Some(existing) if existing != color => Some(PAN_BOTH_COLOR),
                    _ => Some(color),
                };
            }
        };
        mark(track.pan(1), PAN_1_COLOR);
        if track.is_stereo() {
            mark(track.pan(2), PAN_2_COLOR);
        }
        for (col, slot) in lit.iter().enumerate() {
            if let Some(color) = slot {
                canvas.put(row, col as u8, (led::BRIGHT_100, *color));
            }
        }
    }
}

fn paint_level(canvas: &mut Canvas, row: u8, level: f32, color: u8) {
    let level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
    let pos = level * COLS as f32;
    let full = pos.floor() as u8;
    for col in 0..COLS {
        let mode = if col < full {
            led::BRIGHT_100
        } else if col == full {
            led::solid_for(pos - pos.floor())
        } else {
            led::BRIGHT_10
        };
        canvas.put(row, col, (mode, color));
    }
}

fn paint_volume(canvas: &mut Canvas, state: &AppState) {
    for row in 0..ROWS {
        if state.global_row() == Some(row) {
            paint_level(canvas, row, state.device.wet(), LEVEL_GLOBAL_COLOR);
            continue;
        }
        let Some((index, track)) = state.row_track(row) else {
            continue;
        };
        let color = if state.device.volume_track == Some(index) {
            LEVEL_SELECTED_COLOR
        } else {
            LEVEL_COLOR
        };
        paint_level(canvas, row, track.wet(), color);
    }
}

fn paint_track_row(canvas: &mut Canvas, row: u8, track: &TrackState) {
    let state = track.state();
    let (mode, color) = state_look(state);

    if state != PlaybackState::Playing {
        canvas.fill_row(row, (mode, color));
        return;
    }

    let len = track.loop_len();
    if !len.is_finite() || len <= 0.0 {
        canvas.fill_row(row, (led::BRIGHT_10, color));
        return;
    }

    let lit = ((COLS as f32 * track.loop_pos() / len).floor().max(0.0) as u8).min(COLS);
    for col in 0..COLS {
        let mode = if col < lit { led::BRIGHT_100 } else { led::BRIGHT_10 };
        canvas.put(row, col, (mode, color));
    }
}

fn paint_loops(canvas: &mut Canvas, state: &AppState) {
    for row in 0..ROWS {
        if state.global_row() == Some(row) {
            let look = if state.any_recording() {
                (led::PULSE_2, color::RED)
            } else {
                (led::BRIGHT_10, color::DARK_GREY)
            };
            canvas.put(row, 0, look);
            continue;
        }
        if let Some((_, track)) = state.row_track(row) {
            paint_track_row(canvas, row, track);
        }
    }
}

fn paint_track_number(canvas: &mut Canvas, state: &AppState) {
    let first = (-state.device.loopoffset).max(0) as usize + 1;
    for (slot, digit) in glyphs::digits(first).into_iter().enumerate() {
        let left = slot as u8 * (glyphs::GLYPH_WIDTH + 1);
        for row in 0..glyphs::GLYPH_HEIGHT {
            for dx in 0..glyphs::GLYPH_WIDTH {
                let look = if glyphs::dot(digit, row, dx) {
                    (led::BRIGHT_100, DIGIT_COLOR)
                } else {
                    DARK
                };
                canvas.put(row, left + dx, look);
            }
        }
    }
}

fn paint_eighths(canvas: &mut Canvas, state: &AppState) {
    let n = state.device.eighth_per_cycle().max(0.0) as usize;
    let (count, color) = if n <= COLS as usize {
        (n, EIGHTHS_COLOR)
    } else {
        ((n / 8).min(COLS as usize), BARS_COLOR)
    };
    for col in 0..COLS {
        let look = if (col as usize) < count {
            (led::BRIGHT_100, color)
        } else {
            DARK
        };
        canvas.put(0, col, look);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{apply, StoreAction};
    use std::collections::HashSet;

    fn model(count: usize) -> AppState {
        apply(AppState::default(), &StoreAction::LoopCount(count))
    }

    fn set(state: AppState, track: usize, ctrl: &str, value: f32) -> AppState {
        apply(
            state,
            &StoreAction::TrackUpdate {
                track,
                ctrl: ctrl.into(),
                value,
            },
        )
    }

    fn cell(frame: &Frame, row: u8, col: u8) -> LedCell {
        let pad = pad_at(row, col);
        *frame.iter().find(|c| c.pad == pad).unwrap()
    }

    #[test]
    fn test_every_pad_once() {
        let frame = create_frame(&model(2), &InteractionFlags::default());
        let pads: HashSet<u8> = frame.iter().map(|c| c.pad).collect();

        assert_eq!(frame.len(), 40);
        assert_eq!(pads.len(), 40);
    }

    #[test]
    fn test_playing_track_draws_position_bar() {
        let mut state = model(1);
        state = set(state, 0, "state", 4.0);
        state = set(state, 0, "loop_len", 8.0);
        state = set(state, 0, "loop_pos", 3.5);
        let frame = create_frame(&state, &InteractionFlags::default());

        // track 0 sits on row 1 with the default offset
        for col in 0..3 {
            assert_eq!(cell(&frame, 1, col).mode, led::BRIGHT_100);
        }
        for col in 3..8 {
            assert_eq!(cell(&frame, 1, col).mode, led::BRIGHT_10);
        }
        assert_eq!(cell(&frame, 1, 0).color, color::GREEN);
    }

    #[test]
    fn test_zero_length_falls_back_per_row() {
        let mut state = model(2);
        state = set(state, 0, "state", 4.0);
        state = set(state, 0, "loop_len", 0.0);
        state = set(state, 1, "state", 2.0);
        let frame = create_frame(&state, &InteractionFlags::default());

        assert!((0..8).all(|col| cell(&frame, 1, col).mode == led::BRIGHT_10));
        assert_eq!(cell(&frame, 2, 0), LedCell::new(led::PULSE_2, pad_at(2, 0), color::RED));
    }

    #[test]
    fn test_global_row_shows_recording() {
        let mut state = model(2);
        let idle = create_frame(&state, &InteractionFlags::default());
        assert_eq!(cell(&idle, 0, 0).color, color::DARK_GREY);

        state = set(state, 1, "state", 2.0);
        let frame = create_frame(&state, &InteractionFlags::default());
        assert_eq!(cell(&frame, 0, 0), LedCell::new(led::PULSE_2, pad_at(0, 0), color::RED));
        assert_eq!(cell(&frame, 0, 1).color, color::OFF);
    }

    #[test]
    fn test_session_grid() {
        let mut state = model(1);
        state.device.mode = DeviceMode::SessionLoad;
        state.device.sessions = vec![session_file_name(9)];
        let frame = create_frame(&state, &InteractionFlags::default());

        assert_eq!(cell(&frame, 1, 1), LedCell::new(led::BRIGHT_100, pad_at(1, 1), color::GREEN));
        assert_eq!(cell(&frame, 0, 0), LedCell::new(led::BRIGHT_25, pad_at(0, 0), color::GREEN));

        state.device.mode = DeviceMode::SessionSave;
        let frame = create_frame(&state, &InteractionFlags::default());
        assert_eq!(cell(&frame, 1, 1).color, color::ORANGE);
    }

    #[test]
    fn test_sync_settings_columns() {
        let mut state = model(1);
        state = set(state, 0, "sync", 1.0);
        state = set(state, 0, "quantize", 2.0);
        state = apply(
            state,
            &StoreAction::GlobSetting {
                ctrl: "sync_source".into(),
                value: -3.0,
            },
        );
        let flags = InteractionFlags {
            set_syncs: true,
            ..Default::default()
        };
        let frame = create_frame(&state, &flags);

        assert_eq!(cell(&frame, 1, 0).mode, led::BRIGHT_100);
        assert_eq!(cell(&frame, 1, 1).mode, led::BRIGHT_10);
        assert_eq!(cell(&frame, 1, 2).color, QUANTIZE_COLORS[2]);
        assert_eq!(cell(&frame, 0, 0).color, SYNC_SOURCE_COLORS[0]);
    }

    #[test]
    fn test_pan_positions() {
        assert_eq!(pan_pads(0.0), (0, None));
        assert_eq!(pan_pads(0.5), (3, Some(4)));
        assert_eq!(pan_pads(1.0), (7, None));

        let mut state = model(1);
        state.device.pan = true;
        state = set(state, 0, "channel_count", 2.0);
        state = set(state, 0, "pan_1", 0.0);
        state = set(state, 0, "pan_2", 0.0);
        let frame = create_frame(&state, &InteractionFlags::default());
        assert_eq!(cell(&frame, 1, 0).color, PAN_BOTH_COLOR);

        state = set(state, 0, "pan_2", 1.0);
        let frame = create_frame(&state, &InteractionFlags::default());
        assert_eq!(cell(&frame, 1, 0).color, PAN_1_COLOR);
        assert_eq!(cell(&frame, 1, 7).color, PAN_2_COLOR);
        assert_eq!(cell(&frame, 1, 4).color, color::OFF);
    }

    #[test]
    fn test_volume_levels() {
        let mut state = model(2);
        state.device.volume = true;
        state.device.volume_track = Some(1);
        state = set(state, 0, "wet", 0.5);
        let frame = create_frame(&state, &InteractionFlags::default());

        assert!((0..4).all(|col| cell(&frame, 1, col).mode == led::BRIGHT_100));
        assert_eq!(cell(&frame, 1, 4).mode, led::BRIGHT_10);
        assert_eq!(cell(&frame, 1, 5).mode, led::BRIGHT_10);
        assert_eq!(cell(&frame, 2, 0).color, LEVEL_SELECTED_COLOR);
        assert_eq!(cell(&frame, 0, 0).color, LEVEL_GLOBAL_COLOR);
    }

    #[test]
    fn test_shift_draws_first_track_number() {
        let mut state = model(12);
        state.device.loopoffset = -9;
        let flags = InteractionFlags {
            shifted: true,
            ..Default::default()
        };
        let frame = create_frame(&state, &flags);

        // "10": the "1" box at columns 0..2, the "0" box at 4..6
        assert_eq!(cell(&frame, 0, 1).color, DIGIT_COLOR);
        assert_eq!(cell(&frame, 0, 0).color, color::OFF);
        assert_eq!(cell(&frame, 2, 5).color, color::OFF);
        assert_eq!(cell(&frame, 2, 4).color, DIGIT_COLOR);
    }

    #[test]
    fn test_eighths_overlay() {
        let mut state = model(1);
        state = apply(
            state,
            &StoreAction::GlobSetting {
                ctrl: "eighth_per_cycle".into(),
                value: 6.0,
            },
        );
        let flags = InteractionFlags {
            show_8ths: true,
            ..Default::default()
        };
        let frame = create_frame(&state, &flags);
        assert_eq!(cell(&frame, 0, 5).color, EIGHTHS_COLOR);
        assert_eq!(cell(&frame, 0, 6).color, color::OFF);

        state.device.eighth_per_cycle = Some(32.0);
        let frame = create_frame(&state, &flags);
        assert_eq!(cell(&frame, 0, 3).color, BARS_COLOR);
        assert_eq!(cell(&frame, 0, 4).color, color::OFF);
    }
}
