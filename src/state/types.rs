//! Mirrored looper state type definitions
//!
//! Per-track records are filled from feedback only; every field is optional
//! until the looper reports it, and the accessors supply neutral defaults.

use serde::{Deserialize, Serialize};

/// Loop playback state, SooperLooper numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// Never reported by the looper, the default for a missing field
    #[default]
    Unknown,
    Off,
    WaitStart,
    Recording,
    WaitStop,
    Playing,
    Overdubbing,
    Multiplying,
    Inserting,
    Replacing,
    Delay,
    Muted,
    Scratching,
    OneShot,
    Substitute,
    Paused,
    /// Any code this gateway has no name for
    Other(i32),
}

impl PlaybackState {
    /// Map a numeric state code from the looper
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => PlaybackState::Unknown,
            0 => PlaybackState::Off,
            1 => PlaybackState::WaitStart,
            2 => PlaybackState::Recording,
            3 => PlaybackState::WaitStop,
            4 => PlaybackState::Playing,
            5 => PlaybackState::Overdubbing,
            6 => PlaybackState::Multiplying,
            7 => PlaybackState::Inserting,
            8 => PlaybackState::Replacing,
            9 => PlaybackState::Delay,
            10 => PlaybackState::Muted,
            11 => PlaybackState::Scratching,
            12 => PlaybackState::OneShot,
            13 => PlaybackState::Substitute,
            14 => PlaybackState::Paused,
            other => PlaybackState::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            PlaybackState::Unknown => -1,
            PlaybackState::Off => 0,
            PlaybackState::WaitStart => 1,
            PlaybackState::Recording => 2,
            PlaybackState::WaitStop => 3,
            PlaybackState::Playing => 4,
            PlaybackState::Overdubbing => 5,
            PlaybackState::Multiplying => 6,
            PlaybackState::Inserting => 7,
            PlaybackState::Replacing => 8,
            PlaybackState::Delay => 9,
            PlaybackState::Muted => 10,
            PlaybackState::Scratching => 11,
            PlaybackState::OneShot => 12,
            PlaybackState::Substitute => 13,
            PlaybackState::Paused => 14,
            PlaybackState::Other(code) => *code,
        }
    }
}

/// Per-track controls the gateway mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackControl {
    State,
    NextState,
    LoopPos,
    LoopLen,
    Wet,
    Dry,
    Feedback,
    InputGain,
    Pan1,
    Pan2,
    Pan3,
    Pan4,
    ChannelCount,
    Sync,
    RelativeSync,
    Quantize,
    PlaybackSync,
    MuteQuantized,
    OverdubQuantized,
    ReplaceQuantized,
    Reverse,
}

impl TrackControl {
    /// Controls subscribed with a plain change subscription
    pub const UPDATED: [TrackControl; 16] = [
        TrackControl::Sync,
        TrackControl::RelativeSync,
        TrackControl::Quantize,
        TrackControl::PlaybackSync,
        TrackControl::MuteQuantized,
        TrackControl::OverdubQuantized,
        TrackControl::ReplaceQuantized,
        TrackControl::Reverse,
        TrackControl::Wet,
        TrackControl::Dry,
        TrackControl::Feedback,
        TrackControl::InputGain,
        TrackControl::Pan1,
        TrackControl::Pan2,
        TrackControl::ChannelCount,
        TrackControl::LoopLen,
    ];

    /// Fast-moving controls the looper pushes on an interval
    pub const AUTO_UPDATED: [TrackControl; 3] = [
        TrackControl::State,
        TrackControl::NextState,
        TrackControl::LoopPos,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "state" => TrackControl::State,
            "next_state" => TrackControl::NextState,
            "loop_pos" => TrackControl::LoopPos,
            "loop_len" => TrackControl::LoopLen,
            "wet" => TrackControl::Wet,
            "dry" => TrackControl::Dry,
            "feedback" => TrackControl::Feedback,
            "input_gain" => TrackControl::InputGain,
            "pan_1" => TrackControl::Pan1,
            "pan_2" => TrackControl::Pan2,
            "pan_3" => TrackControl::Pan3,
            "pan_4" => TrackControl::Pan4,
            "channel_count" => TrackControl::ChannelCount,
            "sync" => TrackControl::Sync,
            "relative_sync" => TrackControl::RelativeSync,
            "quantize" => TrackControl::Quantize,
            "playback_sync" => TrackControl::PlaybackSync,
            "mute_quantized" => TrackControl::MuteQuantized,
            "overdub_quantized" => TrackControl::OverdubQuantized,
            "replace_quantized" => TrackControl::ReplaceQuantized,
            "reverse" => TrackControl::Reverse,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackControl::State => "state",
            TrackControl::NextState => "next_state",
            TrackControl::LoopPos => "loop_pos",
            TrackControl::LoopLen => "loop_len",
            TrackControl::Wet => "wet",
            TrackControl::Dry => "dry",
            TrackControl::Feedback => "feedback",
            TrackControl::InputGain => "input_gain",
            TrackControl::Pan1 => "pan_1",
            TrackControl::Pan2 => "pan_2",
            TrackControl::Pan3 => "pan_3",
            TrackControl::Pan4 => "pan_4",
            TrackControl::ChannelCount => "channel_count",
            TrackControl::Sync => "sync",
            TrackControl::RelativeSync => "relative_sync",
            TrackControl::Quantize => "quantize",
            TrackControl::PlaybackSync => "playback_sync",
            TrackControl::MuteQuantized => "mute_quantized",
            TrackControl::OverdubQuantized => "overdub_quantized",
            TrackControl::ReplaceQuantized => "replace_quantized",
            TrackControl::Reverse => "reverse",
        }
    }
}

impl std::fmt::Display for TrackControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global controls mirrored from the looper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalControl {
    SyncSource,
    SelectedLoopNum,
    EighthPerCycle,
    Wet,
}

impl GlobalControl {
    pub const ALL: [GlobalControl; 4] = [
        GlobalControl::SyncSource,
        GlobalControl::SelectedLoopNum,
        GlobalControl::EighthPerCycle,
        GlobalControl::Wet,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sync_source" => Some(GlobalControl::SyncSource),
            "selected_loop_num" => Some(GlobalControl::SelectedLoopNum),
            "eighth_per_cycle" => Some(GlobalControl::EighthPerCycle),
            "wet" => Some(GlobalControl::Wet),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalControl::SyncSource => "sync_source",
            GlobalControl::SelectedLoopNum => "selected_loop_num",
            GlobalControl::EighthPerCycle => "eighth_per_cycle",
            GlobalControl::Wet => "wet",
        }
    }
}

/// Mirror of one looper track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackState {
    pub state: Option<PlaybackState>,
    pub next_state: Option<PlaybackState>,
    /// Seconds
    pub loop_pos: Option<f32>,
    /// Seconds
    pub loop_len: Option<f32>,
    pub wet: Option<f32>,
    pub dry: Option<f32>,
    pub feedback: Option<f32>,
    pub input_gain: Option<f32>,
    pub pan_1: Option<f32>,
    pub pan_2: Option<f32>,
    pub pan_3: Option<f32>,
    pub pan_4: Option<f32>,
    pub channel_count: Option<u32>,
    pub sync: Option<bool>,
    pub relative_sync: Option<bool>,
    pub quantize: Option<u8>,
    pub playback_sync: Option<bool>,
    pub mute_quantized: Option<bool>,
    pub overdub_quantized: Option<bool>,
    pub replace_quantized: Option<bool>,
    pub reverse: Option<bool>,
}

impl TrackState {
    pub fn state(&self) -> PlaybackState {
        self.state.unwrap_or_default()
    }

    pub fn next_state(&self) -> PlaybackState {
        self.next_state.unwrap_or_default()
    }

    pub fn loop_pos(&self) -> f32 {
        self.loop_pos.unwrap_or(0.0)
    }

    pub fn loop_len(&self) -> f32 {
        self.loop_len.unwrap_or(0.0)
    }

    pub fn wet(&self) -> f32 {
        self.wet.unwrap_or(0.0)
    }

    pub fn pan(&self, channel: usize) -> f32 {
        let value = match channel {
            1 => self.pan_1,
            2 => self.pan_2,
            3 => self.pan_3,
            4 => self.pan_4,
            _ => None,
        };
        value.unwrap_or(0.0)
    }

    pub fn channel_count(&self) -> u32 {
        self.channel_count.unwrap_or(1)
    }

    pub fn is_stereo(&self) -> bool {
        self.channel_count() >= 2
    }

    pub fn quantize(&self) -> u8 {
        self.quantize.unwrap_or(0)
    }

    /// Current value of any mirrored control as the looper would report it
    pub fn value(&self, ctrl: TrackControl) -> f32 {
        fn flag(v: Option<bool>) -> f32 {
            if v.unwrap_or(false) {
                1.0
            } else {
                0.0
            }
        }
        match ctrl {
            TrackControl::State => self.state().code() as f32,
            TrackControl::NextState => self.next_state().code() as f32,
            TrackControl::LoopPos => self.loop_pos(),
            TrackControl::LoopLen => self.loop_len(),
            TrackControl::Wet => self.wet(),
            TrackControl::Dry => self.dry.unwrap_or(0.0),
            TrackControl::Feedback => self.feedback.unwrap_or(0.0),
            TrackControl::InputGain => self.input_gain.unwrap_or(0.0),
            TrackControl::Pan1 => self.pan(1),
            TrackControl::Pan2 => self.pan(2),
            TrackControl::Pan3 => self.pan(3),
            TrackControl::Pan4 => self.pan(4),
            TrackControl::ChannelCount => self.channel_count() as f32,
            TrackControl::Sync => flag(self.sync),
            TrackControl::RelativeSync => flag(self.relative_sync),
            TrackControl::Quantize => self.quantize() as f32,
            TrackControl::PlaybackSync => flag(self.playback_sync),
            TrackControl::MuteQuantized => flag(self.mute_quantized),
            TrackControl::OverdubQuantized => flag(self.overdub_quantized),
            TrackControl::ReplaceQuantized => flag(self.replace_quantized),
            TrackControl::Reverse => flag(self.reverse),
        }
    }

    /// Write one control from a reported float value
    pub fn set(&mut self, ctrl: TrackControl, value: f32) {
        let flag = value != 0.0;
        match ctrl {
            TrackControl::State => self.state = Some(PlaybackState::from_code(value as i32)),
            TrackControl::NextState => {
                self.next_state = Some(PlaybackState::from_code(value as i32))
            }
            TrackControl::LoopPos => self.loop_pos = Some(value),
            TrackControl::LoopLen => self.loop_len = Some(value),
            TrackControl::Wet => self.wet = Some(value),
            TrackControl::Dry => self.dry = Some(value),
            TrackControl::Feedback => self.feedback = Some(value),
            TrackControl::InputGain => self.input_gain = Some(value),
            TrackControl::Pan1 => self.pan_1 = Some(value),
            TrackControl::Pan2 => self.pan_2 = Some(value),
            TrackControl::Pan3 => self.pan_3 = Some(value),
            TrackControl::Pan4 => self.pan_4 = Some(value),
            TrackControl::ChannelCount => self.channel_count = Some(value.max(0.0) as u32),
            TrackControl::Sync => self.sync = Some(flag),
            TrackControl::RelativeSync => self.relative_sync = Some(flag),
            TrackControl::Quantize => self.quantize = Some(value.clamp(0.0, 3.0) as u8),
            TrackControl::PlaybackSync => self.playback_sync = Some(flag),
            TrackControl::MuteQuantized => self.mute_quantized = Some(flag),
            TrackControl::OverdubQuantized => self.overdub_quantized = Some(flag),
            TrackControl::ReplaceQuantized => self.replace_quantized = Some(flag),
            TrackControl::Reverse => self.reverse = Some(flag),
        }
    }
}

/// Which page the pad grid is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    #[default]
    Loops,
    SessionLoad,
    SessionSave,
}

impl DeviceMode {
    /// Rotation order of the device button
    pub const ROTATION: [DeviceMode; 3] = [
        DeviceMode::Loops,
        DeviceMode::SessionLoad,
        DeviceMode::SessionSave,
    ];

    pub fn index(&self) -> i32 {
        match self {
            DeviceMode::Loops => 0,
            DeviceMode::SessionLoad => 1,
            DeviceMode::SessionSave => 2,
        }
    }

    pub fn from_index(index: i32) -> Self {
        Self::ROTATION
            .get(index.max(0) as usize)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_session(&self) -> bool {
        !matches!(self, DeviceMode::Loops)
    }
}

/// Global looper settings plus the surface's own UI state
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalState {
    // Mirrored from the looper
    pub sync_source: Option<i32>,
    pub selected_loop_num: Option<i32>,
    pub eighth_per_cycle: Option<f32>,
    pub wet: Option<f32>,
    pub loopcount: usize,

    // Local only
    /// Row offset: the track on row r is `r - loopoffset`
    pub loopoffset: i32,
    pub mode: DeviceMode,
    pub sessions: Vec<String>,
    /// Level display + volume knob bank
    pub volume: bool,
    /// Pan display + pan knob bank
    pub pan: bool,
    pub volume_track: Option<usize>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            sync_source: None,
            selected_loop_num: None,
            eighth_per_cycle: None,
            wet: None,
            loopcount: 0,
            loopoffset: 1,
            mode: DeviceMode::Loops,
            sessions: Vec::new(),
            volume: false,
            pan: false,
            volume_track: None,
        }
    }
}

impl GlobalState {
    pub fn sync_source(&self) -> i32 {
        self.sync_source.unwrap_or(0)
    }

    pub fn eighth_per_cycle(&self) -> f32 {
        self.eighth_per_cycle.unwrap_or(0.0)
    }

    pub fn wet(&self) -> f32 {
        self.wet.unwrap_or(0.0)
    }

    /// Lowest allowed `loopoffset` for the current loop count
    pub fn min_offset(&self) -> i32 {
        1 - (self.loopcount.max(1) as i32)
    }

    pub fn set(&mut self, ctrl: GlobalControl, value: f32) {
        match ctrl {
            GlobalControl::SyncSource => self.sync_source = Some(value.round() as i32),
            GlobalControl::SelectedLoopNum => self.selected_loop_num = Some(value.round() as i32),
            GlobalControl::EighthPerCycle => self.eighth_per_cycle = Some(value),
            GlobalControl::Wet => self.wet = Some(value),
        }
    }
}

/// Whole mirrored model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub tracks: Vec<TrackState>,
    pub device: GlobalState,
}

impl AppState {
    /// Track index shown on a grid row, `-1` for the global row
    pub fn track_on_row(&self, row: u8) -> i32 {
        row as i32 - self.device.loopoffset
    }

    /// Mirrored track shown on a grid row, if the looper currently has it
    pub fn row_track(&self, row: u8) -> Option<(usize, &TrackState)> {
        let index = self.track_on_row(row);
        if index < 0 || index as usize >= self.device.loopcount {
            return None;
        }
        let index = index as usize;
        self.tracks.get(index).map(|t| (index, t))
    }

    /// Grid row showing the global controls, if visible
    pub fn global_row(&self) -> Option<u8> {
        let row = self.device.loopoffset - 1;
        (0..5).contains(&row).then_some(row as u8)
    }

    pub fn any_recording(&self) -> bool {
        self.tracks
            .iter()
            .any(|t| t.state() == PlaybackState::Recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_state_codes() {
        assert_eq!(PlaybackState::from_code(4), PlaybackState::Playing);
        assert_eq!(PlaybackState::from_code(14).code(), 14);
        assert_eq!(PlaybackState::from_code(42), PlaybackState::Other(42));
        assert_eq!(PlaybackState::default().code(), -1);
    }

    #[test]
    fn test_track_defaults() {
        let track = TrackState::default();

        assert_eq!(track.state(), PlaybackState::Unknown);
        assert_eq!(track.wet(), 0.0);
        assert_eq!(track.channel_count(), 1);
        assert_eq!(track.quantize(), 0);
        assert_eq!(track.value(TrackControl::Sync), 0.0);
    }

    #[test]
    fn test_flags_from_float() {
        let mut track = TrackState::default();
        track.set(TrackControl::Reverse, 1.0);
        track.set(TrackControl::Sync, 0.0);

        assert_eq!(track.reverse, Some(true));
        assert_eq!(track.sync, Some(false));
    }

    #[test]
    fn test_control_names_round_trip() {
        for ctrl in TrackControl::UPDATED.iter().chain(TrackControl::AUTO_UPDATED.iter()) {
            assert_eq!(TrackControl::parse(ctrl.as_str()), Some(*ctrl));
        }
        assert_eq!(TrackControl::parse("rate"), None);
    }

    #[test]
    fn test_rows_follow_offset() {
        let mut state = AppState::default();
        state.tracks = vec![TrackState::default(); 3];
        state.device.loopcount = 3;

        assert_eq!(state.track_on_row(0), -1);
        assert_eq!(state.global_row(), Some(0));
        assert_eq!(state.row_track(1).map(|(i, _)| i), Some(0));

        state.device.loopoffset = -1;
        assert_eq!(state.global_row(), None);
        assert_eq!(state.row_track(0).map(|(i, _)| i), Some(1));
        assert!(state.row_track(3).is_none());
    }
}
