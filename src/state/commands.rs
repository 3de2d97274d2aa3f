//! Actions accepted by the model reducer

use super::types::DeviceMode;

/// Writes to the surface's own UI state
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceSetting {
    Mode(DeviceMode),
    Sessions(Vec<String>),
    Volume(bool),
    Pan(bool),
    VolumeTrack(Option<usize>),
}

/// One mutation of the mirrored model
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    /// Feedback for one track control; grows the mirror when `track` is past its end
    TrackUpdate {
        track: usize,
        ctrl: String,
        value: f32,
    },
    /// Reset a track to an empty record
    EmptyTrack(usize),
    DeviceSetting(DeviceSetting),
    /// Feedback for a global control
    GlobSetting { ctrl: String, value: f32 },
    OffsetUp,
    OffsetDown,
    /// Loop count reported by the looper
    LoopCount(usize),
}
