//! State management module - mirror of the looper's loops and globals
//!
//! Tracks are only written from looper feedback; local input changes the
//! surface's own UI fields and otherwise goes out as remote commands.

mod commands;
mod store;
mod types;

pub use commands::{DeviceSetting, StoreAction};
pub use store::{apply, Store};
pub use types::{
    AppState, DeviceMode, GlobalControl, GlobalState, PlaybackState, TrackControl, TrackState,
};
