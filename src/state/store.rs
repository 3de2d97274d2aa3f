//! Store - reducer over the mirrored looper model
//!
//! `apply` is pure: it takes the previous state and an action and returns the
//! next state. `Store` keeps the current value for the router.

use super::commands::{DeviceSetting, StoreAction};
use super::types::{AppState, GlobalControl, TrackControl, TrackState};
use tracing::{debug, trace};

/// Apply one action to a state, returning the new state
pub fn apply(mut state: AppState, action: &StoreAction) -> AppState {
    match action {
        StoreAction::TrackUpdate { track, ctrl, value } => {
            let Some(ctrl) = TrackControl::parse(ctrl) else {
                debug!("Ignoring unknown track control '{}' for track {}", ctrl, track);
                return state;
            };
            if *track >= state.tracks.len() {
                state.tracks.resize_with(*track + 1, TrackState::default);
            }
            state.tracks[*track].set(ctrl, *value);
        }
        StoreAction::EmptyTrack(track) => {
            if let Some(t) = state.tracks.get_mut(*track) {
                *t = TrackState::default();
            }
        }
        StoreAction::DeviceSetting(setting) => match setting {
            DeviceSetting::Mode(mode) => state.device.mode = *mode,
            DeviceSetting::Sessions(sessions) => state.device.sessions = sessions.clone(),
            DeviceSetting::Volume(on) => state.device.volume = *on,
            DeviceSetting::Pan(on) => state.device.pan = *on,
            DeviceSetting::VolumeTrack(track) => state.device.volume_track = *track,
        },
        StoreAction::GlobSetting { ctrl, value } => match GlobalControl::parse(ctrl) {
            Some(ctrl) => state.device.set(ctrl, *value),
            None => debug!("Ignoring unknown global control '{}'", ctrl),
        },
        StoreAction::OffsetUp => {
            state.device.loopoffset = (state.device.loopoffset + 1).min(1);
        }
        StoreAction::OffsetDown => {
            let min = state.device.min_offset();
            state.device.loopoffset = (state.device.loopoffset - 1).max(min);
        }
        StoreAction::LoopCount(count) => {
            state.device.loopcount = *count;
            if state.tracks.len() < *count {
                state.tracks.resize_with(*count, TrackState::default);
            }
            let min = state.device.min_offset();
            state.device.loopoffset = state.device.loopoffset.clamp(min, 1);
            if state.device.volume_track.is_some_and(|t| t >= *count) {
                state.device.volume_track = None;
            }
        }
    }
    state
}

/// Holder of the current model
#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: StoreAction) {
        trace!("Store action: {:?}", action);
        let current = std::mem::take(&mut self.state);
        self.state = apply(current, &action);
    }
}
