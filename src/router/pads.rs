//! Pad handling per overlay

use super::{Overlay, TimerKind};
use crate::apc::layout::{col_of, row_of, COLS};
use crate::input::cycle;
use crate::looper::{RemoteCommand, Target};
use crate::render::session_file_name;
use crate::state::{DeviceMode, DeviceSetting, PlaybackState, StoreAction, TrackControl};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Sync settings columns, left to right
const SETTING_COLUMNS: [TrackControl; 8] = [
    TrackControl::Sync,
    TrackControl::RelativeSync,
    TrackControl::Quantize,
    TrackControl::PlaybackSync,
    TrackControl::MuteQuantized,
    TrackControl::OverdubQuantized,
    TrackControl::ReplaceQuantized,
    TrackControl::Reverse,
];

impl super::Router {
    pub(crate) fn on_pad(&mut self, pad: u8, pressed: bool, now: Instant) {
        if !pressed {
            return;
        }
        let row = row_of(pad);
        let col = col_of(pad);
        let track = self.state().track_on_row(row);

        match Overlay::resolve(&self.state().device, &self.flags) {
            Overlay::SessionLoad => self.session_pad(row * COLS + col, false, now),
            Overlay::SessionSave => self.session_pad(row * COLS + col, true, now),
            Overlay::SyncSettings => self.settings_pad(track, col),
            Overlay::Selecting => {
                if self.row_target(track).is_some() {
                    self.send(RemoteCommand::set(
                        Target::Global,
                        "selected_loop_num",
                        track as f32,
                    ));
                }
            }
            Overlay::Solo => {
                if let Some(target) = self.row_target(track) {
                    self.send(RemoteCommand::hit(target, "solo"));
                }
            }
            Overlay::Mute => {
                if let Some(target) = self.row_target(track) {
                    self.send(RemoteCommand::hit(target, "mute"));
                }
            }
            Overlay::Volume => {
                // pressing the selected row again clears the selection
                let Some(Target::Track(index)) = self.row_target(track) else {
                    return;
                };
                let selected = (self.state().device.volume_track != Some(index)).then_some(index);
                self.dispatch(StoreAction::DeviceSetting(DeviceSetting::VolumeTrack(selected)));
            }
            Overlay::Pan | Overlay::Loops => self.loop_pad(track, col),
        }
    }

    /// Target for a row's track index, if it is the global row or a live loop
    fn row_target(&self, track: i32) -> Option<Target> {
        if track >= 0 && track as usize >= self.state().device.loopcount {
            trace!("No loop {} on this row", track);
            return None;
        }
        Target::from_index(track)
    }

    fn session_pad(&mut self, ordinal: u8, save: bool, now: Instant) {
        let path = self.surface.session_path(&session_file_name(ordinal));
        let delay = self.surface.follow_up_delay();
        let returl = self.returl.clone();
        if save {
            info!("Saving session {}", path);
            self.send(RemoteCommand::save_session(&path, &returl));
            self.timers.schedule(TimerKind::SessionList, now, delay);
        } else {
            info!("Loading session {}", path);
            self.send(RemoteCommand::load_session(&path, &returl));
            self.timers.schedule(TimerKind::SessionReload, now, delay);
        }
        self.dispatch(StoreAction::DeviceSetting(DeviceSetting::Mode(DeviceMode::Loops)));
    }

    fn settings_pad(&mut self, track: i32, col: u8) {
        if track == -1 {
            if col == 0 {
                let device = &self.state().device;
                let next = cycle(-3, device.loopcount as i32, device.sync_source());
                self.send(RemoteCommand::set(Target::Global, "sync_source", next as f32));
            }
            return;
        }
        let Some(Target::Track(index)) = self.row_target(track) else {
            return;
        };
        let ctrl = SETTING_COLUMNS[col as usize];
        let current = self.state().tracks[index].value(ctrl);
        let target = Target::Track(index);

        match ctrl {
            TrackControl::Reverse => self.send(RemoteCommand::hit(target, "reverse")),
            TrackControl::Quantize => {
                let next = cycle(0, 3, current as i32);
                self.send(RemoteCommand::set(target, ctrl.as_str(), next as f32));
            }
            _ => {
                let next = if current != 0.0 { 0.0 } else { 1.0 };
                self.send(RemoteCommand::set(target, ctrl.as_str(), next));
            }
        }
    }

    fn loop_pad(&mut self, track: i32, col: u8) {
        let Some(target) = self.row_target(track) else {
            return;
        };
        let recording = match target {
            Target::Track(index) => self.state().tracks[index].state() == PlaybackState::Recording,
            _ => self.state().any_recording(),
        };
        let flags = self.flags;

        let what = match col {
            0 if recording && !flags.force_alt1 => "overdub",
            0 => "record",
            1 => "multiply",
            2 if flags.undoing => "undo",
            2 => "insert",
            3 if flags.redoing => "redo",
            3 => "replace",
            4 => "substitute",
            5 => "oneshot",
            6 => "trigger",
            _ => "pause",
        };
        debug!("Pad {:?} col {} -> {}", target, col, what);
        self.send(RemoteCommand::hit(target, what));
    }
}
