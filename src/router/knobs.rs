//! Knob handling: volume and pan banks

use crate::looper::{RemoteCommand, Target};
use crate::state::TrackControl;
use tracing::{debug, trace};

/// Value change per emitted knob step
const KNOB_SCALE: f32 = 0.1;

/// Knobs 4..6 in the volume bank, applied to `volume_track`
const LEVEL_KNOBS: [TrackControl; 3] = [
    TrackControl::Dry,
    TrackControl::Feedback,
    TrackControl::InputGain,
];

fn nudge(value: f32, amount: f32) -> f32 {
    (value + amount).clamp(0.0, 1.0)
}

impl super::Router {
    /// `knob` is the 0..7 index, `cc` the raw controller number
    pub(crate) fn on_knob(&mut self, knob: u8, cc: u8, raw: u8) {
        let Some(delta) = self.knobs.feed(cc, raw, self.flags.shifted) else {
            return;
        };
        let amount = delta as f32 * KNOB_SCALE;

        if self.state().device.pan {
            self.pan_knob(knob, amount);
        } else {
            self.volume_knob(knob, amount);
        }
    }

    /// Existing track on grid row `row`
    fn knob_track(&self, row: u8) -> Option<usize> {
        self.state().row_track(row).map(|(index, _)| index)
    }

    fn volume_knob(&mut self, knob: u8, amount: f32) {
        match knob {
            0..=3 => {
                let Some(track) = self.knob_track(knob + 1) else {
                    trace!("No track under knob {}", knob);
                    return;
                };
                let value = nudge(self.state().tracks[track].wet(), amount);
                self.send(RemoteCommand::set(Target::Track(track), "wet", value));
            }
            4..=6 => {
                let Some(track) = self.state().device.volume_track else {
                    debug!("Level knob {} turned without a selected track", knob);
                    return;
                };
                let Some(state) = self.state().tracks.get(track) else {
                    return;
                };
                let ctrl = LEVEL_KNOBS[(knob - 4) as usize];
                let value = nudge(state.value(ctrl), amount);
                self.send(RemoteCommand::set(Target::Track(track), ctrl.as_str(), value));
            }
            _ => {
                let value = nudge(self.state().device.wet(), amount);
                self.send(RemoteCommand::set(Target::Global, "wet", value));
            }
        }
    }

    fn pan_knob(&mut self, knob: u8, amount: f32) {
        let (row, second) = if knob < 4 {
            (knob + 1, false)
        } else {
            (knob - 3, true)
        };
        let Some(track) = self.knob_track(row) else {
            trace!("No track under pan knob {}", knob);
            return;
        };
        let state = &self.state().tracks[track];
        let (p1, p2, stereo) = (state.pan(1), state.pan(2), state.is_stereo());
        let target = Target::Track(track);

        if !stereo {
            if second {
                debug!("Track {} is mono, ignoring pan_2 knob", track);
                return;
            }
            self.send(RemoteCommand::set(target, "pan_1", nudge(p1, amount)));
            return;
        }

        if self.flags.shifted {
            // spread or narrow around the current positions
            self.send(RemoteCommand::set(target, "pan_1", nudge(p1, -amount)));
            self.send(RemoteCommand::set(target, "pan_2", nudge(p2, amount)));
            return;
        }

        if second {
            let new_p2 = nudge(p2, amount);
            self.send(RemoteCommand::set(target, "pan_2", new_p2));
            if new_p2 < p1 {
                self.send(RemoteCommand::set(target, "pan_1", new_p2));
            }
        } else {
            let new_p1 = nudge(p1, amount);
            self.send(RemoteCommand::set(target, "pan_1", new_p1));
            if new_p1 > p2 {
                self.send(RemoteCommand::set(target, "pan_2", new_p1));
            }
        }
    }
}
