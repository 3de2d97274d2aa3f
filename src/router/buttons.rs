//! Mode, modifier and transport buttons

use crate::apc::layout::Button;
use crate::input::cycle;
use crate::looper::{RemoteCommand, Target};
use crate::midi::EventKind;
use crate::state::{DeviceMode, DeviceSetting, StoreAction};
use std::time::Instant;
use tracing::{debug, error, trace};

impl super::Router {
    pub(crate) fn on_button(&mut self, note: u8, kind: EventKind, now: Instant) {
        let Some(button) = Button::from_note(note) else {
            trace!("Ignoring unknown button {}", note);
            return;
        };
        let pressed = kind == EventKind::Press;

        match button {
            Button::Shift => self.flags.shifted = pressed,
            Button::Left => self.flags.undoing = pressed,
            Button::Right => self.flags.redoing = pressed,
            Button::Solo => self.flags.do_solo = pressed,
            Button::Mute => self.flags.do_mute = pressed,
            Button::Select => self.flags.selecting = pressed,
            Button::ClipStop => self.flags.show_8ths = pressed,
            Button::RecArm => match self.latch.feed(note, kind, now) {
                Ok(latched) => self.flags.set_syncs = latched,
                Err(e) => error!("{}", e),
            },
            Button::Up | Button::Down => self.on_arrow(button == Button::Up, pressed),
            _ if !pressed => {}
            Button::Device => self.next_device_mode(),
            Button::Volume => {
                let on = !self.state().device.volume;
                self.dispatch(StoreAction::DeviceSetting(DeviceSetting::Volume(on)));
                if on {
                    self.dispatch(StoreAction::DeviceSetting(DeviceSetting::Pan(false)));
                }
            }
            Button::Pan => {
                let on = !self.state().device.pan;
                self.dispatch(StoreAction::DeviceSetting(DeviceSetting::Pan(on)));
                if on {
                    self.dispatch(StoreAction::DeviceSetting(DeviceSetting::Volume(false)));
                }
            }
            Button::Play => self.send(RemoteCommand::hit(Target::All, "pause")),
            Button::Record => self.send(RemoteCommand::hit(Target::Selected, "record")),
            Button::StopAllClips => self.send(RemoteCommand::hit(Target::All, "mute")),
            Button::Send => trace!("Send button has no function"),
        }
    }

    /// Up/Down scroll the rows while shift or sync settings is active, otherwise hold force-record
    fn on_arrow(&mut self, up: bool, pressed: bool) {
        self.held_arrows[usize::from(!up)] = pressed;
        if !pressed {
            // force-record lasts while either arrow is still down
            self.flags.force_alt1 &= self.held_arrows.iter().any(|&held| held);
            return;
        }
        if self.flags.shifted || self.flags.set_syncs {
            let action = if up {
                StoreAction::OffsetUp
            } else {
                StoreAction::OffsetDown
            };
            self.dispatch(action);
            debug!("Row offset now {}", self.state().device.loopoffset);
        } else {
            self.flags.force_alt1 = true;
        }
    }

    fn next_device_mode(&mut self) {
        let current = self.state().device.mode.index();
        let last = DeviceMode::ROTATION.len() as i32 - 1;
        let next = DeviceMode::from_index(cycle(0, last, current));
        debug!("Device mode -> {:?}", next);
        self.dispatch(StoreAction::DeviceSetting(DeviceSetting::Mode(next)));
        if next.is_session() {
            self.request_sessions();
        }
    }
}
