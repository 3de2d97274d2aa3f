//! Momentary interaction flags and the overlay they select

use crate::state::{DeviceMode, GlobalState};

/// Held/latched modifier state, owned by the router and never mirrored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionFlags {
    pub shifted: bool,
    pub undoing: bool,
    pub redoing: bool,
    /// Forces column 0 to `record` even while recording
    pub force_alt1: bool,
    pub set_syncs: bool,
    pub selecting: bool,
    pub do_solo: bool,
    pub do_mute: bool,
    pub show_8ths: bool,
}

/// What a pad press means right now, highest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    SessionLoad,
    SessionSave,
    SyncSettings,
    Selecting,
    Solo,
    Mute,
    Volume,
    Pan,
    Loops,
}

impl Overlay {
    pub fn resolve(device: &GlobalState, flags: &InteractionFlags) -> Self {
        match device.mode {
            DeviceMode::SessionLoad => return Overlay::SessionLoad,
            DeviceMode::SessionSave => return Overlay::SessionSave,
            DeviceMode::Loops => {}
        }
        if flags.set_syncs {
            Overlay::SyncSettings
        } else if flags.selecting {
            Overlay::Selecting
        } else if flags.do_solo {
            Overlay::Solo
        } else if flags.do_mute {
            Overlay::Mute
        } else if device.volume {
            Overlay::Volume
        } else if device.pan {
            Overlay::Pan
        } else {
            Overlay::Loops
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_mode_wins() {
        let device = GlobalState {
            mode: DeviceMode::SessionSave,
            volume: true,
            ..Default::default()
        };
        let flags = InteractionFlags {
            set_syncs: true,
            selecting: true,
            ..Default::default()
        };

        assert_eq!(Overlay::resolve(&device, &flags), Overlay::SessionSave);
    }

    #[test]
    fn test_precedence_chain() {
        let mut device = GlobalState::default();
        let mut flags = InteractionFlags {
            selecting: true,
            do_solo: true,
            do_mute: true,
            ..Default::default()
        };
        device.pan = true;

        assert_eq!(Overlay::resolve(&device, &flags), Overlay::Selecting);
        flags.selecting = false;
        assert_eq!(Overlay::resolve(&device, &flags), Overlay::Solo);
        flags.do_solo = false;
        assert_eq!(Overlay::resolve(&device, &flags), Overlay::Mute);
        flags.do_mute = false;
        assert_eq!(Overlay::resolve(&device, &flags), Overlay::Pan);
        device.pan = false;
        assert_eq!(Overlay::resolve(&device, &flags), Overlay::Loops);
    }
}
