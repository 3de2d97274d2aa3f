//! APC Looper GW - drive SooperLooper from an Akai APC Key 25 mk2
//!
//! The surface talks MIDI, the looper talks OSC over UDP. The [`router::Router`]
//! owns the mirrored looper model and translates in both directions; the
//! binary only moves bytes between the ports, the socket and the router.

pub mod apc;
pub mod config;
pub mod input;
pub mod looper;
pub mod midi;
pub mod render;
pub mod router;
pub mod state;
pub mod sync;
