//! Input decoding helpers for the surface's knobs and dual-purpose buttons

pub mod knob;
pub mod latch;
pub mod stepper;

pub use knob::KnobDecoder;
pub use latch::{LatchDetector, LatchError};
pub use stepper::cycle;
