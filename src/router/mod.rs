//! Router module - single owner of the mirrored model and all surface logic
//!
//! The Router is driven by one task and never blocks:
//! - surface MIDI (pads, knobs, mode buttons) becomes looper commands
//! - looper feedback updates the mirror and the sync protocol
//! - timers re-assert subscriptions and follow up session loads/saves
//!
//! Every handler re-renders and queues at most one LED batch. Effects are
//! collected in an outbound queue the main loop drains with `take_outbound`.

mod buttons;
mod feedback;
mod knobs;
mod overlay;
mod pads;
pub mod timers;

pub use overlay::{InteractionFlags, Overlay};
pub use timers::{TimerKind, Timers};


use crate::apc::layout::{is_pad, knob_index};
use crate::config::{AppConfig, SurfaceConfig};
use crate::input::{KnobDecoder, LatchDetector};
use crate::looper::{return_url, RemoteCommand};
use crate::midi::{format_hex, EventKind, MidiMessage};
use crate::render::{create_frame, FrameDiffer, LedCell};
use crate::state::{AppState, Store, StoreAction};
use crate::sync::{SyncProtocol, SyncStep};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Side effect queued by the router
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Changed pad cells, sent as one MIDI buffer
    Leds(Vec<LedCell>),
    Remote(RemoteCommand),
}

/// Surface/looper orchestrator
pub struct Router {
    pub(crate) surface: SurfaceConfig,
    /// Where the looper sends feedback
    pub(crate) returl: String,
    /// Host/port the session lister answers to
    pub(crate) reply_host: String,
    pub(crate) reply_port: u16,
    pub(crate) store: Store,
    pub(crate) flags: InteractionFlags,
    /// Up and Down, in that order
    pub(crate) held_arrows: [bool; 2],
    pub(crate) knobs: KnobDecoder,
    pub(crate) latch: LatchDetector,
    pub(crate) differ: FrameDiffer,
    pub(crate) sync: SyncProtocol,
    pub(crate) timers: Timers,
    pub(crate) outbound: Vec<Outbound>,
}

impl Router {
    pub fn new(config: &AppConfig) -> Self {
        let surface = config.surface.clone();
        Self {
            returl: return_url(config.looper.local_port),
            reply_host: "127.0.0.1".to_string(),
            reply_port: config.looper.local_port,
            store: Store::new(),
            flags: InteractionFlags::default(),
            held_arrows: [false; 2],
            knobs: KnobDecoder::new(surface.knob_steps, surface.knob_steps_shifted),
            latch: LatchDetector::new(surface.latch_hold()),
            differ: FrameDiffer::new(),
            sync: SyncProtocol::new(return_url(config.looper.local_port), surface.auto_update_interval_ms),
            timers: Timers::new(),
            outbound: Vec::new(),
            surface,
        }
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn flags(&self) -> &InteractionFlags {
        &self.flags
    }

    pub fn sync(&self) -> &SyncProtocol {
        &self.sync
    }

    /// Begin the looper handshake and paint the surface
    pub fn start(&mut self, now: Instant) {
        self.restart_handshake(now);
        self.refresh();
    }

    pub(crate) fn restart_handshake(&mut self, now: Instant) {
        // a pending session reload would only repeat this handshake
        self.timers.cancel(TimerKind::SessionReload);
        let step = self.sync.start();
        self.apply_step(step);
        self.timers
            .schedule(TimerKind::Reassert, now, self.surface.reassert_interval());
    }

    /// Raw bytes from the surface input port
    pub fn on_surface_midi(&mut self, data: &[u8], now: Instant) {
        match MidiMessage::parse(data) {
            Ok(message) => self.on_surface_message(message, now),
            Err(e) => debug!("Dropping surface MIDI {}: {}", format_hex(data), e),
        }
    }

    pub fn on_surface_message(&mut self, message: MidiMessage, now: Instant) {
        trace!("Surface: {}", message);
        let id = message.identity();
        match (message, message.kind()) {
            (MidiMessage::ControlChange { value, .. }, _) => match knob_index(id) {
                Some(knob) => self.on_knob(knob, id, value),
                None => trace!("Ignoring CC {}", id),
            },
            (_, kind) if is_pad(id) => self.on_pad(id, kind == EventKind::Press, now),
            (_, kind) => self.on_button(id, kind, now),
        }
        self.refresh();
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Run every timer that is due
    pub fn poll_timers(&mut self, now: Instant) {
        let due = self.timers.due(now);
        if due.is_empty() {
            return;
        }
        for kind in due {
            self.on_timer(kind, now);
        }
        self.refresh();
    }

    fn on_timer(&mut self, kind: TimerKind, now: Instant) {
        trace!("Timer fired: {:?}", kind);
        match kind {
            TimerKind::Reassert => {
                let step = self.sync.reassert();
                self.apply_step(step);
                self.timers
                    .schedule(TimerKind::Reassert, now, self.surface.reassert_interval());
            }
            TimerKind::SessionReload => self.restart_handshake(now),
            TimerKind::SessionList => self.request_sessions(),
        }
    }

    /// Apply a hot-reloaded surface section
    pub fn apply_surface_config(&mut self, surface: SurfaceConfig) {
        if surface == self.surface {
            return;
        }
        self.knobs
            .set_steps(surface.knob_steps, surface.knob_steps_shifted);
        self.latch.set_hold(surface.latch_hold());
        self.sync.set_auto_update_ms(surface.auto_update_interval_ms);
        info!(
            "Surface config updated (knob steps {}/{}, latch {} ms, reassert {} ms)",
            surface.knob_steps,
            surface.knob_steps_shifted,
            surface.latch_hold_ms,
            surface.reassert_interval_ms
        );
        self.surface = surface;
    }

    /// The surface was reopened: forget what it shows and repaint everything
    pub fn surface_reconnected(&mut self) {
        self.differ.reset();
        self.refresh();
    }

    /// Take queued effects (consumes them, leaving an empty queue)
    pub fn take_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    pub(crate) fn send(&mut self, command: RemoteCommand) {
        debug!("-> {}", command);
        self.outbound.push(Outbound::Remote(command));
    }

    pub(crate) fn dispatch(&mut self, action: StoreAction) {
        self.store.dispatch(action);
    }

    pub(crate) fn apply_step(&mut self, step: SyncStep) {
        for action in step.actions {
            self.dispatch(action);
        }
        for command in step.commands {
            self.outbound.push(Outbound::Remote(command));
        }
    }

    pub(crate) fn request_sessions(&mut self) {
        let command = RemoteCommand::sessions(&self.reply_host, self.reply_port);
        self.send(command);
    }

    /// Render the model and queue whatever changed on the pads
    pub(crate) fn refresh(&mut self) {
        let frame = create_frame(self.store.state(), &self.flags);
        let changed = self.differ.diff(&frame);
        if !changed.is_empty() {
            trace!("LED batch: {} cells", changed.len());
            self.outbound.push(Outbound::Leds(changed));
        }
    }
}
