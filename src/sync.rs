//! Handshake and subscription bookkeeping with the looper
//!
//! The looper only pushes what it has been asked to push, and forgets
//! registrations when it restarts. The protocol probes until it answers,
//! subscribes every mirrored control for the current loop range, follows loop
//! count changes and periodically re-asserts everything.

use crate::looper::command::{GLOB_PATH, INFO_PATH, PONG_PATH, UPDATE_PATH};
use crate::looper::{LooperInfo, RemoteCommand, Target};
use crate::state::{GlobalControl, StoreAction, TrackControl};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    /// Probe sent, waiting for `/pong`
    AwaitAck,
    /// Registered; `loopcount` is `None` until the first count report
    Registered { loopcount: Option<usize> },
}

/// Commands to send and model actions to dispatch for one transition
#[derive(Debug, Default, PartialEq)]
pub struct SyncStep {
    pub commands: Vec<RemoteCommand>,
    pub actions: Vec<StoreAction>,
}

impl SyncStep {
    fn command(mut self, cmd: RemoteCommand) -> Self {
        self.commands.push(cmd);
        self
    }
}

pub struct SyncProtocol {
    state: LinkState,
    epoch: u64,
    returl: String,
    auto_update_ms: i32,
    /// A liveness ping is out and has not been answered
    awaiting_liveness: bool,
    /// Highest count the mirror was sized for, survives re-handshakes
    mirrored: usize,
}

impl SyncProtocol {
    pub fn new(returl: impl Into<String>, auto_update_ms: u64) -> Self {
        Self {
            state: LinkState::Disconnected,
            epoch: 0,
            returl: returl.into(),
            auto_update_ms: auto_update_ms.min(i32::MAX as u64) as i32,
            awaiting_liveness: false,
            mirrored: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn set_auto_update_ms(&mut self, ms: u64) {
        self.auto_update_ms = ms.min(i32::MAX as u64) as i32;
    }

    /// Loop count currently subscribed, if known
    pub fn loopcount(&self) -> Option<usize> {
        match self.state {
            LinkState::Registered { loopcount } => loopcount,
            _ => None,
        }
    }

    /// Whether feedback for `track` belongs to the mirrored range
    pub fn accepts_track(&self, track: i32) -> bool {
        track >= 0 && self.loopcount().is_some_and(|n| (track as usize) < n)
    }

    fn probe(&self) -> RemoteCommand {
        RemoteCommand::ping(&self.returl, PONG_PATH)
    }

    /// Begin (or restart) the handshake
    pub fn start(&mut self) -> SyncStep {
        self.epoch += 1;
        self.state = LinkState::AwaitAck;
        self.awaiting_liveness = false;
        info!("Looper handshake started (epoch={})", self.epoch);
        SyncStep::default().command(self.probe())
    }

    pub fn on_pong(&mut self, info: Option<LooperInfo>) -> SyncStep {
        let mut step = match self.state {
            LinkState::Disconnected => {
                debug!("Ignoring pong before handshake");
                return SyncStep::default();
            }
            LinkState::AwaitAck => {
                info!("Looper answered (epoch={}), registering", self.epoch);
                self.state = LinkState::Registered { loopcount: None };
                self.awaiting_liveness = false;
                let mut step = SyncStep::default()
                    .command(RemoteCommand::register(&self.returl))
                    .command(RemoteCommand::ping(&self.returl, INFO_PATH));
                step.commands.extend(self.global_subscriptions(true));
                step
            }
            LinkState::Registered { .. } => {
                self.awaiting_liveness = false;
                SyncStep::default()
            }
        };

        if let Some(info) = info {
            let next = self.on_info(info);
            step.commands.extend(next.commands);
            step.actions.extend(next.actions);
        }
        step
    }

    pub fn on_info(&mut self, info: LooperInfo) -> SyncStep {
        let LinkState::Registered { loopcount } = self.state else {
            debug!("Ignoring loop count report while not registered");
            return SyncStep::default();
        };
        let n = info.loopcount;
        let mut step = SyncStep::default();

        match loopcount {
            None => {
                info!("Looper {} ({}) has {} loops", info.host, info.version, n);
                for i in n..self.mirrored {
                    step.actions.push(StoreAction::EmptyTrack(i));
                }
                step.actions.push(StoreAction::LoopCount(n));
                step.commands.extend(self.track_subscriptions(0, n, true));
                step.commands.extend(self.track_gets(0, n));
            }
            Some(k) if n > k => {
                info!("Loop count grew {} -> {}", k, n);
                step.actions.push(StoreAction::LoopCount(n));
                step.commands.extend(self.track_subscriptions(0, k, false));
                step.commands.extend(self.track_subscriptions(0, n, true));
                for i in k..n {
                    step.commands
                        .push(RemoteCommand::set(Target::Track(i), TrackControl::Sync.as_str(), 1.0));
                }
                step.commands.extend(self.track_gets(k, n));
            }
            Some(k) if n < k => {
                info!("Loop count shrank {} -> {}", k, n);
                for i in n..k {
                    step.actions.push(StoreAction::EmptyTrack(i));
                }
                step.actions.push(StoreAction::LoopCount(n));
                step.commands.extend(self.track_subscriptions(0, k, false));
                step.commands.extend(self.track_subscriptions(0, n, true));
            }
            Some(_) => return step,
        }

        self.mirrored = n;
        self.state = LinkState::Registered { loopcount: Some(n) };
        step
    }

    /// Periodic tick
    pub fn reassert(&mut self) -> SyncStep {
        match self.state {
            LinkState::Disconnected => SyncStep::default(),
            LinkState::AwaitAck => {
                debug!("Re-probing looper (epoch={})", self.epoch);
                SyncStep::default().command(self.probe())
            }
            LinkState::Registered { .. } if self.awaiting_liveness => {
                warn!("Looper stopped answering, restarting handshake");
                self.start()
            }
            LinkState::Registered { loopcount } => {
                self.awaiting_liveness = true;
                let mut step = SyncStep::default()
                    .command(self.probe())
                    .command(RemoteCommand::register(&self.returl));
                step.commands.extend(self.global_subscriptions(false));
                step.commands.extend(self.global_subscriptions(true));
                if let Some(n) = loopcount {
                    step.commands.extend(self.track_subscriptions(0, n, false));
                    step.commands.extend(self.track_subscriptions(0, n, true));
                    step.commands.extend(self.track_gets(0, n));
                }
                step
            }
        }
    }

    fn global_subscriptions(&self, register: bool) -> Vec<RemoteCommand> {
        let mut commands = Vec::new();
        for ctrl in GlobalControl::ALL {
            if register {
                commands.push(RemoteCommand::register_update(
                    Target::Global,
                    ctrl.as_str(),
                    &self.returl,
                    GLOB_PATH,
                ));
                commands.push(RemoteCommand::get(
                    Target::Global,
                    ctrl.as_str(),
                    &self.returl,
                    GLOB_PATH,
                ));
            } else {
                commands.push(RemoteCommand::unregister_update(
                    Target::Global,
                    ctrl.as_str(),
                    &self.returl,
                    GLOB_PATH,
                ));
            }
        }
        commands
    }

    /// (Un)subscribe every track control for tracks `lo..hi`
    fn track_subscriptions(&self, lo: usize, hi: usize, register: bool) -> Vec<RemoteCommand> {
        if hi <= lo {
            return Vec::new();
        }
        let target = Target::Range(lo, hi - 1);
        let mut commands = Vec::new();
        for ctrl in TrackControl::UPDATED {
            commands.push(if register {
                RemoteCommand::register_update(target, ctrl.as_str(), &self.returl, UPDATE_PATH)
            } else {
                RemoteCommand::unregister_update(target, ctrl.as_str(), &self.returl, UPDATE_PATH)
            });
        }
        for ctrl in TrackControl::AUTO_UPDATED {
            commands.push(if register {
                RemoteCommand::register_auto_update(
                    target,
                    ctrl.as_str(),
                    self.auto_update_ms,
                    &self.returl,
                )
            } else {
                RemoteCommand::unregister_auto_update(target, ctrl.as_str(), &self.returl)
            });
        }
        commands
    }

    fn track_gets(&self, lo: usize, hi: usize) -> Vec<RemoteCommand> {
        if hi <= lo {
            return Vec::new();
        }
        let target = Target::Range(lo, hi - 1);
        TrackControl::UPDATED
            .iter()
            .chain(TrackControl::AUTO_UPDATED.iter())
            .map(|ctrl| RemoteCommand::get(target, ctrl.as_str(), &self.returl, UPDATE_PATH))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looper::Arg;

    const URL: &str = "osc.udp://127.0.0.1:9952";

    fn info(n: usize) -> LooperInfo {
        LooperInfo {
            host: "osc.udp://localhost:9951/".into(),
            version: "1.7.9".into(),
            loopcount: n,
        }
    }

    fn registered(n: usize) -> SyncProtocol {
        let mut sync = SyncProtocol::new(URL, 100);
        sync.start();
        sync.on_pong(None);
        sync.on_info(info(n));
        sync
    }

    fn has(step: &SyncStep, command: &str, target: Target, first_arg: &str) -> bool {
        step.commands.iter().any(|c| {
            c.command == command && c.target == target && c.args.first() == Some(&Arg::Str(first_arg.into()))
        })
    }

    #[test]
    fn test_start_probes() {
        let mut sync = SyncProtocol::new(URL, 100);
        let step = sync.start();

        assert_eq!(sync.state(), LinkState::AwaitAck);
        assert_eq!(step.commands, vec![RemoteCommand::ping(URL, "/pong")]);
        assert_eq!(sync.epoch(), 1);
    }

    #[test]
    fn test_pong_registers_globals() {
        let mut sync = SyncProtocol::new(URL, 100);
        sync.start();
        let step = sync.on_pong(None);

        assert_eq!(sync.state(), LinkState::Registered { loopcount: None });
        assert_eq!(step.commands[0], RemoteCommand::register(URL));
        assert_eq!(step.commands[1], RemoteCommand::ping(URL, "/info"));
        assert!(has(&step, "register_update", Target::Global, "sync_source"));
        assert!(step.actions.is_empty());
    }

    #[test]
    fn test_first_count_is_adopted_without_defaults() {
        let mut sync = SyncProtocol::new(URL, 100);
        sync.start();
        sync.on_pong(None);
        let step = sync.on_info(info(2));

        assert_eq!(step.actions, vec![StoreAction::LoopCount(2)]);
        assert!(has(&step, "register_update", Target::Range(0, 1), "wet"));
        assert!(has(&step, "register_auto_update", Target::Range(0, 1), "state"));
        assert!(has(&step, "get", Target::Range(0, 1), "loop_len"));
        assert!(!step.commands.iter().any(|c| c.command == "set"));
        assert_eq!(sync.loopcount(), Some(2));
    }

    #[test]
    fn test_growth_subscribes_and_pushes_sync() {
        let mut sync = registered(2);
        let step = sync.on_info(info(3));

        assert_eq!(step.actions, vec![StoreAction::LoopCount(3)]);
        assert!(has(&step, "unregister_update", Target::Range(0, 1), "wet"));
        assert!(has(&step, "register_update", Target::Range(0, 2), "wet"));
        assert!(step
            .commands
            .contains(&RemoteCommand::set(Target::Track(2), "sync", 1.0)));
        assert!(!step
            .commands
            .contains(&RemoteCommand::set(Target::Track(1), "sync", 1.0)));
        assert!(has(&step, "get", Target::Range(2, 2), "state"));
    }

    #[test]
    fn test_shrink_clears_tracks() {
        let mut sync = registered(3);
        let step = sync.on_info(info(1));

        assert_eq!(
            step.actions,
            vec![
                StoreAction::EmptyTrack(1),
                StoreAction::EmptyTrack(2),
                StoreAction::LoopCount(1)
            ]
        );
        assert!(has(&step, "register_update", Target::Range(0, 0), "sync"));
        assert!(!sync.accepts_track(1));
        assert!(sync.accepts_track(0));
    }

    #[test]
    fn test_shrink_to_zero_subscribes_nothing() {
        let mut sync = registered(2);
        let step = sync.on_info(info(0));

        assert!(!step.commands.iter().any(|c| c.command == "register_update"));
        assert_eq!(sync.loopcount(), Some(0));
    }

    #[test]
    fn test_same_count_is_a_no_op() {
        let mut sync = registered(2);

        assert_eq!(sync.on_info(info(2)), SyncStep::default());
    }

    #[test]
    fn test_reassert_while_waiting_reprobes() {
        let mut sync = SyncProtocol::new(URL, 100);
        sync.start();
        let step = sync.reassert();

        assert_eq!(step.commands, vec![RemoteCommand::ping(URL, "/pong")]);
        assert_eq!(sync.state(), LinkState::AwaitAck);
    }

    #[test]
    fn test_silent_looper_restarts_handshake() {
        let mut sync = registered(2);

        let step = sync.reassert();
        assert!(has(&step, "register_update", Target::Range(0, 1), "sync"));
        assert!(has(&step, "get", Target::Range(0, 1), "state"));

        // no pong in between
        let step = sync.reassert();
        assert_eq!(sync.state(), LinkState::AwaitAck);
        assert_eq!(sync.epoch(), 2);
        assert_eq!(step.commands, vec![RemoteCommand::ping(URL, "/pong")]);
    }

    #[test]
    fn test_answered_liveness_keeps_registration() {
        let mut sync = registered(2);
        sync.reassert();
        sync.on_pong(Some(info(2)));
        sync.reassert();

        assert_eq!(sync.state(), LinkState::Registered { loopcount: Some(2) });
    }

    #[test]
    fn test_rehandshake_clears_tracks_gone_meanwhile() {
        let mut sync = registered(3);
        sync.start();
        sync.on_pong(None);
        let step = sync.on_info(info(1));

        assert_eq!(
            step.actions,
            vec![
                StoreAction::EmptyTrack(1),
                StoreAction::EmptyTrack(2),
                StoreAction::LoopCount(1)
            ]
        );
    }

    #[test]
    fn test_pong_with_count_acts_as_info() {
        let mut sync = SyncProtocol::new(URL, 100);
        sync.start();
        let step = sync.on_pong(Some(info(4)));

        assert_eq!(step.actions, vec![StoreAction::LoopCount(4)]);
        assert_eq!(sync.loopcount(), Some(4));
    }
}
