//! Outbound looper commands and their OSC rendering

use rosc::{OscMessage, OscType};
use std::fmt;

/// Loop addressed by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Engine-wide command, no `/sl/<n>` prefix
    Global,
    Track(usize),
    /// Every loop (`-1`)
    All,
    /// The selected loop (`-3`)
    Selected,
    /// Inclusive index range, rendered `[lo-hi]`
    Range(usize, usize),
}

impl Target {
    /// Pad row target: `-1` is the global row and addresses all loops
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            -1 => Some(Target::All),
            -3 => Some(Target::Selected),
            i if i >= 0 => Some(Target::Track(i as usize)),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Global => write!(f, "global"),
            Target::Track(i) => write!(f, "{}", i),
            Target::All => write!(f, "-1"),
            Target::Selected => write!(f, "-3"),
            Target::Range(lo, hi) => write!(f, "[{}-{}]", lo, hi),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Float(f32),
    Int(i32),
}

impl From<&Arg> for OscType {
    fn from(arg: &Arg) -> Self {
        match arg {
            Arg::Str(s) => OscType::String(s.clone()),
            Arg::Float(v) => OscType::Float(*v),
            Arg::Int(v) => OscType::Int(*v),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

/// Where a command is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Looper,
    SessionLister,
}

/// Return path for per-track control feedback
pub const UPDATE_PATH: &str = "/update";
/// Return path for global control feedback
pub const GLOB_PATH: &str = "/glob";
/// Return path for loop count reports
pub const INFO_PATH: &str = "/info";
pub const PONG_PATH: &str = "/pong";
pub const ERROR_PATH: &str = "/error";
/// Return path for session listings
pub const SESSIONS_PATH: &str = "/sessions";

/// One fire-and-forget command to the looper (or session lister)
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCommand {
    pub command: String,
    pub target: Target,
    pub args: Vec<Arg>,
}

impl RemoteCommand {
    pub fn new(command: impl Into<String>, target: Target, args: Vec<Arg>) -> Self {
        Self {
            command: command.into(),
            target,
            args,
        }
    }

    /// `hit s:<what>`: record, overdub, undo, mute, ...
    pub fn hit(target: Target, what: &str) -> Self {
        Self::new("hit", target, vec![what.into()])
    }

    pub fn set(target: Target, ctrl: &str, value: f32) -> Self {
        Self::new("set", target, vec![ctrl.into(), Arg::Float(value)])
    }

    pub fn get(target: Target, ctrl: &str, returl: &str, path: &str) -> Self {
        Self::new("get", target, vec![ctrl.into(), returl.into(), path.into()])
    }

    pub fn ping(returl: &str, path: &str) -> Self {
        Self::new("ping", Target::Global, vec![returl.into(), path.into()])
    }

    /// Loop add/remove notifications
    pub fn register(returl: &str) -> Self {
        Self::new("register", Target::Global, vec![returl.into(), INFO_PATH.into()])
    }

    pub fn register_update(target: Target, ctrl: &str, returl: &str, path: &str) -> Self {
        Self::new(
            "register_update",
            target,
            vec![ctrl.into(), returl.into(), path.into()],
        )
    }

    pub fn unregister_update(target: Target, ctrl: &str, returl: &str, path: &str) -> Self {
        Self::new(
            "unregister_update",
            target,
            vec![ctrl.into(), returl.into(), path.into()],
        )
    }

    pub fn register_auto_update(target: Target, ctrl: &str, interval_ms: i32, returl: &str) -> Self {
        Self::new(
            "register_auto_update",
            target,
            vec![
                ctrl.into(),
                Arg::Int(interval_ms),
                returl.into(),
                UPDATE_PATH.into(),
            ],
        )
    }

    pub fn unregister_auto_update(target: Target, ctrl: &str, returl: &str) -> Self {
        Self::new(
            "unregister_auto_update",
            target,
            vec![ctrl.into(), returl.into(), UPDATE_PATH.into()],
        )
    }

    pub fn load_session(path: &str, returl: &str) -> Self {
        Self::new(
            "load_session",
            Target::Global,
            vec![path.into(), returl.into(), ERROR_PATH.into()],
        )
    }

    pub fn save_session(path: &str, returl: &str) -> Self {
        Self::new(
            "save_session",
            Target::Global,
            vec![path.into(), returl.into(), ERROR_PATH.into()],
        )
    }

    /// Ask the session lister for its `.slsess` files, answered to `/sessions`
    pub fn sessions(reply_host: &str, reply_port: u16) -> Self {
        Self::new(
            "sessions",
            Target::Global,
            vec![
                reply_host.into(),
                Arg::Int(reply_port as i32),
                SESSIONS_PATH.into(),
            ],
        )
    }

    pub fn destination(&self) -> Destination {
        if self.target == Target::Global && self.command == "sessions" {
            Destination::SessionLister
        } else {
            Destination::Looper
        }
    }

    pub fn address(&self) -> String {
        match self.target {
            Target::Global => format!("/{}", self.command),
            target => format!("/sl/{}/{}", target, self.command),
        }
    }

    pub fn to_osc(&self) -> OscMessage {
        OscMessage {
            addr: self.address(),
            args: self.args.iter().map(OscType::from).collect(),
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())?;
        for arg in &self.args {
            match arg {
                Arg::Str(s) => write!(f, " s:{}", s)?,
                Arg::Float(v) => write!(f, " f:{}", v)?,
                Arg::Int(v) => write!(f, " i:{}", v)?,
            }
        }
        Ok(())
    }
}
