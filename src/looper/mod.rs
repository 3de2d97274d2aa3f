//! SooperLooper OSC plumbing: command model, feedback parsing, UDP link

pub mod command;
pub mod feedback;
pub mod link;

pub use command::{Arg, Destination, RemoteCommand, Target};
pub use feedback::{Feedback, FeedbackError, LooperInfo};
pub use link::LooperLink;

/// OSC return URL for feedback sent to `local_port` on this host
pub fn return_url(local_port: u16) -> String {
    format!("osc.udp://127.0.0.1:{}", local_port)
}
