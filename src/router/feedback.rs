//! Looper feedback into the mirror and the sync protocol

use crate::looper::{Feedback, FeedbackError};
use crate::state::{DeviceSetting, StoreAction};
use tracing::{debug, trace, warn};

impl super::Router {
    /// Handle one parsed datagram from the looper or the session lister
    pub fn on_feedback(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::Update { track, ctrl, value } => {
                if !self.sync.accepts_track(track) {
                    trace!("Stale update for loop {} ({}), dropped", track, ctrl);
                    return;
                }
                self.dispatch(StoreAction::TrackUpdate {
                    track: track as usize,
                    ctrl,
                    value,
                });
            }
            Feedback::Glob { ctrl, value } => {
                self.dispatch(StoreAction::GlobSetting { ctrl, value });
            }
            Feedback::Info(info) => {
                let step = self.sync.on_info(info);
                self.apply_step(step);
            }
            Feedback::Pong(info) => {
                let step = self.sync.on_pong(info);
                self.apply_step(step);
            }
            Feedback::Sessions(mut names) => {
                names.retain(|n| n.ends_with(".slsess"));
                names.sort();
                debug!("{} sessions available", names.len());
                self.dispatch(StoreAction::DeviceSetting(DeviceSetting::Sessions(names)));
            }
            Feedback::Error(text) => warn!("Looper reported an error: {}", text),
        }
        self.refresh();
    }

    /// Parse result straight from the socket; malformed datagrams are only logged
    pub fn on_feedback_result(&mut self, result: Result<Feedback, FeedbackError>) {
        match result {
            Ok(feedback) => self.on_feedback(feedback),
            Err(e) => debug!("Dropping feedback: {}", e),
        }
    }
}
