//! Auto-dismissing alert shown above the entry form.

use std::time::Duration;

use patientor_core::SubmitError;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::controller::Event;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The draft was rejected locally; nothing was sent.
    Validation,
    /// The service could not be reached or refused the request.
    Transport,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn from_submit_error(err: &SubmitError) -> Self {
        let kind = match err {
            SubmitError::Invalid(_) => AlertKind::Validation,
            SubmitError::Service(_) => AlertKind::Transport,
        };
        Self {
            kind,
            message: err.user_message(),
        }
    }
}

/// The visible alert plus the timer that will clear it.
///
/// Each raised alert gets a new sequence number; an expiry carrying an older
/// number is ignored.
#[derive(Debug, Default)]
pub(crate) struct AlertSlot {
    current: Option<Alert>,
    seq: u64,
    timer: Option<JoinHandle<()>>,
}

impl AlertSlot {
    pub(crate) fn current(&self) -> Option<&Alert> {
        self.current.as_ref()
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.current.is_some() && self.timer.is_some()
    }

    pub(crate) fn raise(&mut self, alert: Alert, timeout: Duration, events: UnboundedSender<Event>) {
        self.cancel_timer();
        self.seq += 1;
        let seq = self.seq;
        self.current = Some(alert);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(Event::AlertExpired { seq });
        }));
    }

    /// Clear the alert if `seq` is the one currently shown.
    pub(crate) fn expire(&mut self, seq: u64) -> bool {
        if seq != self.seq || self.current.is_none() {
            return false;
        }
        self.current = None;
        self.timer = None;
        true
    }

    pub(crate) fn dismiss(&mut self) {
        self.cancel_timer();
        self.current = None;
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for AlertSlot {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
