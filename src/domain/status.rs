//! Single-slot status line with timed expiry.
//!
//! Every expiry timer carries the id of the message it was started for, so a
//! timer that fires after its message was replaced is a no-op.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::time::Instant;

/// How long a status message stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub id: StatusId,
    pub text: String,
    pub kind: StatusKind,
    pub expires_at: Instant,
}

pub struct StatusNotifier {
    current: Option<StatusMessage>,
    next_id: u64,
    ttl: Duration,
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new(STATUS_TTL)
    }
}

impl StatusNotifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: None,
            next_id: 0,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Replace the visible message. The returned id must be passed to
    /// [`StatusNotifier::expire`] when this message's timer fires.
    pub fn publish(&mut self, text: impl Into<String>, kind: StatusKind) -> StatusId {
        self.next_id += 1;
        let id = StatusId(self.next_id);
        self.current = Some(StatusMessage {
            id,
            text: text.into(),
            kind,
            expires_at: Instant::now() + self.ttl,
        });
        id
    }

    /// Clear the message if it is still the one `id` refers to.
    pub fn expire(&mut self, id: StatusId) -> bool {
        match self.current {
            Some(ref msg) if msg.id == id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the message if its deadline has passed.
    pub fn sweep(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|m| now >= m.expires_at) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }
}

/// Run `on_expire(id)` once `ttl` has elapsed.
pub fn spawn_expiry<F>(id: StatusId, ttl: Duration, on_expire: F) -> tokio::task::JoinHandle<()>
where
    F: FnOnce(StatusId) + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        on_expire(id);
    })
}
