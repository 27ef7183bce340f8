//! Transient notifications
//!
//! A single toast at a time; showing a new one replaces the old. Toasts
//! expire on their own after the configured duration.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct NotificationState {
    current: Option<Notification>,
    duration: Duration,
}

impl NotificationState {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn show(&mut self, message: &str) {
        self.show_at(message, NotificationKind::Info, Instant::now());
    }

    pub fn show_error(&mut self, message: &str) {
        self.show_at(message, NotificationKind::Error, Instant::now());
    }

    pub fn show_at(&mut self, message: &str, kind: NotificationKind, now: Instant) {
        self.current = Some(Notification {
            message: message.to_string(),
            kind,
            shown_at: now,
        });
    }

    /// The notification, if one is showing and hasn't expired by `now`
    pub fn visible_at(&self, now: Instant) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.shown_at) < self.duration)
    }

    pub fn current(&self) -> Option<&Notification> {
        self.visible_at(Instant::now())
    }

    /// Drop an expired notification. Returns true if one was removed.
    pub fn clear_expired(&mut self, now: Instant) -> bool {
        if self.current.is_some() && self.visible_at(now).is_none() {
            self.current = None;
            return true;
        }
        false
    }
}
