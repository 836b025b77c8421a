//! Outbound UI surface
//!
//! The controller reports outcomes through [`UiSurface`] and never reads UI
//! state back. All calls are fire-and-forget.
//!
//! Two small models back a typical front end: [`StatusBoard`] holds the
//! transient banners (newest first, each expiring after a TTL) and
//! [`DebugLog`] holds timestamped lines for a debug panel.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};

/// Label for the mute button while the microphone is live
pub const MUTE_LABEL: &str = "Mute";

/// Label for the mute button while the microphone is muted
pub const UNMUTE_LABEL: &str = "Unmute";

/// Mute button label for a muted state
pub fn mute_label(muted: bool) -> &'static str {
    if muted { UNMUTE_LABEL } else { MUTE_LABEL }
}

/// What the controller can tell the front end
pub trait UiSurface: Send + Sync {
    /// Show a transient status banner
    fn report_status(&self, message: &str, is_error: bool);

    /// Switch to the in-call view
    fn set_connected_view(&self, room: &str, display_name: &str);

    /// Switch back to the join form
    fn set_disconnected_view(&self);

    /// Update the mute button for the given muted state
    fn set_mute_label(&self, muted: bool);

    /// Append a line to the debug panel
    fn debug(&self, _message: &str) {}
}

/// A UI that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUi;

impl UiSurface for NullUi {
    fn report_status(&self, _message: &str, _is_error: bool) {}
    fn set_connected_view(&self, _room: &str, _display_name: &str) {}
    fn set_disconnected_view(&self) {}
    fn set_mute_label(&self, _muted: bool) {}
}

/// One status banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub posted_at: Instant,
}

impl StatusMessage {
    /// CSS class for this banner
    pub fn class(&self) -> &'static str {
        if self.is_error { "error" } else { "success" }
    }
}

/// Transient status banners, newest first
#[derive(Debug, Clone)]
pub struct StatusBoard {
    ttl: Duration,
    messages: VecDeque<StatusMessage>,
}

impl StatusBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            messages: VecDeque::new(),
        }
    }

    /// Post a banner at `now`
    pub fn push(&mut self, text: impl Into<String>, is_error: bool, now: Instant) {
        self.messages.push_front(StatusMessage {
            text: text.into(),
            is_error,
            posted_at: now,
        });
    }

    /// Drop banners older than the TTL
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.messages
            .retain(|m| now.saturating_duration_since(m.posted_at) < ttl);
    }

    /// Banners still visible at `now`, newest first
    pub fn visible(&self, now: Instant) -> impl Iterator<Item = &StatusMessage> {
        let ttl = self.ttl;
        self.messages
            .iter()
            .filter(move |m| now.saturating_duration_since(m.posted_at) < ttl)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Timestamped debug lines, oldest first, bounded
#[derive(Debug, Clone)]
pub struct DebugLog {
    capacity: usize,
    lines: VecDeque<String>,
}

impl DebugLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Append `[<rfc3339 timestamp>] message`
    pub fn push(&mut self, message: &str) {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(format!("[{}] {}", stamp, message));
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_mute_state() {
        assert_eq!(mute_label(true), "Unmute");
        assert_eq!(mute_label(false), "Mute");
    }

    #[test]
    fn banners_are_newest_first_and_expire() {
        let start = Instant::now();
        let mut board = StatusBoard::new(Duration::from_secs(5));
        board.push("Successfully joined the room!", false, start);
        board.push("Microphone muted", false, start + Duration::from_secs(3));

        let texts: Vec<_> = board
            .visible(start + Duration::from_secs(4))
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, ["Microphone muted", "Successfully joined the room!"]);

        let later = start + Duration::from_secs(6);
        assert_eq!(board.visible(later).count(), 1);
        board.prune(later);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn error_banners_use_error_class() {
        let mut board = StatusBoard::new(Duration::from_secs(5));
        let now = Instant::now();
        board.push("Error joining call: boom", true, now);
        assert_eq!(board.visible(now).next().unwrap().class(), "error");
    }

    #[test]
    fn debug_log_is_bounded_and_timestamped() {
        let mut log = DebugLog::new(2);
        log.push("Application starting...");
        log.push("Secure context: true");
        log.push("Initialization complete");

        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] Secure context: true"));
        assert!(lines[1].starts_with('['));
    }
}
