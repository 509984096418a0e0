//! The notification overlay (SPEC_FULL.md §2 "Notification window").
//!
//! Grounded in `original_source/src/notification.c` /
//! `include/core/notification.h`: an overlay window, shown for a
//! configured duration and force-hidden on the next input event. Text
//! rendering and font selection stay out of scope (spec.md §1); this
//! module only owns the position/size/timer state and the string to
//! hand to the display facade's window-creation call.

use crate::geometry::Rectangle;

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub text: String,
    pub rect: Rectangle,
    shown_at: Option<u64>,
    duration_secs: u32,
}

impl Notification {
    #[must_use]
    pub fn new(duration_secs: u32) -> Self {
        Notification { text: String::new(), rect: Rectangle::default(), shown_at: None, duration_secs }
    }

    /// Shows `text` centered over `anchor` (the focused frame's
    /// rectangle, or the monitor rectangle when no frame is focused).
    pub fn show(&mut self, text: String, anchor: Rectangle, now: u64) {
        let (w, h) = (estimate_width(&text), 24);
        let center = anchor.center();
        self.text = text;
        self.rect = Rectangle::new(center.x - w as i32 / 2, center.y - h as i32 / 2, w, h);
        self.shown_at = Some(now);
    }

    /// Advances the timer; returns `true` if the notification just
    /// expired and should be unmapped.
    pub fn tick(&mut self, now: u64) -> bool {
        match self.shown_at {
            Some(start) if now.saturating_sub(start) >= u64::from(self.duration_secs) => {
                self.shown_at = None;
                true
            }
            _ => false,
        }
    }

    /// Force-hides the notification (spec.md §2: the next keyboard or
    /// button event force-hides it).
    pub fn dismiss(&mut self) -> bool {
        let was_shown = self.shown_at.is_some();
        self.shown_at = None;
        was_shown
    }

    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.shown_at.is_some()
    }

    pub fn set_duration_secs(&mut self, duration_secs: u32) {
        self.duration_secs = duration_secs;
    }
}

fn estimate_width(text: &str) -> u32 {
    // Text rendering is out of scope; a rough monospace estimate is
    // enough to position the overlay sensibly before the display
    // facade's real layout takes over.
    (text.chars().count() as u32 * 8).max(40) + 16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_centers_over_anchor() {
        let mut note = Notification::new(3);
        let anchor = Rectangle::new(0, 0, 200, 100);
        note.show("hi".to_string(), anchor, 1_000);
        assert!(note.is_shown());
        assert_eq!(note.rect.center(), anchor.center());
    }

    #[test]
    fn tick_expires_after_duration() {
        let mut note = Notification::new(3);
        let anchor = Rectangle::new(0, 0, 10, 10);
        note.show("x".to_string(), anchor, 100);
        assert!(!note.tick(101));
        assert!(note.tick(103));
        assert!(!note.is_shown());
    }

    #[test]
    fn dismiss_hides_immediately() {
        let mut note = Notification::new(3);
        let anchor = Rectangle::new(0, 0, 10, 10);
        note.show("x".to_string(), anchor, 100);
        assert!(note.dismiss());
        assert!(!note.is_shown());
        assert!(!note.dismiss());
    }
}
