//! UI hooks
//!
//! Widgets are the host's business. The simulation only needs two things
//! from a UI: a way to show a blocking message and get told when the player
//! dismissed it, and a place to push HUD text.
//!
//! Acknowledgement is caller-driven: [`UserPrompt::show`] hands the host an
//! [`AckToken`], and the host passes that token back to the simulation once
//! the player confirms. A token from an older prompt is simply ignored.

use std::cell::RefCell;
use std::rc::Rc;

/// Identifies one shown prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AckToken(pub u64);

impl AckToken {
    /// The token after this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Modal message channel
pub trait UserPrompt {
    /// Show a message; the host returns `ack` when it is dismissed
    fn show(&mut self, title: &str, body: &str, ack: AckToken);
}

/// Pure-output HUD hooks
pub trait HudSink {
    /// Whole seconds of dwell left, or `None` to hide the countdown
    fn dwell_countdown(&mut self, seconds: Option<u32>);

    /// Seconds left on the level timer, or `None` to hide it
    fn timer_text(&mut self, seconds: Option<u32>);
}

/// HUD that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHud;

impl HudSink for NullHud {
    fn dwell_countdown(&mut self, _seconds: Option<u32>) {}
    fn timer_text(&mut self, _seconds: Option<u32>) {}
}

/// A prompt as it was shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownPrompt {
    /// Title line
    pub title: String,
    /// Message body
    pub body: String,
    /// Token to acknowledge it with
    pub ack: AckToken,
}

/// Prompt that records what was shown
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct PromptLog {
    shown: Rc<RefCell<Vec<ShownPrompt>>>,
}

impl PromptLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Every prompt shown so far, oldest first
    pub fn shown(&self) -> Vec<ShownPrompt> {
        self.shown.borrow().clone()
    }

    /// The most recent prompt
    pub fn last(&self) -> Option<ShownPrompt> {
        self.shown.borrow().last().cloned()
    }

    /// Number of prompts shown
    pub fn len(&self) -> usize {
        self.shown.borrow().len()
    }

    /// True if nothing has been shown
    pub fn is_empty(&self) -> bool {
        self.shown.borrow().is_empty()
    }
}

impl UserPrompt for PromptLog {
    fn show(&mut self, title: &str, body: &str, ack: AckToken) {
        log::info!("Prompt: {title} - {body}");
        self.shown.borrow_mut().push(ShownPrompt {
            title: title.to_owned(),
            body: body.to_owned(),
            ack,
        });
    }
}

/// HUD that keeps the latest value of each hook
#[derive(Debug, Clone, Default)]
pub struct HudSnapshot {
    state: Rc<RefCell<(Option<u32>, Option<u32>)>>,
}

impl HudSnapshot {
    /// Create a blank HUD
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest dwell countdown
    pub fn dwell(&self) -> Option<u32> {
        self.state.borrow().0
    }

    /// Latest timer value
    pub fn timer(&self) -> Option<u32> {
        self.state.borrow().1
    }
}

impl HudSink for HudSnapshot {
    fn dwell_countdown(&mut self, seconds: Option<u32>) {
        self.state.borrow_mut().0 = seconds;
    }

    fn timer_text(&mut self, seconds: Option<u32>) {
        self.state.borrow_mut().1 = seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_log_records_in_order() {
        let log = PromptLog::new();
        let mut prompt: Box<dyn UserPrompt> = Box::new(log.clone());
        prompt.show("Level 1", "Park", AckToken(1));
        prompt.show("Done", "Well done", AckToken(2));

        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(|p| p.ack), Some(AckToken(2)));
        assert_eq!(log.shown()[0].title, "Level 1");
    }

    #[test]
    fn test_hud_snapshot_keeps_latest() {
        let hud = HudSnapshot::new();
        let mut sink = hud.clone();
        sink.dwell_countdown(Some(3));
        sink.timer_text(Some(59));
        sink.dwell_countdown(None);

        assert_eq!(hud.dwell(), None);
        assert_eq!(hud.timer(), Some(59));
    }

    #[test]
    fn test_ack_tokens_advance() {
        assert_eq!(AckToken(4).next(), AckToken(5));
    }
}
