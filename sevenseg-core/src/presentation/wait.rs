//! Wait animation
//!
//! A busy indicator that fills the display from the left with the wait
//! glyph, one digit per step, then starts over from an empty display.

use crate::frame::Frame;

/// Live state of a running wait animation
#[derive(Debug, Clone)]
pub(crate) struct WaitCycle {
    /// Content restored when the animation ends
    pub(crate) saved: Frame,
    /// Digits lit by the next step, `0..=digits`
    step: u8,
    /// Time of the last step, `None` until the first tick
    since: Option<u64>,
}

impl WaitCycle {
    pub(crate) fn new(saved: Frame) -> Self {
        Self {
            saved,
            step: 0,
            since: None,
        }
    }

    pub(crate) fn step(&self) -> u8 {
        self.step
    }

    /// Advance the animation, returns true if `frame` was rewritten
    ///
    /// The first tick clears the display; each later tick at least
    /// `rate_ms` after the previous step draws the next one.
    pub(crate) fn tick(
        &mut self,
        now_ms: u64,
        frame: &mut Frame,
        space: u8,
        glyph: u8,
        rate_ms: u32,
    ) -> bool {
        match self.since {
            None => {
                frame.iter_mut().for_each(|digit| *digit = space);
                self.since = Some(now_ms);
                true
            }
            Some(last) if now_ms.saturating_sub(last) >= rate_ms as u64 => {
                for (position, digit) in frame.iter_mut().enumerate() {
                    *digit = if position < self.step as usize {
                        glyph
                    } else {
                        space
                    };
                }
                self.step += 1;
                if self.step as usize > frame.len() {
                    self.step = 0;
                }
                self.since = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }
}
