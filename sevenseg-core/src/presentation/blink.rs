//! Blink oscillator
//!
//! A single periodic tick drives both halves of the blink cycle. Its period
//! is the greatest common divisor of the on and off times, and each half
//! ends once the elapsed time since it started reaches its duration, so a
//! half can overrun by up to one tick period.

use crate::config::{rate_in_window, DEFAULT_BLINK_MS};
use crate::error::DisplayError;
use crate::frame::Frame;

/// Tick period serving both blink halves
///
/// A zero input degenerates to a 1 ms tick.
pub fn tick_period_ms(on_ms: u32, off_ms: u32) -> u32 {
    if on_ms == 0 || off_ms == 0 {
        return 1;
    }

    let (mut a, mut b) = (on_ms, off_ms);
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// On/off times of the blink effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkTiming {
    on_ms: u32,
    off_ms: u32,
    tick_ms: u32,
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self {
            on_ms: DEFAULT_BLINK_MS,
            off_ms: DEFAULT_BLINK_MS,
            tick_ms: DEFAULT_BLINK_MS,
        }
    }
}

impl BlinkTiming {
    /// Validate a pair of rates
    ///
    /// `off_ms == 0` means the same as `on_ms`.
    pub fn new(on_ms: u32, off_ms: u32) -> Result<Self, DisplayError> {
        let off_ms = if off_ms == 0 { on_ms } else { off_ms };
        if !rate_in_window(on_ms) || !rate_in_window(off_ms) {
            return Err(DisplayError::RateOutOfRange);
        }

        Ok(Self {
            on_ms,
            off_ms,
            tick_ms: tick_period_ms(on_ms, off_ms),
        })
    }

    /// Time the content is shown (ms)
    pub fn on_ms(&self) -> u32 {
        self.on_ms
    }

    /// Time the content is hidden (ms)
    pub fn off_ms(&self) -> u32 {
        self.off_ms
    }

    /// Period of the shared tick (ms)
    pub fn tick_ms(&self) -> u32 {
        self.tick_ms
    }
}

/// Live state of a running blink
#[derive(Debug, Clone)]
pub(crate) struct BlinkCycle {
    /// Content restored at the start of each on half
    pub(crate) saved: Frame,
    /// True during the on half
    showing: bool,
    /// Start of the current half, `None` until its first tick
    since: Option<u64>,
}

impl BlinkCycle {
    pub(crate) fn new(saved: Frame) -> Self {
        Self {
            saved,
            showing: false,
            since: None,
        }
    }

    /// Adopt new content and restart from the off-pending half
    pub(crate) fn restart_with(&mut self, content: &Frame) {
        self.saved.clone_from(content);
        self.restart();
    }

    pub(crate) fn restart(&mut self) {
        self.showing = false;
        self.since = None;
    }

    /// Advance the oscillator, returns true if `frame` was rewritten
    pub(crate) fn tick(
        &mut self,
        now_ms: u64,
        frame: &mut Frame,
        mask: &[bool],
        space: u8,
        timing: &BlinkTiming,
    ) -> bool {
        match (self.showing, self.since) {
            (false, None) => {
                self.saved.clone_from(frame);
                for (digit, &blinks) in frame.iter_mut().zip(mask) {
                    if blinks {
                        *digit = space;
                    }
                }
                self.since = Some(now_ms);
                true
            }
            (false, Some(start)) => {
                if now_ms.saturating_sub(start) >= timing.off_ms as u64 {
                    self.showing = true;
                    self.since = None;
                }
                false
            }
            (true, None) => {
                frame.clone_from(&self.saved);
                self.since = Some(now_ms);
                true
            }
            (true, Some(start)) => {
                if now_ms.saturating_sub(start) >= timing.on_ms as u64 {
                    self.showing = false;
                    self.since = None;
                }
                false
            }
        }
    }
}
