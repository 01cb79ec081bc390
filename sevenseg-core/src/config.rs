//! Display configuration
//!
//! Timing defaults for the presentation modes. A config is applied once when
//! the display is built; the individual setters on
//! [`SevenSegDisplay`](crate::SevenSegDisplay) change values at runtime.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::DisplayError;

/// Shortest accepted blink or wait rate
pub const MIN_RATE_MS: u32 = 100;

/// Longest accepted blink or wait rate
pub const MAX_RATE_MS: u32 = 2000;

/// Default blink on and off time
pub const DEFAULT_BLINK_MS: u32 = 500;

/// Default wait animation step time
pub const DEFAULT_WAIT_MS: u32 = 250;

/// Default wait animation character
pub const DEFAULT_WAIT_CHAR: char = '-';

/// Check a rate against the accepted window
pub fn rate_in_window(rate_ms: u32) -> bool {
    (MIN_RATE_MS..=MAX_RATE_MS).contains(&rate_ms)
}

/// Presentation timing for one display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Blink on time (ms)
    pub blink_on_ms: u32,
    /// Blink off time (ms), 0 for the on time
    pub blink_off_ms: u32,
    /// Wait animation step time (ms)
    pub wait_rate_ms: u32,
    /// Character drawn by the wait animation
    pub wait_char: char,
    /// Refresh period handed to the sink, 0 for its default
    pub refresh_hint_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            blink_on_ms: DEFAULT_BLINK_MS,
            blink_off_ms: DEFAULT_BLINK_MS,
            wait_rate_ms: DEFAULT_WAIT_MS,
            wait_char: DEFAULT_WAIT_CHAR,
            refresh_hint_ms: 0,
        }
    }
}

impl DisplayConfig {
    /// Blink off time with the symmetric default resolved
    pub fn effective_blink_off_ms(&self) -> u32 {
        if self.blink_off_ms == 0 {
            self.blink_on_ms
        } else {
            self.blink_off_ms
        }
    }

    /// Check every rate against the accepted window
    pub fn validate(&self) -> Result<(), DisplayError> {
        if !rate_in_window(self.blink_on_ms)
            || !rate_in_window(self.effective_blink_off_ms())
            || !rate_in_window(self.wait_rate_ms)
        {
            return Err(DisplayError::RateOutOfRange);
        }
        Ok(())
    }
}
