//! Tally counter
//!
//! Keeps an integer count and shows it on a borrowed display after every
//! change. Counts that would leave the display's value range are refused
//! and the previous count stays visible.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::display::SevenSegDisplay;
use crate::error::DisplayError;
use crate::traits::{DisplaySink, TickTimer};

/// Click counter on top of a display
pub struct ClickCounter<'d, 'r, M, SM, S, T>
where
    M: RawMutex,
    SM: RawMutex,
    S: DisplaySink,
    T: TickTimer,
{
    display: &'d SevenSegDisplay<'r, M, SM, S, T>,
    count: i32,
    start_value: i32,
    right_align: bool,
    zero_pad: bool,
}

impl<'d, 'r, M, SM, S, T> ClickCounter<'d, 'r, M, SM, S, T>
where
    M: RawMutex,
    SM: RawMutex,
    S: DisplaySink,
    T: TickTimer,
{
    /// Right-aligned, space-padded counter starting at 0
    pub fn new(display: &'d SevenSegDisplay<'r, M, SM, S, T>) -> Self {
        Self::with_format(display, true, false)
    }

    pub fn with_format(
        display: &'d SevenSegDisplay<'r, M, SM, S, T>,
        right_align: bool,
        zero_pad: bool,
    ) -> Self {
        Self {
            display,
            count: 0,
            start_value: 0,
            right_align,
            zero_pad,
        }
    }

    /// Set the start value and show it
    pub fn count_begin(&mut self, start_value: i32) -> Result<(), DisplayError> {
        self.count_restart(start_value)?;
        self.start_value = start_value;
        Ok(())
    }

    /// Jump to `value` without changing the start value
    pub fn count_restart(&mut self, value: i32) -> Result<(), DisplayError> {
        self.set(value as i64)
    }

    /// Return to the start value
    pub fn count_reset(&mut self) -> Result<(), DisplayError> {
        self.count_restart(self.start_value)
    }

    /// Add `qty`; the sign of `qty` is ignored
    pub fn count_up(&mut self, qty: i32) -> Result<(), DisplayError> {
        self.set(self.count as i64 + qty.unsigned_abs() as i64)
    }

    /// Subtract `qty`; the sign of `qty` is ignored
    pub fn count_down(&mut self, qty: i32) -> Result<(), DisplayError> {
        self.set(self.count as i64 - qty.unsigned_abs() as i64)
    }

    /// Move toward zero by `qty`, stopping at zero
    ///
    /// A count already at zero has nowhere to go and is refused with
    /// [`DisplayError::OutOfRange`].
    pub fn count_to_zero(&mut self, qty: i32) -> Result<(), DisplayError> {
        if self.count == 0 {
            return Err(DisplayError::OutOfRange);
        }
        let step = (qty.unsigned_abs() as i64).min(self.count.unsigned_abs() as i64);
        let next = if self.count > 0 {
            self.count as i64 - step
        } else {
            self.count as i64 + step
        };
        self.set(next)
    }

    /// Current count
    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn start_value(&self) -> i32 {
        self.start_value
    }

    /// Show the count again, e.g. after other content replaced it
    pub fn update_display(&self) -> Result<(), DisplayError> {
        self.display
            .print_int(self.count, self.right_align, self.zero_pad)
    }

    pub fn blink(&self) -> Result<(), DisplayError> {
        self.display.blink()
    }

    pub fn blink_with(&self, on_ms: u32, off_ms: u32) -> Result<(), DisplayError> {
        self.display.blink_with(on_ms, off_ms)
    }

    pub fn no_blink(&self) -> Result<(), DisplayError> {
        self.display.no_blink()
    }

    pub fn set_blink_rate(&self, on_ms: u32, off_ms: u32) -> Result<(), DisplayError> {
        self.display.set_blink_rate(on_ms, off_ms)
    }

    pub fn clear(&self) {
        self.display.clear();
    }

    fn set(&mut self, value: i64) -> Result<(), DisplayError> {
        let range = self.display.value_min() as i64..=self.display.value_max() as i64;
        if !range.contains(&value) {
            #[cfg(feature = "defmt")]
            defmt::debug!("counter: {} outside display range", value);
            return Err(DisplayError::OutOfRange);
        }

        self.count = value as i32;
        self.update_display()
    }
}
