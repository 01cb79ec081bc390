//! Display error type

use crate::traits::{SinkError, TimerError};

/// Errors reported by display operations
///
/// Input errors clear the display before they are returned, so stale or
/// partial content is never shown. Timer and sink errors leave the buffer
/// as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Character has no segment representation
    InvalidCharacter(char),
    /// Content needs more digits than the display has
    TooLong,
    /// Numeric value outside the displayable range
    OutOfRange,
    /// More decimal places requested than digits available
    TooManyDecimals,
    /// Digit position outside `0..digits`
    InvalidPosition,
    /// Gauge level outside its valid range
    InvalidLevel,
    /// Operation needs a wider display
    TooFewDigits,
    /// Blink mask length differs from the digit count
    MaskLength,
    /// Digit count is zero or above [`crate::MAX_DIGITS`]
    UnsupportedDigits,
    /// Rate outside `MIN_RATE_MS..=MAX_RATE_MS`
    RateOutOfRange,
    /// Request conflicts with the active presentation mode
    ModeConflict,
    /// All registry slots are taken
    RegistryFull,
    /// Timer service failure
    Timer(TimerError),
    /// Hardware sink failure
    Sink(SinkError),
}

impl DisplayError {
    /// Check if this error is caused by the requested content itself
    ///
    /// These are the errors that leave the display cleared.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DisplayError::InvalidCharacter(_)
                | DisplayError::TooLong
                | DisplayError::OutOfRange
                | DisplayError::TooManyDecimals
                | DisplayError::InvalidLevel
                | DisplayError::TooFewDigits
        )
    }
}

impl From<TimerError> for DisplayError {
    fn from(e: TimerError) -> Self {
        DisplayError::Timer(e)
    }
}

impl From<SinkError> for DisplayError {
    fn from(e: SinkError) -> Self {
        DisplayError::Sink(e)
    }
}
