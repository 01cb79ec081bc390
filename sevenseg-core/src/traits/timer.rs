//! Tick timer trait
//!
//! The blink and wait effects are paced by periodic ticks from the board's
//! timer service. The service calls back into
//! [`SevenSegDisplay::blink_tick`](crate::SevenSegDisplay::blink_tick) or
//! [`SevenSegDisplay::wait_tick`](crate::SevenSegDisplay::wait_tick).

/// Which effect a periodic tick drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickKind {
    /// Blink on/off oscillator
    Blink,
    /// Wait (progress) animation
    Wait,
}

/// Timer service failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Timer could not be created
    Create,
    /// Timer could not be started
    Start,
    /// Timer could not be stopped
    Stop,
    /// Period could not be changed
    ChangePeriod,
}

/// Periodic timer service for one display
///
/// Calls may block briefly on the service's command queue but never on I/O.
pub trait TickTimer {
    /// Start a periodic tick
    ///
    /// - `name`: human-readable timer name, unique per display
    /// - `period_ms`: tick period in milliseconds
    fn start(&mut self, kind: TickKind, name: &str, period_ms: u32) -> Result<(), TimerError>;

    /// Stop a periodic tick
    ///
    /// Stopping a tick that is not running succeeds.
    fn stop(&mut self, kind: TickKind) -> Result<(), TimerError>;

    /// Change the period of a running tick
    fn set_period(&mut self, kind: TickKind, period_ms: u32) -> Result<(), TimerError>;
}
