//! Display sink trait
//!
//! One implementation per display technology (multiplexed shift registers,
//! latched shift registers, serial driver chips).

use crate::glyph::Polarity;

/// Errors reported by a display sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    /// Pin or bus write failed
    Bus,
    /// Digit order table rejected
    InvalidOrder,
    /// Operation not provided by this hardware
    Unsupported,
}

/// Hardware that puts a frame on the LED wires
///
/// The display never hands out its buffer. Each refresh pass receives a
/// consistent copy of the frame taken under the display lock, so the sink
/// can take as long as the wire protocol needs.
pub trait DisplaySink {
    /// Number of digits wired to this sink
    fn digit_count(&self) -> u8;

    /// Segment wiring, read once when the display is built
    fn polarity(&self) -> Polarity;

    /// Start whatever keeps the digits lit
    ///
    /// - `refresh_hint_ms`: requested refresh period, 0 for the sink default
    fn begin(&mut self, refresh_hint_ms: u32) -> Result<(), SinkError> {
        let _ = refresh_hint_ms;
        Ok(())
    }

    /// Stop refreshing
    fn end(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Run one refresh pass over `frame`
    fn refresh(&mut self, frame: &[u8]) -> Result<(), SinkError>;

    /// Notification that the display content changed
    ///
    /// Latched sinks push the new frame here; multiplexed sinks pick it up
    /// on their next refresh pass.
    fn frame_changed(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        let _ = frame;
        Ok(())
    }

    /// Refresh period for multiplexed sinks, `None` if latched
    fn refresh_period_ms(&self) -> Option<u32> {
        None
    }

    /// Remap logical positions to physical ports
    ///
    /// Entry `i` is the port showing logical position `i`.
    fn set_digit_order(&mut self, order: &[u8]) -> Result<(), SinkError> {
        let _ = order;
        Err(SinkError::Unsupported)
    }
}
