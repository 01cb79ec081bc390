//! Multiplexed 74HC595 module
//!
//! Two chained registers: the first byte selects the segments, the second
//! the digit. Only one digit is lit at a time, so the module must be
//! refreshed continuously. Each pass sends every digit once and starts one
//! digit later than the previous pass, which spreads the extra on-time of
//! the last digit sent evenly over all digits.

use embedded_hal::digital::OutputPin;
use sevenseg_core::{DigitOrder, DisplaySink, Polarity, SinkError};

use super::ShiftOut;

/// Per-digit refresh rate the default period aims for (Hz)
const DIGIT_REFRESH_HZ: u32 = 30;

/// Default refresh period for a module with `digits` digits
pub fn default_period_ms(digits: u8) -> u32 {
    (1000 / (DIGIT_REFRESH_HZ * digits.max(1) as u32)).max(1)
}

/// Multiplexed module on a 74HC595 pair
pub struct Hc595Dynamic<D, C, L> {
    bus: ShiftOut<D, C, L>,
    digits: u8,
    polarity: Polarity,
    order: DigitOrder,
    /// Position sent first on the next pass
    first: u8,
    period_ms: u32,
    running: bool,
}

impl<D, C, L> Hc595Dynamic<D, C, L>
where
    D: OutputPin,
    C: OutputPin,
    L: OutputPin,
{
    pub fn new(bus: ShiftOut<D, C, L>, digits: u8, polarity: Polarity) -> Self {
        Self {
            bus,
            digits,
            polarity,
            order: DigitOrder::identity(digits),
            first: 0,
            period_ms: default_period_ms(digits),
            running: false,
        }
    }

    /// Check if `begin` was called without a matching `end`
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Give the bus back
    pub fn release(self) -> ShiftOut<D, C, L> {
        self.bus
    }
}

impl<D, C, L> DisplaySink for Hc595Dynamic<D, C, L>
where
    D: OutputPin,
    C: OutputPin,
    L: OutputPin,
{
    fn digit_count(&self) -> u8 {
        self.digits
    }

    fn polarity(&self) -> Polarity {
        self.polarity
    }

    fn begin(&mut self, refresh_hint_ms: u32) -> Result<(), SinkError> {
        self.period_ms = if refresh_hint_ms > 0 {
            refresh_hint_ms
        } else {
            default_period_ms(self.digits)
        };
        self.first = 0;
        self.running = true;

        #[cfg(feature = "defmt")]
        defmt::debug!("hc595 dynamic: refresh every {} ms", self.period_ms);
        Ok(())
    }

    fn end(&mut self) -> Result<(), SinkError> {
        self.running = false;
        // No digit selected
        self.bus.send(&[self.polarity.adjust(0xFF), 0x00])
    }

    fn refresh(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        let count = frame.len().min(self.digits as usize);
        if !self.running || count == 0 {
            return Ok(());
        }

        for k in 0..count {
            let position = (self.first as usize + k) % count;
            let select = 1u8 << self.order.port(position);
            self.bus.send(&[frame[position], select])?;
        }
        self.first = ((self.first as usize + 1) % count) as u8;
        Ok(())
    }

    fn refresh_period_ms(&self) -> Option<u32> {
        Some(self.period_ms)
    }

    fn set_digit_order(&mut self, order: &[u8]) -> Result<(), SinkError> {
        self.order = DigitOrder::from_ports(order, self.digits).ok_or(SinkError::InvalidOrder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::shift::mock::{bus, transfers, MockPin};
    use std::vec;

    fn sink(digits: u8) -> (Hc595Dynamic<MockPin, MockPin, MockPin>, crate::shift::mock::Log) {
        let (bus, log) = bus();
        (Hc595Dynamic::new(bus, digits, Polarity::CommonAnode), log)
    }

    #[test]
    fn test_default_period() {
        assert_eq!(default_period_ms(4), 8);
        assert_eq!(default_period_ms(8), 4);
        assert_eq!(default_period_ms(1), 33);
        assert_eq!(default_period_ms(0), 33);
    }

    #[test]
    fn test_refresh_hint() {
        let (mut sink, _log) = sink(4);
        sink.begin(0).unwrap();
        assert_eq!(sink.refresh_period_ms(), Some(8));
        sink.begin(3).unwrap();
        assert_eq!(sink.refresh_period_ms(), Some(3));
    }

    #[test]
    fn test_idle_until_begin() {
        let (mut sink, log) = sink(4);
        sink.refresh(&[0xC0; 4]).unwrap();
        assert!(transfers(&log).is_empty());
    }

    #[test]
    fn test_refresh_rotates_first_digit() {
        let (mut sink, log) = sink(3);
        sink.begin(0).unwrap();

        sink.refresh(&[0xA0, 0xB0, 0xC0]).unwrap();
        sink.refresh(&[0xA0, 0xB0, 0xC0]).unwrap();

        assert_eq!(
            transfers(&log),
            vec![
                vec![0xA0, 0x01],
                vec![0xB0, 0x02],
                vec![0xC0, 0x04],
                vec![0xB0, 0x02],
                vec![0xC0, 0x04],
                vec![0xA0, 0x01],
            ]
        );
    }

    #[test]
    fn test_digit_order_remaps_select() {
        let (mut sink, log) = sink(2);
        sink.set_digit_order(&[1, 0]).unwrap();
        sink.begin(0).unwrap();
        sink.refresh(&[0xA0, 0xB0]).unwrap();

        assert_eq!(transfers(&log), vec![vec![0xA0, 0x02], vec![0xB0, 0x01]]);
    }

    #[test]
    fn test_invalid_digit_order() {
        let (mut sink, _log) = sink(4);
        assert_eq!(sink.set_digit_order(&[0, 1, 2, 4]), Err(SinkError::InvalidOrder));
        assert_eq!(sink.set_digit_order(&[0, 1]), Err(SinkError::InvalidOrder));
    }

    #[test]
    fn test_end_blanks_module() {
        let (mut sink, log) = sink(4);
        sink.begin(0).unwrap();
        sink.end().unwrap();

        assert!(!sink.is_running());
        assert_eq!(transfers(&log), vec![vec![0xFF, 0x00]]);
    }
}
