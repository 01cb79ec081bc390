//! Latched 74HC595 chain
//!
//! One register per digit, so each digit holds its segments without
//! refreshing. The chain is rewritten only when the content changes.

use embedded_hal::digital::OutputPin;
use heapless::Vec;
use sevenseg_core::{DigitOrder, DisplaySink, Polarity, SinkError, MAX_DIGITS};

use super::ShiftOut;

/// Chain of 74HC595 registers, port 0 nearest the MCU
pub struct Hc595Static<D, C, L> {
    bus: ShiftOut<D, C, L>,
    digits: u8,
    polarity: Polarity,
    order: DigitOrder,
    running: bool,
}

impl<D, C, L> Hc595Static<D, C, L>
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
            running: false,
        }
    }

    fn push(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        let blank = self.polarity.adjust(0xFF);
        let mut ports: Vec<u8, MAX_DIGITS> = Vec::new();
        for _ in 0..self.digits.min(MAX_DIGITS as u8) {
            let _ = ports.push(blank);
        }
        for (position, &mask) in frame.iter().enumerate().take(ports.len()) {
            if let Some(port) = ports.get_mut(self.order.port(position) as usize) {
                *port = mask;
            }
        }

        // Farthest register first
        ports.reverse();
        self.bus.send(&ports)
    }
}

impl<D, C, L> DisplaySink for Hc595Static<D, C, L>
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

    fn begin(&mut self, _refresh_hint_ms: u32) -> Result<(), SinkError> {
        self.running = true;
        Ok(())
    }

    fn end(&mut self) -> Result<(), SinkError> {
        self.running = false;
        self.push(&[])
    }

    fn refresh(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        if self.running {
            self.push(frame)?;
        }
        Ok(())
    }

    fn frame_changed(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        self.refresh(frame)
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
    use crate::shift::mock::{bus, transfers};
    use std::vec;

    #[test]
    fn test_push_on_change() {
        let (bus, log) = bus();
        let mut sink = Hc595Static::new(bus, 3, Polarity::CommonAnode);
        sink.begin(0).unwrap();

        sink.frame_changed(&[0xA0, 0xB0, 0xC0]).unwrap();
        assert_eq!(transfers(&log), vec![vec![0xC0, 0xB0, 0xA0]]);
        assert_eq!(sink.refresh_period_ms(), None);
    }

    #[test]
    fn test_digit_order() {
        let (bus, log) = bus();
        let mut sink = Hc595Static::new(bus, 3, Polarity::CommonAnode);
        sink.set_digit_order(&[2, 0, 1]).unwrap();
        sink.begin(0).unwrap();

        sink.frame_changed(&[0xA0, 0xB0, 0xC0]).unwrap();
        // Ports 0, 1, 2 show B, C, A
        assert_eq!(transfers(&log), vec![vec![0xA0, 0xC0, 0xB0]]);
    }

    #[test]
    fn test_end_blanks_chain() {
        let (bus, log) = bus();
        let mut sink = Hc595Static::new(bus, 2, Polarity::CommonCathode);
        sink.begin(0).unwrap();
        sink.end().unwrap();
        sink.frame_changed(&[0x06, 0x06]).unwrap();

        assert_eq!(transfers(&log), vec![vec![0x00, 0x00]]);
    }
}
