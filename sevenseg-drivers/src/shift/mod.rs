//! 74HC595 shift register sinks
//!
//! Both module types use the same three-wire bus: serial data, shift clock
//! (SCLK/SRCLK) and latch clock (RCLK). Bits are shifted MSB first; the
//! first byte of a transfer ends up in the register farthest from the MCU.

pub mod dynamic;
pub mod static_chain;

pub use dynamic::Hc595Dynamic;
pub use static_chain::Hc595Static;

use embedded_hal::digital::{OutputPin, PinState};
use sevenseg_core::SinkError;

fn bus_error<E>(_: E) -> SinkError {
    SinkError::Bus
}

/// Bit-banged 74HC595 bus
pub struct ShiftOut<D, C, L> {
    data: D,
    clock: C,
    latch: L,
}

impl<D, C, L> ShiftOut<D, C, L>
where
    D: OutputPin,
    C: OutputPin,
    L: OutputPin,
{
    /// Take the pins and park the bus: latch high, clock low
    pub fn new(data: D, clock: C, latch: L) -> Result<Self, SinkError> {
        let mut bus = Self { data, clock, latch };
        bus.latch.set_high().map_err(bus_error)?;
        bus.clock.set_low().map_err(bus_error)?;
        Ok(bus)
    }

    /// Shift `bytes` into the chain and latch them onto the outputs
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.latch.set_low().map_err(bus_error)?;
        for &byte in bytes {
            self.shift_byte(byte)?;
        }
        self.latch.set_high().map_err(bus_error)
    }

    fn shift_byte(&mut self, byte: u8) -> Result<(), SinkError> {
        for bit in (0..8).rev() {
            let level = PinState::from(byte & (1 << bit) != 0);
            self.data.set_state(level).map_err(bus_error)?;
            // Data is sampled on the rising edge
            self.clock.set_high().map_err(bus_error)?;
            self.clock.set_low().map_err(bus_error)?;
        }
        Ok(())
    }

    /// Give the pins back
    pub fn release(self) -> (D, C, L) {
        (self.data, self.clock, self.latch)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    extern crate std;

    use core::cell::RefCell;
    use core::convert::Infallible;
    use std::rc::Rc;
    use std::vec::Vec;

    use embedded_hal::digital::{ErrorType, OutputPin};

    use super::ShiftOut;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Wire {
        Data(bool),
        Clock(bool),
        Latch(bool),
    }

    pub type Log = Rc<RefCell<Vec<Wire>>>;

    pub struct MockPin {
        log: Log,
        wire: fn(bool) -> Wire,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.wire)(false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.wire)(true));
            Ok(())
        }
    }

    /// Bus on mock pins sharing one log
    pub fn bus() -> (ShiftOut<MockPin, MockPin, MockPin>, Log) {
        let log = Log::default();
        let pin = |wire: fn(bool) -> Wire| MockPin {
            log: log.clone(),
            wire,
        };
        let bus = ShiftOut::new(pin(Wire::Data), pin(Wire::Clock), pin(Wire::Latch)).unwrap();
        log.borrow_mut().clear();
        (bus, log)
    }

    /// Decode the log into latched transfers
    pub fn transfers(log: &Log) -> Vec<Vec<u8>> {
        let mut transfers = Vec::new();
        let mut bytes = Vec::new();
        let mut data = false;
        let mut current = 0u8;
        let mut bits = 0;

        for wire in log.borrow().iter() {
            match *wire {
                Wire::Data(level) => data = level,
                Wire::Clock(true) => {
                    current = (current << 1) | data as u8;
                    bits += 1;
                    if bits == 8 {
                        bytes.push(current);
                        current = 0;
                        bits = 0;
                    }
                }
                Wire::Clock(false) => {}
                Wire::Latch(false) => bytes.clear(),
                Wire::Latch(true) => transfers.push(core::mem::take(&mut bytes)),
            }
        }
        transfers
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::mock::{bus, transfers, Wire};
    use std::vec;

    #[test]
    fn test_shift_msb_first() {
        let (mut bus, log) = bus();
        bus.send(&[0b1000_0001]).unwrap();

        let wires = log.borrow();
        assert_eq!(wires.first(), Some(&Wire::Latch(false)));
        assert_eq!(wires.get(1), Some(&Wire::Data(true)));
        assert_eq!(wires.get(4), Some(&Wire::Data(false)));
        assert_eq!(wires.last(), Some(&Wire::Latch(true)));
    }

    #[test]
    fn test_multi_byte_transfer() {
        let (mut bus, log) = bus();
        bus.send(&[0xC0, 0x01]).unwrap();
        bus.send(&[0xA5]).unwrap();

        assert_eq!(transfers(&log), vec![vec![0xC0, 0x01], vec![0xA5]]);
    }
}
