//! Display buffer types
//!
//! A [`Frame`] holds one segment mask per digit in the sink's native
//! polarity. Position 0 is the leftmost digit.

use heapless::Vec;

use crate::error::DisplayError;

/// Maximum digits per display
pub const MAX_DIGITS: usize = 8;

/// Segment masks, one per digit
pub type Frame = Vec<u8, MAX_DIGITS>;

/// Build a frame with every digit set to `mask`
pub fn filled(digits: u8, mask: u8) -> Frame {
    let mut frame = Frame::new();
    for _ in 0..digits.min(MAX_DIGITS as u8) {
        // Capacity checked by the bound above
        let _ = frame.push(mask);
    }
    frame
}

/// Value range derived from the digit count
///
/// Fixed at construction; the digit count of a display never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    digits: u8,
    value_min: i32,
    value_max: i32,
}

impl Geometry {
    /// Derive the value range for a display
    pub fn new(digits: u8) -> Result<Self, DisplayError> {
        if digits == 0 || digits as usize > MAX_DIGITS {
            return Err(DisplayError::UnsupportedDigits);
        }

        let value_max = 10i32.pow(digits as u32) - 1;
        // One digit is kept for the sign
        let value_min = -(10i32.pow(digits as u32 - 1) - 1);

        Ok(Self {
            digits,
            value_min,
            value_max,
        })
    }

    /// Number of digit positions
    pub fn digits(&self) -> u8 {
        self.digits
    }

    /// Smallest displayable integer
    pub fn value_min(&self) -> i32 {
        self.value_min
    }

    /// Largest displayable integer
    pub fn value_max(&self) -> i32 {
        self.value_max
    }

    /// Check if an integer fits the display
    pub fn contains(&self, value: i32) -> bool {
        (self.value_min..=self.value_max).contains(&value)
    }
}

/// Logical to physical digit mapping
///
/// Entry `i` is the physical port that shows logical position `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitOrder {
    ports: Vec<u8, MAX_DIGITS>,
}

impl DigitOrder {
    /// Identity mapping for `digits` positions
    pub fn identity(digits: u8) -> Self {
        let mut ports = Vec::new();
        for port in 0..digits.min(MAX_DIGITS as u8) {
            let _ = ports.push(port);
        }
        Self { ports }
    }

    /// Build a mapping, rejecting entries outside `0..digits`
    ///
    /// Returns `None` if the table length differs from `digits` or any
    /// port is out of range.
    pub fn from_ports(ports: &[u8], digits: u8) -> Option<Self> {
        if ports.len() != digits as usize || ports.iter().any(|&p| p >= digits) {
            return None;
        }
        Vec::from_slice(ports).ok().map(|ports| Self { ports })
    }

    /// Physical port for a logical position
    pub fn port(&self, position: usize) -> u8 {
        self.ports.get(position).copied().unwrap_or(position as u8)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Check if the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}
