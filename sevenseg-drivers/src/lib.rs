//! Hardware sink implementations
//!
//! This crate provides concrete implementations of the
//! [`DisplaySink`](sevenseg_core::DisplaySink) trait for common
//! seven-segment display modules:
//!
//! - 74HC595 multiplexed modules (segment register + digit select register)
//! - 74HC595 latched chains (one register per digit)
//!
//! Pins are `embedded-hal` 1.0 digital outputs, so the same drivers run on
//! any HAL.

#![no_std]
#![deny(unsafe_code)]

pub mod shift;

pub use shift::{Hc595Dynamic, Hc595Static, ShiftOut};
