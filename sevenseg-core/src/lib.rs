//! Board-agnostic core logic for seven-segment LED displays
//!
//! This crate contains everything that does not depend on the wiring of a
//! specific display module:
//!
//! - Hardware abstraction traits (display sink, tick timer)
//! - Glyph encoder (character to segment mask, polarity aware)
//! - Formatter for text, integers, decimals and bar gauges
//! - Presentation state machine (steady, blinking, waiting)
//! - Instance registry and the tally counter façade
//! - Configuration type definitions
//!
//! The display buffer is shared between application tasks and the timer
//! service; every access goes through a short `embassy-sync` blocking mutex
//! so the refresh path never sees a half-written frame.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod counter;
pub mod display;
pub mod error;
pub mod format;
pub mod frame;
pub mod glyph;
pub mod presentation;
pub mod registry;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DisplayConfig, MAX_RATE_MS, MIN_RATE_MS};
pub use counter::ClickCounter;
pub use display::SevenSegDisplay;
pub use error::DisplayError;
pub use frame::{DigitOrder, Frame, Geometry, MAX_DIGITS};
pub use glyph::{GlyphTable, Polarity};
pub use presentation::{BlinkTiming, PresentationMode};
pub use registry::{InstanceId, Registry, MAX_DISPLAYS};
pub use traits::{DisplaySink, SinkError, TickKind, TickTimer, TimerError};
