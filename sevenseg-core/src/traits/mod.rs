//! Hardware abstraction traits
//!
//! These traits define the interface between the display engine and the
//! board: the sink that drives the LED wires and the timer service that
//! paces blinking and the wait animation.

pub mod sink;
pub mod timer;

pub use sink::{DisplaySink, SinkError};
pub use timer::{TickKind, TickTimer, TimerError};
