//! Inter-task communication signals
//!
//! One command signal per periodic tick. The display's timer handle writes
//! them; the matching tick task reads them.

use crate::timer::TickSignal;

/// Commands for the blink tick task
pub static BLINK_CMD: TickSignal = TickSignal::new();

/// Commands for the wait tick task
pub static WAIT_CMD: TickSignal = TickSignal::new();
