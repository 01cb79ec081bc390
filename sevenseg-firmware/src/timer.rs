//! Tick timer service on embassy signals
//!
//! The display core asks for periodic ticks through [`TickTimer`]; this
//! implementation forwards each request to a tick task, which owns the
//! actual `Ticker`. A newer command replaces one the task has not picked up
//! yet, so the task always acts on the latest request.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use sevenseg_core::{TickKind, TickTimer, TimerError};

/// Request sent to a tick task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum TickCommand {
    /// Start ticking with the given period (ms)
    Start(u32),
    /// Keep ticking with a new period (ms)
    SetPeriod(u32),
    /// Stop ticking
    Stop,
}

pub type TickSignal = Signal<CriticalSectionRawMutex, TickCommand>;

/// Timer handle owned by one display
pub struct SignalTimer {
    blink: &'static TickSignal,
    wait: &'static TickSignal,
}

impl SignalTimer {
    pub fn new(blink: &'static TickSignal, wait: &'static TickSignal) -> Self {
        Self { blink, wait }
    }

    fn signal(&self, kind: TickKind) -> &'static TickSignal {
        match kind {
            TickKind::Blink => self.blink,
            TickKind::Wait => self.wait,
        }
    }
}

impl TickTimer for SignalTimer {
    fn start(&mut self, kind: TickKind, name: &str, period_ms: u32) -> Result<(), TimerError> {
        if period_ms == 0 {
            return Err(TimerError::Start);
        }
        debug!("{}: every {} ms", name, period_ms);
        self.signal(kind).signal(TickCommand::Start(period_ms));
        Ok(())
    }

    fn stop(&mut self, kind: TickKind) -> Result<(), TimerError> {
        self.signal(kind).signal(TickCommand::Stop);
        Ok(())
    }

    fn set_period(&mut self, kind: TickKind, period_ms: u32) -> Result<(), TimerError> {
        if period_ms == 0 {
            return Err(TimerError::ChangePeriod);
        }
        self.signal(kind).signal(TickCommand::SetPeriod(period_ms));
        Ok(())
    }
}
