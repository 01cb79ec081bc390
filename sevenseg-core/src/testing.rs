//! Test doubles for the hardware traits

extern crate std;

use core::cell::Cell;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use heapless::Vec;

use crate::frame::{Frame, MAX_DIGITS};
use crate::glyph::Polarity;
use crate::registry::TimerName;
use crate::traits::{DisplaySink, SinkError, TickKind, TickTimer, TimerError};

/// Timer service that records calls instead of ticking
#[derive(Debug, Default)]
pub struct MockTimer {
    /// Period of the running blink tick
    pub blink: Option<u32>,
    /// Period of the running wait tick
    pub wait: Option<u32>,
    /// Name passed to the last successful start
    pub last_name: TimerName,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub fail_set_period: bool,
    pub starts: u32,
    pub stops: u32,
}

impl MockTimer {
    fn slot(&mut self, kind: TickKind) -> &mut Option<u32> {
        match kind {
            TickKind::Blink => &mut self.blink,
            TickKind::Wait => &mut self.wait,
        }
    }
}

impl TickTimer for MockTimer {
    fn start(&mut self, kind: TickKind, name: &str, period_ms: u32) -> Result<(), TimerError> {
        if self.fail_start {
            return Err(TimerError::Start);
        }
        *self.slot(kind) = Some(period_ms);
        self.last_name = TimerName::try_from(name).unwrap_or_default();
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self, kind: TickKind) -> Result<(), TimerError> {
        if self.fail_stop {
            return Err(TimerError::Stop);
        }
        *self.slot(kind) = None;
        self.stops += 1;
        Ok(())
    }

    fn set_period(&mut self, kind: TickKind, period_ms: u32) -> Result<(), TimerError> {
        if self.fail_set_period {
            return Err(TimerError::ChangePeriod);
        }
        if let Some(period) = self.slot(kind) {
            *period = period_ms;
        }
        Ok(())
    }
}

/// Sink that keeps the frames it was given
#[derive(Debug)]
pub struct MockSink {
    pub digits: u8,
    pub polarity: Polarity,
    pub begun: bool,
    /// Last frame passed to `refresh`
    pub refreshed: Option<Frame>,
    /// Last frame passed to `frame_changed`
    pub changed: Option<Frame>,
    pub changes: u32,
    pub order: Option<Vec<u8, MAX_DIGITS>>,
}

impl MockSink {
    pub fn new(digits: u8) -> Self {
        Self::with_polarity(digits, Polarity::CommonAnode)
    }

    pub fn with_polarity(digits: u8, polarity: Polarity) -> Self {
        Self {
            digits,
            polarity,
            begun: false,
            refreshed: None,
            changed: None,
            changes: 0,
            order: None,
        }
    }
}

impl DisplaySink for MockSink {
    fn digit_count(&self) -> u8 {
        self.digits
    }

    fn polarity(&self) -> Polarity {
        self.polarity
    }

    fn begin(&mut self, _refresh_hint_ms: u32) -> Result<(), SinkError> {
        self.begun = true;
        Ok(())
    }

    fn end(&mut self) -> Result<(), SinkError> {
        self.begun = false;
        Ok(())
    }

    fn refresh(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        self.refreshed = Frame::from_slice(frame).ok();
        Ok(())
    }

    fn frame_changed(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        self.changed = Frame::from_slice(frame).ok();
        self.changes += 1;
        Ok(())
    }

    fn set_digit_order(&mut self, order: &[u8]) -> Result<(), SinkError> {
        if order.len() != self.digits as usize || order.iter().any(|&p| p >= self.digits) {
            return Err(SinkError::InvalidOrder);
        }
        self.order = Vec::from_slice(order).ok();
        Ok(())
    }
}

std::thread_local! {
    static STALL: Cell<Option<Duration>> = const { Cell::new(None) };
}

/// Critical-section mutex that can hold a thread back before it locks
pub struct StallingRawMutex(CriticalSectionRawMutex);

impl StallingRawMutex {
    /// Make the next lock taken by this thread sleep `delay` first
    pub fn stall_next_lock(delay: Duration) {
        STALL.with(|stall| stall.set(Some(delay)));
    }
}

// SAFETY: mutual exclusion comes from the wrapped mutex
#[allow(unsafe_code)]
unsafe impl RawMutex for StallingRawMutex {
    const INIT: Self = Self(CriticalSectionRawMutex::new());

    fn lock<R>(&self, f: impl FnOnce() -> R) -> R {
        if let Some(delay) = STALL.with(Cell::take) {
            std::thread::sleep(delay);
        }
        self.0.lock(f)
    }
}
