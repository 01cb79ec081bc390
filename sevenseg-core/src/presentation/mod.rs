//! Presentation state machine
//!
//! A display is in exactly one of three modes at a time:
//!
//! - **Steady**: the frame is shown as written
//! - **Blinking**: masked digits alternate between content and blank
//! - **Waiting**: a busy animation replaces the content
//!
//! Blinking and waiting both keep the content they interrupted inside the
//! mode itself and restore it when they end. Entering one mode ends the
//! other. Timer start failures leave everything as it was.

pub mod blink;
pub mod wait;

pub use blink::{tick_period_ms, BlinkTiming};

use heapless::Vec;

use crate::config::rate_in_window;
use crate::error::DisplayError;
use crate::frame::{filled, Frame, MAX_DIGITS};
use crate::registry::InstanceId;
use crate::traits::{TickKind, TickTimer, TimerError};

use blink::BlinkCycle;
use wait::WaitCycle;

/// Observable presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PresentationMode {
    Steady,
    Blinking,
    Waiting,
}

#[derive(Debug, Clone)]
enum Mode {
    Steady,
    Blinking(BlinkCycle),
    Waiting(WaitCycle),
}

impl Mode {
    fn kind(&self) -> Option<TickKind> {
        match self {
            Mode::Steady => None,
            Mode::Blinking(_) => Some(TickKind::Blink),
            Mode::Waiting(_) => Some(TickKind::Wait),
        }
    }

    fn into_saved(self) -> Option<Frame> {
        match self {
            Mode::Steady => None,
            Mode::Blinking(cycle) => Some(cycle.saved),
            Mode::Waiting(cycle) => Some(cycle.saved),
        }
    }
}

/// Copy of the frame taken under the presenter lock
///
/// `generation` grows with every change, so copies that reach the sink out
/// of order can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generation: u32,
    pub frame: Frame,
}

/// Frame plus presentation state of one display
///
/// Owns the timer service handle so that starting a tick and switching
/// mode happen under the same lock.
///
/// Frame indices run left to right. Public digit positions, as taken by
/// [`Self::poke`] and [`Self::set_blink_mask`], count from the rightmost
/// digit.
pub struct Presenter<T: TickTimer> {
    id: InstanceId,
    timer: T,
    frame: Frame,
    space: u8,
    mode: Mode,
    blink: BlinkTiming,
    /// Indexed like the frame
    blink_mask: Vec<bool, MAX_DIGITS>,
    wait_rate_ms: u32,
    wait_glyph: u8,
    changed: bool,
    generation: u32,
}

impl<T: TickTimer> Presenter<T> {
    /// Create a blank, steady presenter
    ///
    /// - `space`: mask with every segment off
    /// - `wait_glyph`: mask drawn by the wait animation
    pub fn new(
        id: InstanceId,
        timer: T,
        digits: u8,
        space: u8,
        wait_glyph: u8,
        blink: BlinkTiming,
        wait_rate_ms: u32,
    ) -> Self {
        let digits = digits.min(MAX_DIGITS as u8);
        let mut blink_mask = Vec::new();
        for _ in 0..digits {
            let _ = blink_mask.push(true);
        }

        Self {
            id,
            timer,
            frame: filled(digits, space),
            space,
            mode: Mode::Steady,
            blink,
            blink_mask,
            wait_rate_ms,
            wait_glyph,
            changed: true,
            generation: 0,
        }
    }

    /// Current frame, including blink or wait effects
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn mode(&self) -> PresentationMode {
        match self.mode {
            Mode::Steady => PresentationMode::Steady,
            Mode::Blinking(_) => PresentationMode::Blinking,
            Mode::Waiting(_) => PresentationMode::Waiting,
        }
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.mode, Mode::Blinking(_))
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.mode, Mode::Waiting(_))
    }

    /// Check if every digit of the current frame is dark
    pub fn is_blank(&self) -> bool {
        self.frame.iter().all(|&mask| mask == self.space)
    }

    pub fn blink_timing(&self) -> BlinkTiming {
        self.blink
    }

    pub fn wait_rate_ms(&self) -> u32 {
        self.wait_rate_ms
    }

    /// Digits lit by the next wait step, `None` if not waiting
    pub fn wait_step(&self) -> Option<u8> {
        match &self.mode {
            Mode::Waiting(cycle) => Some(cycle.step()),
            _ => None,
        }
    }

    /// Copy the frame, starting a new generation if it changed
    pub fn snapshot(&mut self) -> Snapshot {
        if core::mem::take(&mut self.changed) {
            self.generation = self.generation.wrapping_add(1);
        }
        Snapshot {
            generation: self.generation,
            frame: self.frame.clone(),
        }
    }

    /// Snapshot to push to the sink, if the frame changed since the last one
    pub fn take_changed(&mut self) -> Option<Snapshot> {
        if self.changed {
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Frame index of public position `position`, rightmost digit first
    fn index(&self, position: usize) -> Option<usize> {
        self.frame.len().checked_sub(position.checked_add(1)?)
    }

    #[cfg(test)]
    pub(crate) fn timer(&self) -> &T {
        &self.timer
    }

    #[cfg(test)]
    pub(crate) fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    // Content

    /// Replace the whole content
    ///
    /// Ends a wait animation. While blinking, the new content becomes the
    /// blink content and the cycle restarts from its off half.
    pub fn replace(&mut self, content: Frame) {
        self.cancel(TickKind::Wait);
        if let Mode::Blinking(cycle) = &mut self.mode {
            cycle.restart_with(&content);
        }
        self.frame = content;
        self.changed = true;
    }

    /// Overwrite one digit, position 0 being the rightmost
    pub fn poke(&mut self, position: usize, mask: u8) -> Result<(), DisplayError> {
        let index = self.index(position).ok_or(DisplayError::InvalidPosition)?;

        self.cancel(TickKind::Wait);
        match &mut self.mode {
            Mode::Blinking(cycle) => {
                cycle.saved[index] = mask;
                self.frame.clone_from(&cycle.saved);
                cycle.restart();
            }
            _ => self.frame[index] = mask,
        }
        self.changed = true;
        Ok(())
    }

    /// Blank every digit
    ///
    /// Ignored while waiting; the animation owns the digits.
    pub fn clear(&mut self) {
        if self.is_waiting() {
            return;
        }

        let space = self.space;
        if let Mode::Blinking(cycle) = &mut self.mode {
            cycle.saved.iter_mut().for_each(|mask| *mask = space);
        }
        if !self.is_blank() {
            self.frame.iter_mut().for_each(|mask| *mask = space);
            self.changed = true;
        }
    }

    // Blinking

    /// Start blinking with the current timing
    pub fn start_blink(&mut self) -> Result<(), DisplayError> {
        if self.is_blinking() {
            return Ok(());
        }

        self.start_tick(TickKind::Blink, self.blink.tick_ms())?;
        self.cancel(TickKind::Wait);
        self.mode = Mode::Blinking(BlinkCycle::new(self.frame.clone()));
        Ok(())
    }

    /// Stop blinking and restore the content
    ///
    /// The content is restored even if the timer fails to stop.
    pub fn stop_blink(&mut self) -> Result<(), DisplayError> {
        self.leave(TickKind::Blink).map_err(DisplayError::from)
    }

    /// Change the blink timing, `off_ms == 0` for symmetric
    ///
    /// A running blink switches to the new tick period. If that fails the
    /// new timing is still kept and the timer error is returned.
    pub fn set_blink_rate(&mut self, on_ms: u32, off_ms: u32) -> Result<(), DisplayError> {
        let timing = BlinkTiming::new(on_ms, off_ms)?;
        if timing == self.blink {
            return Ok(());
        }

        self.blink = timing;
        if self.is_blinking() {
            self.timer.set_period(TickKind::Blink, timing.tick_ms())?;
        }
        Ok(())
    }

    /// Choose which digits blink, `mask[0]` being the rightmost digit
    pub fn set_blink_mask(&mut self, mask: &[bool]) -> Result<(), DisplayError> {
        if mask.len() != self.frame.len() {
            return Err(DisplayError::MaskLength);
        }
        self.blink_mask.clear();
        for &blinks in mask.iter().rev() {
            self.blink_mask
                .push(blinks)
                .map_err(|_| DisplayError::MaskLength)?;
        }
        Ok(())
    }

    /// Make every digit blink
    pub fn reset_blink_mask(&mut self) {
        self.blink_mask.iter_mut().for_each(|blinks| *blinks = true);
    }

    /// Advance the blink oscillator
    pub fn blink_tick(&mut self, now_ms: u64) {
        if let Mode::Blinking(cycle) = &mut self.mode {
            if cycle.tick(now_ms, &mut self.frame, &self.blink_mask, self.space, &self.blink) {
                self.changed = true;
            }
        }
    }

    // Waiting

    /// Start the wait animation with the current rate
    pub fn start_wait(&mut self) -> Result<(), DisplayError> {
        if self.is_waiting() {
            return Ok(());
        }

        self.start_tick(TickKind::Wait, self.wait_rate_ms)?;
        self.cancel(TickKind::Blink);
        self.mode = Mode::Waiting(WaitCycle::new(self.frame.clone()));
        Ok(())
    }

    /// Start the wait animation at a given rate
    ///
    /// Asking a running animation for its own rate succeeds; any other
    /// rate is a conflict.
    pub fn wait_at(&mut self, rate_ms: u32) -> Result<(), DisplayError> {
        if self.is_waiting() {
            return if rate_ms == self.wait_rate_ms {
                Ok(())
            } else {
                Err(DisplayError::ModeConflict)
            };
        }
        if !rate_in_window(rate_ms) {
            return Err(DisplayError::RateOutOfRange);
        }

        self.wait_rate_ms = rate_ms;
        self.start_wait()
    }

    /// Stop the wait animation and restore the content
    pub fn stop_wait(&mut self) -> Result<(), DisplayError> {
        self.leave(TickKind::Wait).map_err(DisplayError::from)
    }

    /// Change the wait step time
    pub fn set_wait_rate(&mut self, rate_ms: u32) -> Result<(), DisplayError> {
        if rate_ms == self.wait_rate_ms {
            return Ok(());
        }
        if !rate_in_window(rate_ms) {
            return Err(DisplayError::RateOutOfRange);
        }

        self.wait_rate_ms = rate_ms;
        if self.is_waiting() {
            self.timer.set_period(TickKind::Wait, rate_ms)?;
        }
        Ok(())
    }

    /// Change the mask drawn by the wait animation
    pub fn set_wait_glyph(&mut self, mask: u8) {
        self.wait_glyph = mask;
    }

    /// Advance the wait animation
    pub fn wait_tick(&mut self, now_ms: u64) {
        if let Mode::Waiting(cycle) = &mut self.mode {
            if cycle.tick(now_ms, &mut self.frame, self.space, self.wait_glyph, self.wait_rate_ms) {
                self.changed = true;
            }
        }
    }

    /// End any running mode, restore the content and stop its timer
    pub fn shutdown(&mut self) {
        self.cancel(TickKind::Blink);
        self.cancel(TickKind::Wait);
    }

    fn start_tick(&mut self, kind: TickKind, period_ms: u32) -> Result<(), TimerError> {
        let name = self.id.timer_name(kind);
        match self.timer.start(kind, &name, period_ms) {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("{}: started at {} ms", name.as_str(), period_ms);
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: start failed: {}", name.as_str(), e);
                Err(e)
            }
        }
    }

    /// Leave mode `kind` if it is active
    fn leave(&mut self, kind: TickKind) -> Result<(), TimerError> {
        if self.mode.kind() != Some(kind) {
            return Ok(());
        }

        if let Some(saved) = core::mem::replace(&mut self.mode, Mode::Steady).into_saved() {
            self.frame = saved;
            self.changed = true;
        }
        self.timer.stop(kind)
    }

    /// Like [`Self::leave`], for mode switches where only the content matters
    fn cancel(&mut self, kind: TickKind) {
        if let Err(_e) = self.leave(kind) {
            #[cfg(feature = "defmt")]
            defmt::warn!("display {}: stopping {} failed: {}", self.id.serial(), kind, _e);
        }
    }
}
