//! Seven-segment display
//!
//! [`SevenSegDisplay`] ties a hardware sink and a tick timer to the
//! formatter and presentation state machine. All methods take `&self`, so
//! one display can be shared between application tasks and the timer
//! service.
//!
//! Two locks guard the state and are never held at the same time:
//!
//! - the presenter lock, short, around the frame and presentation mode
//! - the sink lock, held for a whole bus transfer
//!
//! The frame is copied under the first lock and handed to the sink under
//! the second. Each copy carries the generation it was taken at; the sink
//! lock drops copies older than the one the sink already got, so a writer
//! that stalls between the two locks cannot leave a latched module on
//! stale content.
//!
//! The locks take separate raw mutex types. On a single-core MCU the sink
//! can then use a thread-mode mutex and shift its bytes out with interrupts
//! enabled.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::{DisplayConfig, MAX_RATE_MS, MIN_RATE_MS};
use crate::error::DisplayError;
use crate::format::{self, Text};
use crate::frame::{Frame, Geometry};
use crate::glyph::GlyphTable;
use crate::presentation::{BlinkTiming, PresentationMode, Presenter, Snapshot};
use crate::registry::{InstanceId, Registry};
use crate::traits::{DisplaySink, SinkError, TickTimer};

/// Sink plus the generation of the newest frame handed to it
struct SinkSlot<S> {
    sink: S,
    shown: u32,
}

impl<S> SinkSlot<S> {
    /// Check if `generation` is older than what the sink already shows
    fn is_stale(&self, generation: u32) -> bool {
        (self.shown.wrapping_sub(generation) as i32) > 0
    }
}

/// One seven-segment display
///
/// - `M`: raw mutex guarding the frame and presentation state
/// - `SM`: raw mutex guarding the sink
/// - `S`: hardware sink
/// - `T`: tick timer service
pub struct SevenSegDisplay<'r, M, SM, S, T>
where
    M: RawMutex,
    SM: RawMutex,
    S: DisplaySink,
    T: TickTimer,
{
    id: InstanceId,
    registry: &'r Registry<M>,
    geometry: Geometry,
    glyphs: GlyphTable,
    refresh_hint_ms: u32,
    presenter: Mutex<M, RefCell<Presenter<T>>>,
    sink: Mutex<SM, RefCell<SinkSlot<S>>>,
}

impl<'r, M, SM, S, T> SevenSegDisplay<'r, M, SM, S, T>
where
    M: RawMutex,
    SM: RawMutex,
    S: DisplaySink,
    T: TickTimer,
{
    /// Build a display with the default configuration
    pub fn new(sink: S, timer: T, registry: &'r Registry<M>) -> Result<Self, DisplayError> {
        Self::with_config(sink, timer, registry, &DisplayConfig::default())
    }

    /// Build a display
    ///
    /// The digit count and polarity are read from the sink. The display
    /// starts blank and steady; nothing reaches the LEDs until
    /// [`Self::begin`].
    pub fn with_config(
        sink: S,
        timer: T,
        registry: &'r Registry<M>,
        config: &DisplayConfig,
    ) -> Result<Self, DisplayError> {
        config.validate()?;
        let geometry = Geometry::new(sink.digit_count())?;
        let glyphs = GlyphTable::new(sink.polarity());
        let wait_glyph = glyphs
            .encode(config.wait_char)
            .ok_or(DisplayError::InvalidCharacter(config.wait_char))?;
        let blink = BlinkTiming::new(config.blink_on_ms, config.blink_off_ms)?;

        // Last fallible step, so a failed build never holds a slot
        let id = registry.register()?;

        let presenter = Presenter::new(
            id,
            timer,
            geometry.digits(),
            glyphs.space(),
            wait_glyph,
            blink,
            config.wait_rate_ms,
        );

        #[cfg(feature = "defmt")]
        defmt::info!(
            "display {} created: {} digits, slot {}",
            id.serial(),
            geometry.digits(),
            id.slot()
        );

        Ok(Self {
            id,
            registry,
            geometry,
            glyphs,
            refresh_hint_ms: config.refresh_hint_ms,
            presenter: Mutex::new(RefCell::new(presenter)),
            sink: Mutex::new(RefCell::new(SinkSlot { sink, shown: 0 })),
        })
    }

    // Lock helpers

    fn update<R>(&self, f: impl FnOnce(&mut Presenter<T>) -> R) -> R {
        let (result, changed) = self.presenter.lock(|cell| {
            let mut presenter = cell.borrow_mut();
            let result = f(&mut presenter);
            (result, presenter.take_changed())
        });

        if let Some(snapshot) = changed {
            self.notify(&snapshot);
        }
        result
    }

    fn read<R>(&self, f: impl FnOnce(&Presenter<T>) -> R) -> R {
        self.presenter.lock(|cell| f(&cell.borrow()))
    }

    fn snapshot(&self) -> Snapshot {
        self.presenter.lock(|cell| cell.borrow_mut().snapshot())
    }

    fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.sink.lock(|cell| f(&mut cell.borrow_mut().sink))
    }

    /// Hand `snapshot` to the sink unless a newer frame got there first
    fn deliver(
        &self,
        snapshot: &Snapshot,
        f: impl FnOnce(&mut S, &[u8]) -> Result<(), SinkError>,
    ) -> Result<(), SinkError> {
        self.sink.lock(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.is_stale(snapshot.generation) {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "display {}: dropped frame {}, sink has {}",
                    self.id.serial(),
                    snapshot.generation,
                    slot.shown
                );
                return Ok(());
            }

            slot.shown = snapshot.generation;
            f(&mut slot.sink, snapshot.frame.as_slice())
        })
    }

    fn notify(&self, snapshot: &Snapshot) {
        if let Err(_e) = self.deliver(snapshot, |sink, frame| sink.frame_changed(frame)) {
            #[cfg(feature = "defmt")]
            defmt::warn!("display {}: sink rejected frame: {}", self.id.serial(), _e);
        }
    }

    /// Clear the display and hand back an input error
    fn reject(&self, error: DisplayError) -> DisplayError {
        #[cfg(feature = "defmt")]
        defmt::debug!("display {}: rejected content: {}", self.id.serial(), error);
        self.update(|p| p.clear());
        error
    }

    fn show(&self, text: Result<Text, DisplayError>) -> Result<(), DisplayError> {
        let text = text.map_err(|e| self.reject(e))?;
        self.print(&text)
    }

    // Hardware

    /// Start driving the LEDs with the current frame
    pub fn begin(&self) -> Result<(), DisplayError> {
        self.with_sink(|sink| sink.begin(self.refresh_hint_ms))?;
        // Copy only once the sink runs, so nothing newer is lost meanwhile
        let snapshot = self.snapshot();
        self.deliver(&snapshot, |sink, frame| sink.frame_changed(frame))?;
        Ok(())
    }

    /// Stop driving the LEDs
    pub fn end(&self) -> Result<(), DisplayError> {
        self.with_sink(|sink| sink.end())?;
        Ok(())
    }

    /// Run one sink refresh pass over a snapshot of the frame
    pub fn refresh(&self) -> Result<(), DisplayError> {
        let snapshot = self.snapshot();
        self.deliver(&snapshot, |sink, frame| sink.refresh(frame))?;
        Ok(())
    }

    /// Period at which [`Self::refresh`] must be called, `None` if latched
    pub fn refresh_period_ms(&self) -> Option<u32> {
        self.with_sink(|sink| sink.refresh_period_ms())
    }

    /// Remap logical positions to physical digit ports
    pub fn set_digit_order(&self, order: &[u8]) -> Result<(), DisplayError> {
        self.with_sink(|sink| sink.set_digit_order(order))?;
        let snapshot = self.snapshot();
        self.notify(&snapshot);
        Ok(())
    }

    // Timer service entry points

    /// Advance the blink effect, called on each blink tick
    pub fn blink_tick(&self, now_ms: u64) {
        self.update(|p| p.blink_tick(now_ms));
    }

    /// Advance the wait animation, called on each wait tick
    pub fn wait_tick(&self, now_ms: u64) {
        self.update(|p| p.wait_tick(now_ms));
    }

    // Content

    /// Show a text, left-aligned
    ///
    /// A `.` lights the decimal point of the previous character.
    pub fn print(&self, text: &str) -> Result<(), DisplayError> {
        let frame = format::render_text(&self.glyphs, self.geometry.digits(), text)
            .map_err(|e| self.reject(e))?;
        self.update(|p| p.replace(frame));
        Ok(())
    }

    /// Show an integer
    pub fn print_int(&self, value: i32, right_align: bool, zero_pad: bool) -> Result<(), DisplayError> {
        self.show(format::int_text(&self.geometry, value, right_align, zero_pad))
    }

    /// Show a decimal number with a fixed count of truncated decimals
    pub fn print_float(
        &self,
        value: f64,
        decimals: u8,
        right_align: bool,
        zero_pad: bool,
    ) -> Result<(), DisplayError> {
        self.show(format::float_text(
            &self.geometry,
            value,
            decimals,
            right_align,
            zero_pad,
        ))
    }

    /// Show a bar gauge, `level` in `0..=3`
    pub fn gauge(&self, level: i32, label: char) -> Result<(), DisplayError> {
        self.show(format::gauge_text(self.geometry.digits(), level, label))
    }

    /// Show a bar gauge for a fraction in `0.0..=1.0`
    pub fn gauge_fraction(&self, fraction: f64, label: char) -> Result<(), DisplayError> {
        let level = format::gauge_level(fraction).map_err(|e| self.reject(e))?;
        self.gauge(level, label)
    }

    /// Show two gauges side by side
    pub fn double_gauge(
        &self,
        left_level: i32,
        right_level: i32,
        left_label: char,
        right_label: char,
    ) -> Result<(), DisplayError> {
        self.show(format::double_gauge_text(
            self.geometry.digits(),
            left_level,
            right_level,
            left_label,
            right_label,
        ))
    }

    /// Write a raw segment mask, in the sink's polarity, to one digit
    ///
    /// Position 0 is the rightmost digit.
    pub fn write_segments(&self, mask: u8, position: u8) -> Result<(), DisplayError> {
        self.update(|p| p.poke(position as usize, mask))
    }

    /// Write one character to one digit
    ///
    /// Unlike [`Self::print`], an unknown character leaves the display
    /// untouched.
    pub fn write_char(&self, ch: char, position: u8) -> Result<(), DisplayError> {
        let mask = self
            .glyphs
            .encode(ch)
            .ok_or(DisplayError::InvalidCharacter(ch))?;
        self.write_segments(mask, position)
    }

    /// Blank every digit
    pub fn clear(&self) {
        self.update(|p| p.clear());
    }

    // Blinking

    pub fn blink(&self) -> Result<(), DisplayError> {
        self.update(|p| p.start_blink())
    }

    /// Start blinking with new on/off times, `off_ms == 0` for symmetric
    pub fn blink_with(&self, on_ms: u32, off_ms: u32) -> Result<(), DisplayError> {
        self.update(|p| {
            p.set_blink_rate(on_ms, off_ms)?;
            p.start_blink()
        })
    }

    pub fn no_blink(&self) -> Result<(), DisplayError> {
        self.update(|p| p.stop_blink())
    }

    pub fn set_blink_rate(&self, on_ms: u32, off_ms: u32) -> Result<(), DisplayError> {
        self.update(|p| p.set_blink_rate(on_ms, off_ms))
    }

    /// Choose which digits blink, one entry per digit from the right
    pub fn set_blink_mask(&self, mask: &[bool]) -> Result<(), DisplayError> {
        self.update(|p| p.set_blink_mask(mask))
    }

    pub fn reset_blink_mask(&self) {
        self.update(|p| p.reset_blink_mask());
    }

    // Waiting

    pub fn wait(&self) -> Result<(), DisplayError> {
        self.update(|p| p.start_wait())
    }

    /// Start the wait animation at a given step time
    pub fn wait_with(&self, rate_ms: u32) -> Result<(), DisplayError> {
        self.update(|p| p.wait_at(rate_ms))
    }

    pub fn no_wait(&self) -> Result<(), DisplayError> {
        self.update(|p| p.stop_wait())
    }

    pub fn set_wait_rate(&self, rate_ms: u32) -> Result<(), DisplayError> {
        self.update(|p| p.set_wait_rate(rate_ms))
    }

    /// Change the character drawn by the wait animation
    pub fn set_wait_char(&self, ch: char) -> Result<(), DisplayError> {
        let mask = self
            .glyphs
            .encode(ch)
            .ok_or(DisplayError::InvalidCharacter(ch))?;
        self.update(|p| p.set_wait_glyph(mask));
        Ok(())
    }

    // Queries

    /// Copy of the frame currently shown
    pub fn frame(&self) -> Frame {
        self.read(|p| p.frame().clone())
    }

    pub fn mode(&self) -> PresentationMode {
        self.read(|p| p.mode())
    }

    pub fn is_blinking(&self) -> bool {
        self.read(|p| p.is_blinking())
    }

    pub fn is_waiting(&self) -> bool {
        self.read(|p| p.is_waiting())
    }

    pub fn is_blank(&self) -> bool {
        self.read(|p| p.is_blank())
    }

    pub fn blink_timing(&self) -> BlinkTiming {
        self.read(|p| p.blink_timing())
    }

    pub fn wait_rate_ms(&self) -> u32 {
        self.read(|p| p.wait_rate_ms())
    }

    pub fn digits(&self) -> u8 {
        self.geometry.digits()
    }

    pub fn value_min(&self) -> i32 {
        self.geometry.value_min()
    }

    pub fn value_max(&self) -> i32 {
        self.geometry.value_max()
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn instance_id(&self) -> InstanceId {
        self.id
    }

    pub fn min_blink_rate(&self) -> u32 {
        MIN_RATE_MS
    }

    pub fn max_blink_rate(&self) -> u32 {
        MAX_RATE_MS
    }

    #[cfg(test)]
    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&Presenter<T>) -> R) -> R {
        self.read(f)
    }

    #[cfg(test)]
    pub(crate) fn inspect_mut<R>(&self, f: impl FnOnce(&mut Presenter<T>) -> R) -> R {
        self.update(f)
    }

    #[cfg(test)]
    pub(crate) fn inspect_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.with_sink(f)
    }
}

impl<M, SM, S, T> Drop for SevenSegDisplay<'_, M, SM, S, T>
where
    M: RawMutex,
    SM: RawMutex,
    S: DisplaySink,
    T: TickTimer,
{
    fn drop(&mut self) {
        self.update(|p| p.shutdown());
        self.registry.release(self.id);

        #[cfg(feature = "defmt")]
        defmt::info!("display {} released", self.id.serial());
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::glyph::Polarity;
    use crate::testing::{MockSink, MockTimer, StallingRawMutex};
    use crate::traits::TimerError;
    use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
    use std::time::Duration;

    type TestDisplay<'r> = SevenSegDisplay<'r, NoopRawMutex, NoopRawMutex, MockSink, MockTimer>;
    type SharedDisplay<'r, SM> = SevenSegDisplay<'r, CriticalSectionRawMutex, SM, MockSink, MockTimer>;

    fn display(registry: &Registry<NoopRawMutex>, digits: u8) -> TestDisplay<'_> {
        SevenSegDisplay::new(MockSink::new(digits), MockTimer::default(), registry).unwrap()
    }

    fn encoded(display: &TestDisplay<'_>, text: &str) -> Frame {
        format::render_text(&display.glyphs, display.digits(), text).unwrap()
    }

    #[test]
    fn test_new_display_is_blank() {
        let registry = Registry::new();
        let d = display(&registry, 4);

        assert!(d.is_blank());
        assert_eq!(d.mode(), PresentationMode::Steady);
        assert_eq!(d.value_max(), 9999);
        assert_eq!(d.value_min(), -999);
        assert_eq!(d.min_blink_rate(), 100);
        assert_eq!(d.max_blink_rate(), 2000);
    }

    #[test]
    fn test_begin_pushes_frame() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.begin().unwrap();

        d.inspect_sink(|sink| {
            assert!(sink.begun);
            assert!(sink.changes >= 1);
            assert_eq!(sink.changed.as_ref().map(|f| f.as_slice()), Some(&[0xFF; 4][..]));
        });
    }

    #[test]
    fn test_print_and_refresh() {
        let registry = Registry::new();
        let d = display(&registry, 4);

        d.print("12").unwrap();
        d.refresh().unwrap();

        let expected = encoded(&d, "12  ");
        d.inspect_sink(|sink| {
            assert_eq!(sink.refreshed.as_ref(), Some(&expected));
            assert_eq!(sink.changed.as_ref(), Some(&expected));
        });
    }

    #[test]
    fn test_out_of_range_clears() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("8888").unwrap();

        assert_eq!(d.print_int(12345, true, false), Err(DisplayError::OutOfRange));
        assert!(d.is_blank());
    }

    #[test]
    fn test_invalid_character_clears() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("8888").unwrap();

        assert_eq!(d.print("1K"), Err(DisplayError::InvalidCharacter('K')));
        assert!(d.is_blank());
    }

    #[test]
    fn test_write_char_failure_keeps_content() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("8888").unwrap();

        assert_eq!(d.write_char('K', 0), Err(DisplayError::InvalidCharacter('K')));
        assert_eq!(d.frame(), encoded(&d, "8888"));

        d.write_char('1', 0).unwrap();
        assert_eq!(d.frame(), encoded(&d, "8881"));
        d.write_char('2', 3).unwrap();
        assert_eq!(d.frame(), encoded(&d, "2881"));
        assert_eq!(d.write_char('1', 4), Err(DisplayError::InvalidPosition));
        assert_eq!(d.frame(), encoded(&d, "2881"));
    }

    #[test]
    fn test_write_ends_wait() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("1234").unwrap();

        d.wait().unwrap();
        d.wait_tick(0);
        d.write_segments(0x7F, 0).unwrap();
        assert!(!d.is_waiting());
        d.inspect(|p| assert_eq!(p.timer().wait, None));
        assert_eq!(d.frame(), encoded(&d, "123 ."));

        d.wait().unwrap();
        d.wait_tick(0);
        d.write_char('9', 3).unwrap();
        assert!(!d.is_waiting());
        assert_eq!(d.frame(), encoded(&d, "923 ."));
    }

    #[test]
    fn test_blink_mask_counts_from_the_right() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("1234").unwrap();

        d.set_blink_mask(&[true, false, false, false]).unwrap();
        d.blink().unwrap();
        d.blink_tick(0);
        assert_eq!(d.frame(), encoded(&d, "123 "));
        assert_eq!(d.set_blink_mask(&[true; 3]), Err(DisplayError::MaskLength));
    }

    #[test]
    fn test_clear_while_blinking_survives_cycles() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("1234").unwrap();
        d.blink().unwrap();
        d.blink_tick(0);
        d.blink_tick(500);

        d.clear();
        for n in 2..8u64 {
            d.blink_tick(n * 500);
            assert!(d.is_blank());
        }
        assert!(d.is_blinking());
        d.no_blink().unwrap();
        assert!(d.is_blank());
    }

    #[test]
    fn test_gauge() {
        let registry = Registry::new();
        let d = display(&registry, 4);

        d.gauge(2, 'b').unwrap();
        assert_eq!(d.frame(), encoded(&d, "b_= "));

        d.gauge_fraction(0.9, 'F').unwrap();
        assert_eq!(d.frame(), encoded(&d, "F_=~"));

        assert_eq!(d.gauge(5, 'b'), Err(DisplayError::InvalidLevel));
        assert!(d.is_blank());
    }

    #[test]
    fn test_gauge_needs_four_digits() {
        let registry = Registry::new();
        let d = display(&registry, 3);
        d.print("888").unwrap();

        assert_eq!(d.double_gauge(1, 1, 'L', 'r'), Err(DisplayError::TooFewDigits));
        assert!(d.is_blank());
    }

    #[test]
    fn test_float_display() {
        let registry = Registry::new();
        let d = display(&registry, 4);

        d.print_float(-2.5, 1, true, false).unwrap();
        assert_eq!(d.frame(), encoded(&d, "- 2.5"));

        assert_eq!(
            d.print_float(1.5, 5, false, false),
            Err(DisplayError::TooManyDecimals)
        );
        assert!(d.is_blank());
    }

    #[test]
    fn test_blink_restores_exact_content() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("1234").unwrap();
        let content = d.frame();

        d.blink().unwrap();
        d.blink_tick(0);
        assert!(d.is_blank());

        d.no_blink().unwrap();
        assert_eq!(d.frame(), content);
        d.inspect_sink(|sink| assert_eq!(sink.changed.as_ref(), Some(&content)));
    }

    #[test]
    fn test_print_while_blinking_keeps_blinking() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("1111").unwrap();
        d.blink().unwrap();
        d.blink_tick(0);

        d.print("2222").unwrap();
        assert!(d.is_blinking());
        assert_eq!(d.frame(), encoded(&d, "2222"));

        d.no_blink().unwrap();
        assert_eq!(d.frame(), encoded(&d, "2222"));
    }

    #[test]
    fn test_print_ends_wait() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.wait().unwrap();
        d.wait_tick(0);

        d.print("42").unwrap();
        assert!(!d.is_waiting());
        assert_eq!(d.frame(), encoded(&d, "42  "));
        d.inspect(|p| assert_eq!(p.timer().wait, None));
    }

    #[test]
    fn test_wait_cycle_through_display() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("1234").unwrap();
        d.wait_with(200).unwrap();

        d.wait_tick(0);
        for n in 1..=5u64 {
            d.wait_tick(n * 200);
        }
        d.inspect(|p| assert_eq!(p.wait_step(), Some(0)));
        assert_eq!(d.frame(), encoded(&d, "----"));

        d.no_wait().unwrap();
        assert_eq!(d.frame(), encoded(&d, "1234"));
    }

    #[test]
    fn test_custom_wait_char() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.set_wait_char('_').unwrap();
        assert_eq!(d.set_wait_char('K'), Err(DisplayError::InvalidCharacter('K')));

        d.wait().unwrap();
        d.wait_tick(0);
        d.wait_tick(250);
        d.wait_tick(500);
        assert_eq!(d.frame(), encoded(&d, "_   "));
    }

    #[test]
    fn test_timer_failure_leaves_display() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.print("1234").unwrap();
        d.inspect_mut(|p| p.timer_mut().fail_start = true);

        assert_eq!(d.wait(), Err(DisplayError::Timer(TimerError::Start)));
        assert_eq!(d.blink(), Err(DisplayError::Timer(TimerError::Start)));
        assert_eq!(d.mode(), PresentationMode::Steady);
        assert_eq!(d.frame(), encoded(&d, "1234"));
    }

    #[test]
    fn test_blink_with_rates() {
        let registry = Registry::new();
        let d = display(&registry, 4);

        d.blink_with(300, 600).unwrap();
        assert_eq!(d.blink_timing().tick_ms(), 300);
        d.inspect(|p| assert_eq!(p.timer().blink, Some(300)));

        assert_eq!(d.blink_with(2500, 0), Err(DisplayError::RateOutOfRange));
        assert!(d.is_blinking());
    }

    #[test]
    fn test_config_applied() {
        let registry = Registry::<NoopRawMutex>::new();
        let config = DisplayConfig {
            blink_on_ms: 200,
            blink_off_ms: 0,
            wait_rate_ms: 400,
            ..Default::default()
        };
        let d: TestDisplay<'_> = SevenSegDisplay::with_config(
            MockSink::new(4),
            MockTimer::default(),
            &registry,
            &config,
        )
        .unwrap();

        assert_eq!(d.blink_timing().off_ms(), 200);
        assert_eq!(d.wait_rate_ms(), 400);
    }

    #[test]
    fn test_rejected_build_holds_no_slot() {
        let registry = Registry::<NoopRawMutex>::new();
        let result: Result<TestDisplay<'_>, _> =
            SevenSegDisplay::new(MockSink::new(9), MockTimer::default(), &registry);

        assert!(matches!(result, Err(DisplayError::UnsupportedDigits)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_releases_slot_and_timers() {
        let registry = Registry::new();
        let first = display(&registry, 4);
        let id = first.instance_id();
        first.blink().unwrap();
        drop(first);

        assert!(registry.is_empty());
        let second = display(&registry, 4);
        second.end().unwrap();
        second.inspect_sink(|sink| assert!(!sink.begun));
        assert_eq!(second.instance_id().slot(), id.slot());
        assert_ne!(second.instance_id().serial(), id.serial());
    }

    #[test]
    fn test_common_cathode_display() {
        let registry = Registry::<NoopRawMutex>::new();
        let d: TestDisplay<'_> = SevenSegDisplay::new(
            MockSink::with_polarity(2, Polarity::CommonCathode),
            MockTimer::default(),
            &registry,
        )
        .unwrap();

        assert_eq!(d.frame().as_slice(), &[0x00, 0x00]);
        d.print("1.").unwrap();
        assert_eq!(d.frame().as_slice(), &[0x86, 0x00]);
    }

    #[test]
    fn test_digit_order_forwarded() {
        let registry = Registry::new();
        let d = display(&registry, 4);

        d.set_digit_order(&[3, 2, 1, 0]).unwrap();
        d.inspect_sink(|sink| assert_eq!(sink.order.as_deref(), Some(&[3, 2, 1, 0][..])));
        assert!(matches!(
            d.set_digit_order(&[0, 0, 9, 1]),
            Err(DisplayError::Sink(crate::SinkError::InvalidOrder))
        ));
    }

    #[test]
    fn test_refresh_never_sees_mixed_frame() {
        let registry = Registry::<CriticalSectionRawMutex>::new();
        let d: SharedDisplay<'_, CriticalSectionRawMutex> =
            SevenSegDisplay::new(MockSink::new(4), MockTimer::default(), &registry).unwrap();
        let ones = format::render_text(&d.glyphs, 4, "1111").unwrap();
        let twos = format::render_text(&d.glyphs, 4, "2222").unwrap();
        d.print("1111").unwrap();
        d.refresh().unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for n in 0..2000 {
                    let text = if n % 2 == 0 { "2222" } else { "1111" };
                    d.print(text).unwrap();
                }
            });
            scope.spawn(|| {
                for _ in 0..2000 {
                    d.refresh().unwrap();
                    let seen = d.inspect_sink(|sink| sink.refreshed.clone()).unwrap();
                    assert!(seen == ones || seen == twos);
                }
            });
        });
    }

    #[test]
    fn test_late_frame_copy_never_overwrites_newer() {
        let registry = Registry::new();
        let d = display(&registry, 4);
        d.begin().unwrap();

        // First writer copies its frame but has not reached the sink yet
        let late = d
            .inspect_mut(|p| {
                p.replace(encoded(&d, "1111"));
                p.take_changed()
            })
            .unwrap();

        // Second writer gets all the way through meanwhile
        d.print("2222").unwrap();
        d.notify(&late);

        let newest = encoded(&d, "2222");
        assert_eq!(d.frame(), newest);
        d.inspect_sink(|sink| assert_eq!(sink.changed.as_ref(), Some(&newest)));

        // A refresh with the old copy is skipped too
        d.deliver(&late, |sink, frame| sink.refresh(frame)).unwrap();
        d.inspect_sink(|sink| assert_eq!(sink.refreshed, None));
    }

    #[test]
    fn test_stalled_writer_leaves_sink_current() {
        let registry = Registry::<CriticalSectionRawMutex>::new();
        let d: SharedDisplay<'_, StallingRawMutex> =
            SevenSegDisplay::new(MockSink::new(4), MockTimer::default(), &registry).unwrap();
        d.begin().unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                // Held back between copying the frame and pushing it
                StallingRawMutex::stall_next_lock(Duration::from_millis(200));
                d.print("1111").unwrap();
            });
            scope.spawn(|| {
                std::thread::sleep(Duration::from_millis(50));
                d.print("2222").unwrap();
            });
        });

        let live = d.frame();
        d.inspect_sink(|sink| assert_eq!(sink.changed.as_ref(), Some(&live)));
    }
}
