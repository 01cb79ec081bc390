//! Seven-segment display demo firmware
//!
//! Drives a 4-digit multiplexed 74HC595 module from an RP2040. Embassy
//! tasks provide the display's periodic services:
//!
//! - one tick task per effect (blink, wait)
//! - the refresh task that keeps the multiplexed digits lit
//! - a demo task exercising the display API

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, ThreadModeRawMutex};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use sevenseg_core::{DisplayConfig, Polarity, Registry, SevenSegDisplay, TickKind};
use sevenseg_drivers::{Hc595Dynamic, ShiftOut};

use crate::timer::SignalTimer;

mod channels;
mod tasks;
mod timer;

/// Digits on the module
const DIGITS: u8 = 4;

/// Presentation timing
const DISPLAY_CONFIG: DisplayConfig = DisplayConfig {
    blink_on_ms: 500,
    blink_off_ms: 500,
    wait_rate_ms: 250,
    wait_char: '-',
    // Sink default: 30 Hz per digit
    refresh_hint_ms: 0,
};

pub type Pin = Output<'static>;

/// The display type shared by every task
///
/// Frame copies run in a critical section. The bit-banged bus only runs
/// from thread-mode tasks, so its lock leaves interrupts enabled.
pub type Display = SevenSegDisplay<
    'static,
    CriticalSectionRawMutex,
    ThreadModeRawMutex,
    Hc595Dynamic<Pin, Pin, Pin>,
    SignalTimer,
>;

static REGISTRY: Registry<CriticalSectionRawMutex> = Registry::new();
static DISPLAY: StaticCell<Display> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Sevenseg firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());

    // Module wiring: DIO=GPIO2, SCLK=GPIO3, RCLK=GPIO4
    let data = Output::new(p.PIN_2, Level::Low);
    let clock = Output::new(p.PIN_3, Level::Low);
    let latch = Output::new(p.PIN_4, Level::High);

    let bus = match ShiftOut::new(data, clock, latch) {
        Ok(bus) => bus,
        Err(e) => {
            error!("Shift register bus setup failed: {}", e);
            return;
        }
    };
    let sink = Hc595Dynamic::new(bus, DIGITS, Polarity::CommonAnode);
    let timer = SignalTimer::new(&channels::BLINK_CMD, &channels::WAIT_CMD);

    let display = match SevenSegDisplay::with_config(sink, timer, &REGISTRY, &DISPLAY_CONFIG) {
        Ok(display) => display,
        Err(e) => {
            error!("Display setup failed: {}", e);
            return;
        }
    };
    let display: &'static Display = DISPLAY.init(display);

    if let Err(e) = display.begin() {
        error!("Display begin failed: {}", e);
        return;
    }
    info!(
        "Display {} ready: {} digits, range {}..={}",
        display.instance_id().serial(),
        display.digits(),
        display.value_min(),
        display.value_max()
    );

    // Spawn tasks
    spawner
        .spawn(tasks::tick_task(display, TickKind::Blink, &channels::BLINK_CMD))
        .unwrap();
    spawner
        .spawn(tasks::tick_task(display, TickKind::Wait, &channels::WAIT_CMD))
        .unwrap();
    spawner.spawn(tasks::refresh_task(display)).unwrap();
    spawner.spawn(tasks::demo_task(display)).unwrap();

    info!("All tasks spawned, firmware running");
}
