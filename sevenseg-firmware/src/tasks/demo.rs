//! Demo task
//!
//! Cycles through what the display can do: a tally counter, blinking,
//! the wait animation, decimals and bar gauges.

use defmt::*;
use embassy_time::Timer;

use sevenseg_core::{ClickCounter, DisplayError};

use crate::Display;

/// Counter limit for each round
const COUNT_TO: i32 = 20;

/// Demo task - runs forever, logging any failed step
#[embassy_executor::task]
pub async fn demo_task(display: &'static Display) {
    info!("Demo task started on display {}", display.instance_id().serial());

    let mut counter = ClickCounter::new(display);

    loop {
        // Tally counter
        report("count", counter.count_begin(0));
        for _ in 0..COUNT_TO {
            Timer::after_millis(250).await;
            report("count", counter.count_up(1));
        }

        // Blink the final count
        report("blink", counter.blink_with(300, 200));
        Timer::after_secs(3).await;
        report("blink", counter.no_blink());

        // Busy indicator, then back to the count
        report("wait", display.wait());
        Timer::after_secs(3).await;
        report("wait", display.no_wait());
        Timer::after_secs(1).await;

        // Decimals, truncated
        report("float", display.print_float(12.345, 2, true, false));
        Timer::after_secs(2).await;
        report("float", display.print_float(-2.5, 1, true, true));
        Timer::after_secs(2).await;

        // Gauges
        for level in 0..=3 {
            report("gauge", display.gauge(level, 'b'));
            Timer::after_millis(500).await;
        }
        report("gauge", display.double_gauge(1, 3, 'L', 'r'));
        Timer::after_secs(2).await;

        // Blink only the rightmost two digits
        report("text", display.print("HOLd"));
        report("mask", display.set_blink_mask(&[true, true, false, false]));
        report("blink", display.blink());
        Timer::after_secs(3).await;
        report("blink", display.no_blink());
        display.reset_blink_mask();

        display.clear();
        Timer::after_secs(1).await;
    }
}

fn report(step: &str, result: Result<(), DisplayError>) {
    if let Err(e) = result {
        warn!("Demo step '{}' failed: {}", step, e);
    }
}
