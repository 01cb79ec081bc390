//! Periodic tick tasks for the blink and wait effects
//!
//! One task per [`TickKind`]. The task idles until a start command arrives,
//! then calls the display's tick entry point on every `Ticker` period until
//! told to stop.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Ticker};

use sevenseg_core::TickKind;

use crate::timer::{TickCommand, TickSignal};
use crate::Display;

/// Tick task - drives one effect of the display
#[embassy_executor::task(pool_size = 2)]
pub async fn tick_task(display: &'static Display, kind: TickKind, commands: &'static TickSignal) {
    info!("{} tick task started", kind);

    let mut ticker: Option<Ticker> = None;

    loop {
        let event = match ticker.as_mut() {
            Some(ticker) => select(commands.wait(), ticker.next()).await,
            None => Either::First(commands.wait().await),
        };

        match event {
            Either::First(command) => {
                debug!("{} tick: {}", kind, command);
                ticker = match command {
                    TickCommand::Start(period_ms) | TickCommand::SetPeriod(period_ms) => {
                        Some(Ticker::every(Duration::from_millis(period_ms as u64)))
                    }
                    TickCommand::Stop => None,
                };
            }
            Either::Second(()) => {
                let now_ms = Instant::now().as_millis();
                match kind {
                    TickKind::Blink => display.blink_tick(now_ms),
                    TickKind::Wait => display.wait_tick(now_ms),
                }
            }
        }
    }
}
