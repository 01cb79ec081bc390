//! Display refresh task
//!
//! Multiplexed modules only light one digit at a time and must be
//! refreshed continuously. Latched modules are updated on change and need
//! no task.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::Display;

/// Refresh task - runs the sink's refresh pass at its requested period
#[embassy_executor::task]
pub async fn refresh_task(display: &'static Display) {
    let Some(period_ms) = display.refresh_period_ms() else {
        info!("Latched display, refresh task not needed");
        return;
    };
    info!("Refresh task started ({} ms)", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));

    loop {
        ticker.next().await;

        if let Err(e) = display.refresh() {
            warn!("Display refresh failed: {}", e);
        }
    }
}
