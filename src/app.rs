//! The refresh loop: every `refresh_secs` fetch fresh data, build a frame and
//! push it to the framebuffer; check whether a refresh is due every
//! `poll_secs`. One failed cycle is logged and swallowed, leaving the last
//! good frame on the screen.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::Config;
use crate::geo::Observer;
use crate::{aircraft, display, fetch};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] fetch::FetchError),
    #[error("parse failed: {0}")]
    Parse(#[from] aircraft::ParseError),
    #[error("framebuffer write failed: {0}")]
    Framebuffer(#[from] std::io::Error),
}

/// Timed refresh driver. Owns the attempt/success timestamps; nothing else
/// in the process tracks refresh timing.
pub struct RefreshLoop {
    refresh_interval: Duration,
    poll_interval: Duration,
    last_attempt: Option<Instant>,
    last_success: Option<Instant>,
}

impl RefreshLoop {
    pub fn new(refresh_interval: Duration, poll_interval: Duration) -> RefreshLoop {
        RefreshLoop {
            refresh_interval,
            poll_interval,
            last_attempt: None,
            last_success: None,
        }
    }

    /// A refresh is due immediately at startup, and thereafter once the
    /// interval has elapsed since the previous attempt. A failed attempt
    /// still counts, so failures wait for the next interval rather than
    /// retrying on every poll.
    fn due(&self, now: Instant) -> bool {
        match self.last_attempt {
            None => true,
            Some(at) => now.duration_since(at) > self.refresh_interval,
        }
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    /// Runs until `stop` is set. Each due tick makes exactly one refresh
    /// attempt; errors are logged and the loop keeps going.
    pub fn run(&mut self, stop: &AtomicBool, mut refresh: impl FnMut() -> Result<(), CycleError>) {
        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            if self.due(now) {
                self.last_attempt = Some(now);
                match refresh() {
                    Ok(()) => self.last_success = Some(now),
                    Err(error) => log::warn!("Refresh failed: {}", error),
                }
            }
            thread::sleep(self.poll_interval);
        }
    }
}

pub fn run(config: Config, stop: &AtomicBool) {
    log::info!(
        "Starting ADS-B display: observer ({}, {}), radius {} km",
        config.latitude,
        config.longitude,
        config.radius_km
    );
    let observer = config.observer();
    let mut scheduler = RefreshLoop::new(
        Duration::from_secs(config.refresh_secs),
        Duration::from_secs(config.poll_secs),
    );
    scheduler.run(stop, || refresh_once(&config, observer));
    log::info!("Display stopped");
}

/// One full refresh cycle: fetch temperature and aircraft, parse and rank,
/// render, write out.
fn refresh_once(config: &Config, observer: Observer) -> Result<(), CycleError> {
    let temperature_c = fetch::fetch_room_temperature(config)?;
    let raw = fetch::fetch_aircraft_within_radius(config)?;
    let aircraft = aircraft::parse_aircraft(&raw, observer)?;
    let selection = display::select_for_display(&aircraft, config.max_aircraft);
    let frame = display::render_frame(temperature_c, &selection, chrono::Local::now());
    display::write_to_framebuffer(&frame, Path::new(&config.fb_device))?;
    log::info!(
        "Display updated: {:.1} C, {} aircraft ({} shown)",
        temperature_c,
        aircraft.len(),
        selection.len()
    );
    Ok(())
}
