//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod handlers;

use signstream_session::clock::{ManualClock, QueuedTickScheduler};
use signstream_session::session::SessionPlayer;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Player wired to a manual clock and a host-polled scheduler
pub fn manual_player() -> (SessionPlayer, ManualClock, QueuedTickScheduler) {
    let clock = ManualClock::new();
    let host = QueuedTickScheduler::new();
    let player = SessionPlayer::new(clock.clone(), host.clone());
    (player, clock, host)
}

/// Run host frames of `step_ms` until the player stops requesting ticks
///
/// Returns the number of ticks run. Gives up after `max_frames`.
pub fn run_to_idle(
    player: &mut SessionPlayer,
    clock: &ManualClock,
    host: &QueuedTickScheduler,
    step_ms: u64,
    max_frames: usize,
) -> usize {
    let mut frames = 0;
    while frames < max_frames && host.take_due() {
        clock.advance_ms(step_ms);
        player.tick();
        frames += 1;
    }
    frames
}
