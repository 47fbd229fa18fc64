//! Time sources and tick scheduling
//!
//! The recorder and player never read the system clock directly. They are
//! handed a [`Clock`] for elapsed time and (for the player) a
//! [`TickScheduler`] that asks the host to call
//! [`SessionPlayer::tick`](crate::session::SessionPlayer::tick) again.
//!
//! ## Choosing an implementation
//!
//! - **Live use**: [`SystemClock`]
//! - **Tests / simulations**: [`ManualClock`], advanced explicitly
//! - **Host-polled loops**: [`QueuedTickScheduler`], drained by the host

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of elapsed and wall-clock time
pub trait Clock {
    /// Monotonic time since an arbitrary origin
    fn now(&self) -> Duration;

    /// Wall-clock time in milliseconds since the Unix epoch
    fn wall_time_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock
///
/// Clones share the same time, so a test can keep one handle while the
/// recorder or player owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
    wall_origin_ms: i64,
}

impl ManualClock {
    /// Create a clock at zero with a wall-clock origin of the Unix epoch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock whose wall time starts at `wall_origin_ms`
    pub fn with_wall_origin(wall_origin_ms: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(Duration::ZERO)),
            wall_origin_ms,
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Move time forward by whole milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to an absolute time; ignored if it would move backwards
    pub fn set(&self, to: Duration) {
        if to >= self.now.get() {
            self.now.set(to);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn wall_time_ms(&self) -> i64 {
        self.wall_origin_ms + self.now.get().as_millis() as i64
    }
}

/// Handle for a requested tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickHandle(pub u64);

/// Host scheduling primitive for the player's tick loop
///
/// The host must guarantee at most one in-flight tick at a time.
pub trait TickScheduler {
    /// Ask the host to call `tick()` once more
    fn request_tick(&mut self) -> TickHandle;

    /// Cancel a previously requested tick; returns false if it was not pending
    fn cancel_tick(&mut self, handle: TickHandle) -> bool;

    /// Scheduler name (for logging)
    fn name(&self) -> &'static str;
}

#[derive(Debug, Default)]
struct TickQueue {
    next_id: u64,
    pending: BTreeSet<TickHandle>,
    requested: u64,
    cancelled: u64,
}

/// Tick scheduler drained by a host loop
///
/// Requests are queued; the host calls [`take_due`](Self::take_due) and runs
/// one tick for each `true` it gets back. Clones share the queue.
#[derive(Debug, Clone, Default)]
pub struct QueuedTickScheduler {
    queue: Rc<RefCell<TickQueue>>,
}

impl QueuedTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest pending request
    pub fn take_due(&self) -> bool {
        let mut queue = self.queue.borrow_mut();
        match queue.pending.iter().next().copied() {
            Some(handle) => {
                queue.pending.remove(&handle);
                true
            }
            None => false,
        }
    }

    /// Whether a tick is waiting to run
    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().pending.is_empty()
    }

    /// Number of pending requests
    pub fn pending_count(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    /// Total requests ever made
    pub fn requested_count(&self) -> u64 {
        self.queue.borrow().requested
    }

    /// Total successful cancellations
    pub fn cancelled_count(&self) -> u64 {
        self.queue.borrow().cancelled
    }
}

impl TickScheduler for QueuedTickScheduler {
    fn request_tick(&mut self) -> TickHandle {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        queue.requested += 1;
        let handle = TickHandle(queue.next_id);
        queue.pending.insert(handle);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) -> bool {
        let mut queue = self.queue.borrow_mut();
        let removed = queue.pending.remove(&handle);
        if removed {
            queue.cancelled += 1;
        }
        removed
    }

    fn name(&self) -> &'static str {
        "queued"
    }
}
