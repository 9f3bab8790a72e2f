//! Tick scheduling primitives for the frame sequencer.
//!
//! The sequencer never sleeps or spawns timers. It asks its environment for
//! "call me back on the next refresh" through [`TickSource`] and is handed a
//! monotonic timestamp when that refresh happens.
//!
//! - [`TickQueue`] - one-shot requests that all become due on the next refresh.
//!   Production drives it from the refresh loop, tests drive it by hand with
//!   simulated timestamps.
//! - [`RefreshClock`] - millisecond clock relative to its creation, the
//!   timestamp source for the refresh loop.

use log::trace;
use std::time::Instant;

/// Opaque handle for a scheduled tick. Compared by value to detect stale ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Environment-provided "schedule next tick" primitive.
pub trait TickSource {
    /// Request one tick at an environment-chosen future time.
    fn schedule_tick(&mut self) -> TickHandle;

    /// Cancel a scheduled tick. No-op if it already fired or was cancelled.
    fn cancel_tick(&mut self, handle: TickHandle);
}

/// Refresh-driven tick queue.
///
/// Every tick scheduled before a refresh fires on that refresh, in schedule
/// order. Ticks scheduled while handling a refresh wait for the next one.
#[derive(Debug, Default)]
pub struct TickQueue {
    next_id: u64,
    pending: Vec<TickHandle>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all ticks due on this refresh.
    pub fn take_due(&mut self) -> Vec<TickHandle> {
        std::mem::take(&mut self.pending)
    }

    /// Number of scheduled, not yet fired ticks
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: TickHandle) -> bool {
        self.pending.contains(&handle)
    }
}

impl TickSource for TickQueue {
    fn schedule_tick(&mut self) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(handle);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        let before = self.pending.len();
        self.pending.retain(|h| *h != handle);
        if self.pending.len() != before {
            trace!("TickQueue: cancelled tick {}", handle.id());
        }
    }
}

/// Monotonic clock in milliseconds since creation.
#[derive(Debug, Clone, Copy)]
pub struct RefreshClock {
    origin: Instant,
}

impl Default for RefreshClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}
