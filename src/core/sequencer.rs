//! Year-by-year frame sequencer driven by external ticks.
//!
//! **Architecture**: The sequencer owns only its playback state. Year/spectrum
//! selection lives in `ViewerState`; the sequencer reports progress through
//! the `on_frame`/`on_complete` callbacks handed to [`FrameSequencer::start`].
//!
//! # Timing Model
//!
//! Fixed step: one year per `frame_duration` milliseconds. The sequencer does
//! not keep time itself. It schedules a tick on its [`TickSource`] and is fed
//! a monotonic timestamp when the tick fires (once per display refresh).
//!
//! The first tick after `start` sets the timing baseline. On each later tick:
//! - `elapsed <= frame_duration`: re-arm, nothing else
//! - `elapsed > frame_duration`: baseline advances by
//!   `elapsed - (elapsed % frame_duration)`, then one year is emitted, or the
//!   run completes if the end year was already emitted
//!
//! A stalled tick source therefore never skips years: at most one year per
//! tick, and the baseline stays on the `frame_duration` grid.
//!
//! # Cancellation
//!
//! Each run remembers the handle of its pending tick. Ticks carrying any other
//! handle (fired after `stop()` or a restart) are ignored.

use super::ticker::{TickHandle, TickQueue, TickSource};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default step duration: one year per second
pub const DEFAULT_FRAME_DURATION_MS: f64 = 1000.0;

/// Sequencer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("Start year {start} cannot be after end year {end}")]
    InvalidRange { start: i32, end: i32 },
}

/// Closed year range `[start_year, end_year]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackRange {
    start_year: i32,
    end_year: i32,
}

impl PlaybackRange {
    pub fn new(start_year: i32, end_year: i32) -> Result<Self, SequencerError> {
        if start_year > end_year {
            return Err(SequencerError::InvalidRange {
                start: start_year,
                end: end_year,
            });
        }
        Ok(Self { start_year, end_year })
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    /// Number of frames in the range (always >= 1)
    pub fn len(&self) -> u64 {
        (i64::from(self.end_year) - i64::from(self.start_year) + 1) as u64
    }
}

/// Fixed per-step duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDuration(f64);

impl Default for FrameDuration {
    fn default() -> Self {
        Self(DEFAULT_FRAME_DURATION_MS)
    }
}

impl FrameDuration {
    /// Non-positive or non-finite values fall back to the default.
    pub fn from_millis(ms: f64) -> Self {
        if ms.is_finite() && ms > 0.0 {
            Self(ms)
        } else {
            warn!(
                "Invalid frame duration {}ms, using {}ms",
                ms, DEFAULT_FRAME_DURATION_MS
            );
            Self::default()
        }
    }

    pub fn as_millis(&self) -> f64 {
        self.0
    }
}

/// Public view of the playback state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Idle,
    Running {
        frame_year: i32,
        /// `None` until the first tick sets the baseline
        last_tick_timestamp: Option<f64>,
    },
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale handle or idle sequencer
    Ignored,
    /// Re-armed without emitting
    Waiting,
    /// Emitted this year
    Frame(i32),
    /// Run finished, `on_complete` called
    Complete,
}

type FrameCallback = Box<dyn FnMut(i32)>;
type CompleteCallback = Box<dyn FnOnce()>;

/// In-flight playback run
struct Run {
    range: PlaybackRange,
    frame_year: i32,
    last_tick: Option<f64>,
    pending: Option<TickHandle>,
    on_frame: FrameCallback,
    on_complete: CompleteCallback,
}

/// Time-driven year sequencer.
pub struct FrameSequencer<T: TickSource = TickQueue> {
    ticks: T,
    frame_duration: FrameDuration,
    run: Option<Run>,
}

impl<T: TickSource> FrameSequencer<T> {
    pub fn new(ticks: T, frame_duration: FrameDuration) -> Self {
        Self {
            ticks,
            frame_duration,
            run: None,
        }
    }

    pub fn frame_duration(&self) -> FrameDuration {
        self.frame_duration
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    pub fn ticks_mut(&mut self) -> &mut T {
        &mut self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        match &self.run {
            None => PlaybackState::Idle,
            Some(run) => PlaybackState::Running {
                frame_year: run.frame_year,
                last_tick_timestamp: run.last_tick,
            },
        }
    }

    /// Range of the current run, if any
    pub fn range(&self) -> Option<PlaybackRange> {
        self.run.as_ref().map(|r| r.range)
    }

    /// Start playback of `start_year..=end_year`.
    ///
    /// Emits `start_year` immediately. Restarts if already running; the old
    /// run's pending tick is cancelled and its callbacks are dropped unused.
    pub fn start<F, C>(
        &mut self,
        start_year: i32,
        end_year: i32,
        on_frame: F,
        on_complete: C,
    ) -> Result<(), SequencerError>
    where
        F: FnMut(i32) + 'static,
        C: FnOnce() + 'static,
    {
        let range = PlaybackRange::new(start_year, end_year)?;
        self.start_range(range, on_frame, on_complete);
        Ok(())
    }

    /// Start playback of a pre-validated range.
    pub fn start_range<F, C>(&mut self, range: PlaybackRange, on_frame: F, on_complete: C)
    where
        F: FnMut(i32) + 'static,
        C: FnOnce() + 'static,
    {
        if self.is_running() {
            debug!("Sequencer restart, discarding previous run");
            self.stop();
        }

        let mut run = Run {
            range,
            frame_year: range.start_year(),
            last_tick: None,
            pending: None,
            on_frame: Box::new(on_frame),
            on_complete: Box::new(on_complete),
        };
        debug!(
            "Sequencer started: {}..={} ({} frames) at {}ms/frame",
            range.start_year(),
            range.end_year(),
            range.len(),
            self.frame_duration.as_millis()
        );

        (run.on_frame)(run.frame_year);
        run.pending = Some(self.ticks.schedule_tick());
        self.run = Some(run);
    }

    /// Cancel playback without calling `on_complete`. No-op when idle.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            if let Some(handle) = run.pending {
                self.ticks.cancel_tick(handle);
            }
            debug!("Sequencer stopped at year {}", run.frame_year);
        }
    }

    /// Handle a fired tick carrying `handle` at timestamp `now` (ms).
    pub fn on_tick(&mut self, handle: TickHandle, now: f64) -> TickOutcome {
        let Some(run) = self.run.as_mut() else {
            trace!("Tick {} ignored: sequencer idle", handle.id());
            return TickOutcome::Ignored;
        };
        if run.pending != Some(handle) {
            trace!("Tick {} ignored: stale handle", handle.id());
            return TickOutcome::Ignored;
        }
        run.pending = None;

        let finished = match run.last_tick {
            None => {
                run.last_tick = Some(now);
                // Single-year range: nothing left to pace
                run.frame_year >= run.range.end_year()
            }
            Some(last) => {
                let duration = self.frame_duration.as_millis();
                let elapsed = now - last;
                if elapsed <= duration {
                    false
                } else {
                    run.last_tick = Some(last + (elapsed - elapsed % duration));
                    if run.frame_year < run.range.end_year() {
                        run.frame_year += 1;
                        let year = run.frame_year;
                        trace!("Sequencer frame {} at {:.1}ms", year, now);
                        (run.on_frame)(year);
                        run.pending = Some(self.ticks.schedule_tick());
                        return TickOutcome::Frame(year);
                    }
                    true
                }
            }
        };

        if finished {
            if let Some(run) = self.run.take() {
                debug!("Sequencer reached end year {}", run.frame_year);
                (run.on_complete)();
            }
            return TickOutcome::Complete;
        }

        run.pending = Some(self.ticks.schedule_tick());
        TickOutcome::Waiting
    }
}

impl FrameSequencer<TickQueue> {
    /// Fire every tick due on this refresh. Returns the last meaningful outcome.
    pub fn refresh(&mut self, now: f64) -> TickOutcome {
        let mut outcome = TickOutcome::Ignored;
        for handle in self.ticks.take_due() {
            match self.on_tick(handle, now) {
                TickOutcome::Ignored => {}
                other => outcome = other,
            }
        }
        outcome
    }
}

impl Default for FrameSequencer<TickQueue> {
    fn default() -> Self {
        Self::new(TickQueue::new(), FrameDuration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Records emitted years and completion count
    #[derive(Default, Clone)]
    struct Recorder {
        frames: Rc<RefCell<Vec<i32>>>,
        completed: Rc<Cell<u32>>,
    }

    impl Recorder {
        fn start(
            &self,
            seq: &mut FrameSequencer,
            start: i32,
            end: i32,
        ) -> Result<(), SequencerError> {
            let frames = Rc::clone(&self.frames);
            let completed = Rc::clone(&self.completed);
            seq.start(
                start,
                end,
                move |y| frames.borrow_mut().push(y),
                move || completed.set(completed.get() + 1),
            )
        }

        fn frames(&self) -> Vec<i32> {
            self.frames.borrow().clone()
        }

        fn completed(&self) -> u32 {
            self.completed.get()
        }
    }

    fn sequencer() -> FrameSequencer {
        FrameSequencer::default()
    }

    /// Drive ticks every `step` ms until the run completes
    fn run_to_end(seq: &mut FrameSequencer, step: f64) -> usize {
        let mut now = 0.0;
        let mut ticks = 0;
        while seq.is_running() {
            seq.refresh(now);
            now += step;
            ticks += 1;
            assert!(ticks < 100_000, "sequencer never completed");
        }
        ticks
    }

    #[test]
    fn test_full_range_in_order() {
        let mut seq = sequencer();
        let rec = Recorder::default();
        rec.start(&mut seq, 2000, 2010).unwrap();
        run_to_end(&mut seq, 16.7);

        assert_eq!(rec.frames(), (2000..=2010).collect::<Vec<_>>());
        assert_eq!(rec.completed(), 1);
        assert_eq!(seq.state(), PlaybackState::Idle);
        assert_eq!(seq.ticks().pending_len(), 0);
    }

    #[test]
    fn test_reference_scenario() {
        let mut seq = sequencer();
        let rec = Recorder::default();
        rec.start(&mut seq, 2020, 2023).unwrap();
        assert_eq!(rec.frames(), vec![2020]);

        assert_eq!(seq.refresh(0.0), TickOutcome::Waiting);
        assert_eq!(seq.refresh(1001.0), TickOutcome::Frame(2021));
        assert_eq!(seq.refresh(2005.0), TickOutcome::Frame(2022));
        assert_eq!(seq.refresh(2999.0), TickOutcome::Waiting);
        assert_eq!(seq.refresh(4100.0), TickOutcome::Frame(2023));
        assert_eq!(rec.completed(), 0);

        assert_eq!(seq.refresh(5101.0), TickOutcome::Complete);
        assert_eq!(rec.frames(), vec![2020, 2021, 2022, 2023]);
        assert_eq!(rec.completed(), 1);
        assert!(!seq.is_running());
    }

    #[test]
    fn test_single_year_completes_on_first_tick() {
        let mut seq = sequencer();
        let rec = Recorder::default();
        rec.start(&mut seq, 2025, 2025).unwrap();

        assert_eq!(rec.frames(), vec![2025]);
        assert_eq!(seq.refresh(0.0), TickOutcome::Complete);
        assert_eq!(rec.frames(), vec![2025]);
        assert_eq!(rec.completed(), 1);
    }

    #[test]
    fn test_invalid_range_fires_nothing() {
        let mut seq = sequencer();
        let rec = Recorder::default();
        let err = rec.start(&mut seq, 2010, 2005).unwrap_err();

        assert_eq!(err, SequencerError::InvalidRange { start: 2010, end: 2005 });
        assert!(rec.frames().is_empty());
        assert_eq!(rec.completed(), 0);
        assert!(!seq.is_running());
        assert_eq!(seq.ticks().pending_len(), 0);
    }

    #[test]
    fn test_no_premature_frame() {
        let mut seq = sequencer();
        let rec = Recorder::default();
        rec.start(&mut seq, 2000, 2005).unwrap();

        seq.refresh(100.0);
        for t in [200.0, 600.0, 1000.0, 1100.0] {
            assert_eq!(seq.refresh(t), TickOutcome::Waiting);
        }
        // Exactly on the boundary is still not past it
        assert_eq!(rec.frames(), vec![2000]);
        assert_eq!(seq.refresh(1100.5), TickOutcome::Frame(2001));
    }

    #[test]
    fn test_stalled_source_advances_one_year() {
        let mut seq = sequencer();
        let rec = Recorder::default();
        rec.start(&mut seq, 2000, 2010).unwrap();

        seq.refresh(0.0);
        // 5.5 periods elapse in one callback
        assert_eq!(seq.refresh(5500.0), TickOutcome::Frame(2001));
        assert_eq!(
            seq.state(),
            PlaybackState::Running {
                frame_year: 2001,
                last_tick_timestamp: Some(5000.0),
            }
        );

        // Baseline stays on the grid: 6000.0 is exactly one period later
        assert_eq!(seq.refresh(6000.0), TickOutcome::Waiting);
        assert_eq!(seq.refresh(6000.1), TickOutcome::Frame(2002));
        assert_eq!(rec.frames(), vec![2000, 2001, 2002]);
    }

    #[test]
    fn test_stop_ignores_already_scheduled_tick() {
        let mut seq = sequencer();
        let rec = Recorder::default();
        rec.start(&mut seq, 2000, 2005).unwrap();
        seq.refresh(0.0);

        // Grab the pending handle as if the environment already queued it
        let stale = seq.ticks_mut().take_due();
        assert_eq!(stale.len(), 1);

        seq.stop();
        assert!(!seq.is_running());
        assert_eq!(seq.on_tick(stale[0], 5000.0), TickOutcome::Ignored);

        assert_eq!(rec.frames(), vec![2000]);
        assert_eq!(rec.completed(), 0);

        // Second stop is a no-op
        seq.stop();
        assert_eq!(seq.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_restart_discards_previous_run() {
        let mut seq = sequencer();
        let first = Recorder::default();
        first.start(&mut seq, 2000, 2010).unwrap();
        seq.refresh(0.0);
        seq.refresh(1500.0);
        let stale = seq.ticks_mut().take_due();

        let second = Recorder::default();
        second.start(&mut seq, 2015, 2016).unwrap();
        assert_eq!(seq.range(), Some(PlaybackRange::new(2015, 2016).unwrap()));
        assert_eq!(seq.on_tick(stale[0], 9000.0), TickOutcome::Ignored);

        run_to_end(&mut seq, 100.0);
        assert_eq!(first.frames(), vec![2000, 2001]);
        assert_eq!(first.completed(), 0);
        assert_eq!(second.frames(), vec![2015, 2016]);
        assert_eq!(second.completed(), 1);
    }

    #[test]
    fn test_custom_frame_duration() {
        let mut seq = FrameSequencer::new(TickQueue::new(), FrameDuration::from_millis(250.0));
        let rec = Recorder::default();
        rec.start(&mut seq, 1, 3).unwrap();

        seq.refresh(0.0);
        assert_eq!(seq.refresh(251.0), TickOutcome::Frame(2));
        assert_eq!(seq.refresh(501.0), TickOutcome::Frame(3));
        assert_eq!(seq.refresh(751.0), TickOutcome::Complete);
    }

    #[test]
    fn test_frame_duration_rejects_nonsense() {
        assert_eq!(FrameDuration::from_millis(0.0), FrameDuration::default());
        assert_eq!(FrameDuration::from_millis(f64::NAN), FrameDuration::default());
        assert_eq!(FrameDuration::from_millis(40.0).as_millis(), 40.0);
    }

    #[test]
    fn test_range_len() {
        assert_eq!(PlaybackRange::new(2000, 2025).unwrap().len(), 26);
        assert_eq!(PlaybackRange::new(7, 7).unwrap().len(), 1);
        // Widest valid range does not overflow
        let widest = PlaybackRange::new(i32::MIN, i32::MAX).unwrap();
        assert_eq!(widest.len(), 1u64 << 32);
    }
}
