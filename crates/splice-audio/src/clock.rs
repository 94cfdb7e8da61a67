//! Presentation clocks.
//!
//! A presentation clock answers "which point of the source timeline is
//! being presented right now". It is an anchor `(base_time, seek_time)`
//! extrapolated by the play speed. Every consumer that must stay in sync
//! with playback (video renderers, UI) reads the same clock.

use std::sync::OnceLock;
use std::time::Instant;

use parking_lot::Mutex;
use splice_core::Rational;
use tracing::debug;

/// Nanoseconds on the process-wide monotonic clock.
///
/// Devices report hardware timestamps on this clock, so clock anchors taken
/// from a device and wall-clock reads can be compared directly.
pub fn monotonic_ns() -> i64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as i64
}

/// Read side of a presentation clock.
pub trait PresentationClock: Send + Sync {
    /// Current presentation time in nanoseconds.
    fn presentation_time(&self) -> i64;

    /// Current play speed. `0/1` when stopped.
    fn speed(&self) -> Rational;
}

/// Control side of a presentation clock.
pub trait ClockControl: PresentationClock {
    /// Jump to `time` and set the play speed in one step.
    fn set(&self, speed: Rational, time: i64);

    /// Jump to `time`, keeping the current speed.
    fn seek(&self, time: i64);

    /// Resume from the current presentation time at `speed`.
    fn play(&self, speed: Rational);

    /// Freeze at the current presentation time.
    fn stop(&self);
}

/// The four fields of a presentation clock.
///
/// Owners keep this behind a single lock and rewrite it as a whole, so a
/// reader never sees a half-updated anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    /// Monotonic time (ns) at which `seek_time` was being presented.
    pub base_time: i64,
    /// Source timeline position (ns) at `base_time`.
    pub seek_time: i64,
    pub speed: Rational,
    pub stopped: bool,
}

impl ClockState {
    /// A stopped clock parked at `seek_time`.
    pub fn stopped_at(seek_time: i64, now: i64) -> Self {
        Self {
            base_time: now,
            seek_time,
            speed: Rational::ZERO,
            stopped: true,
        }
    }

    /// Extrapolate to monotonic time `now`.
    #[inline]
    pub fn presentation_time(&self, now: i64) -> i64 {
        if self.stopped || self.speed.is_zero() {
            return self.seek_time;
        }
        self.seek_time + self.speed.scale(now - self.base_time)
    }

    /// Move the anchor to `now` without changing the presented time.
    #[inline]
    pub fn reanchor(&mut self, now: i64) {
        self.seek_time = self.presentation_time(now);
        self.base_time = now;
    }
}

/// Presentation clock driven by the monotonic clock alone.
///
/// Used for video-only playback where no audio device paces time.
pub struct SystemPresentationClock {
    state: Mutex<ClockState>,
}

impl SystemPresentationClock {
    /// A stopped clock at time zero.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState::stopped_at(0, monotonic_ns())),
        }
    }

    /// Snapshot of the clock fields.
    pub fn state(&self) -> ClockState {
        *self.state.lock()
    }
}

impl Default for SystemPresentationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationClock for SystemPresentationClock {
    fn presentation_time(&self) -> i64 {
        let state = *self.state.lock();
        state.presentation_time(monotonic_ns())
    }

    fn speed(&self) -> Rational {
        self.state.lock().speed
    }
}

impl ClockControl for SystemPresentationClock {
    fn set(&self, speed: Rational, time: i64) {
        let mut state = self.state.lock();
        *state = ClockState {
            base_time: monotonic_ns(),
            seek_time: time,
            speed,
            stopped: speed.is_zero(),
        };
    }

    fn seek(&self, time: i64) {
        let mut state = self.state.lock();
        state.base_time = monotonic_ns();
        state.seek_time = time;
    }

    fn play(&self, speed: Rational) {
        let mut state = self.state.lock();
        state.reanchor(monotonic_ns());
        state.speed = speed;
        state.stopped = speed.is_zero();
        debug!(speed = %speed, time = state.seek_time, "system clock play");
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.reanchor(monotonic_ns());
        state.speed = Rational::ZERO;
        state.stopped = true;
    }
}
