//! Frame clocks.
//!
//! The engine never advances time itself; it reads one value per frame from a
//! [`FrameClock`]. The viewer uses [`SystemClock`], tests and benchmarks
//! script exact tick sequences with [`ManualClock`].
//!
//! # Example
//!
//! ```ignore
//! use mandala::clock::{FrameClock, ManualClock};
//!
//! let mut clock = ManualClock::new([0.0, 0.5, 0.9]);
//! assert_eq!(clock.elapsed(), 0.0);
//! assert_eq!(clock.elapsed(), 0.5);
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Source of monotonically increasing elapsed seconds, read once per frame.
pub trait FrameClock {
    /// Seconds since the clock started.
    fn elapsed(&mut self) -> f32;
}

impl<C: FrameClock + ?Sized> FrameClock for Box<C> {
    fn elapsed(&mut self) -> f32 {
        (**self).elapsed()
    }
}

impl<C: FrameClock + ?Sized> FrameClock for &mut C {
    fn elapsed(&mut self) -> f32 {
        (**self).elapsed()
    }
}

/// Wall-clock time since creation, with pause and time scaling.
#[derive(Debug)]
pub struct SystemClock {
    /// When the clock was created.
    start: Instant,
    /// Instant the current pause began, if paused.
    paused_at: Option<Instant>,
    /// Total time spent paused.
    pause_elapsed: Duration,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl SystemClock {
    /// Create a clock starting from now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            paused_at: None,
            pause_elapsed: Duration::ZERO,
            time_scale: 1.0,
        }
    }

    /// Whether time is currently paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Stop time. `elapsed()` holds its value until [`resume`](Self::resume).
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    /// Resume time after pausing.
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.pause_elapsed += paused_at.elapsed();
        }
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set time scale multiplier. Negative values clamp to 0.
    ///
    /// Takes effect for the whole timeline, so changing it mid-run jumps
    /// `elapsed()`; set it before the first frame.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    fn running_duration(&self) -> Duration {
        let end = self.paused_at.unwrap_or_else(Instant::now);
        end.duration_since(self.start).saturating_sub(self.pause_elapsed)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn elapsed(&mut self) -> f32 {
        self.running_duration().as_secs_f32() * self.time_scale
    }
}

/// Plays back a scripted sequence of ticks.
///
/// Once the script runs out the last tick repeats, which the lifecycle
/// manager treats as a stalled frame.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ticks: VecDeque<f32>,
    current: f32,
}

impl ManualClock {
    /// Create a clock that yields `ticks` in order.
    pub fn new(ticks: impl IntoIterator<Item = f32>) -> Self {
        Self {
            ticks: ticks.into_iter().collect(),
            current: 0.0,
        }
    }

    /// A clock ticking every `step` seconds from zero, `frames` times.
    pub fn fixed_rate(step: f32, frames: usize) -> Self {
        Self::new((0..frames).map(|i| i as f32 * step))
    }

    /// Append a tick to the script.
    pub fn push(&mut self, tick: f32) {
        self.ticks.push_back(tick);
    }

    /// Ticks not yet consumed.
    pub fn remaining(&self) -> usize {
        self.ticks.len()
    }
}

impl FrameClock for ManualClock {
    fn elapsed(&mut self) -> f32 {
        if let Some(next) = self.ticks.pop_front() {
            self.current = next;
        }
        self.current
    }
}
