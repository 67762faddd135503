//! Fixed-rate update/render loop
//!
//! The loop targets `target_fps` by sleeping whatever is left of the frame
//! period after update and render, but never less than a minimum sleep so
//! the worker always yields. Stopping is cooperative: the cancellation token
//! is checked at the top of each iteration, so shutdown takes at most one
//! frame.

use crate::types::FrameSettings;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Time source for the scheduler
pub trait Clock: Send {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Shared stop flag polled by the loop
///
/// Clones observe the same flag. Cancelling does not interrupt a sleep in
/// progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Work performed once per frame
pub trait FrameHandler {
    /// Advance state; `delta` is the previous frame's length in target periods
    fn update(&mut self, delta: f32);

    fn render(&mut self);

    /// Frame rate achieved by the frame that just rendered
    fn frame_rate(&mut self, _fps: f32) {}
}

/// Sleep arithmetic for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    target_period: Duration,
    minimum_sleep: Duration,
}

impl FrameTiming {
    pub fn new(settings: FrameSettings) -> Self {
        Self {
            target_period: Duration::from_secs(1) / settings.target_fps.max(1),
            minimum_sleep: Duration::from_millis(settings.minimum_sleep_ms),
        }
    }

    pub fn target_period(&self) -> Duration {
        self.target_period
    }

    pub fn minimum_sleep(&self) -> Duration {
        self.minimum_sleep
    }

    /// Remainder of the frame period, floored at the minimum sleep
    pub fn sleep_for(&self, elapsed: Duration) -> Duration {
        self.target_period.saturating_sub(elapsed).max(self.minimum_sleep)
    }

    /// Frames per second for a frame of the given total length
    pub fn fps(frame: Duration) -> f32 {
        let seconds = frame.as_secs_f32();
        if seconds > 0.0 { 1.0 / seconds } else { 0.0 }
    }
}

/// Totals accumulated over one run of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frames: u64,
    /// Sum of frame lengths including sleep
    pub total_time: Duration,
}

impl FrameStats {
    /// Average frames per second, 0 when no time has been recorded
    pub fn average_fps(&self) -> f32 {
        let seconds = self.total_time.as_secs_f32();
        if seconds > 0.0 { self.frames as f32 / seconds } else { 0.0 }
    }

    fn record(&mut self, frame: Duration) {
        self.frames += 1;
        self.total_time += frame;
    }
}

/// Runs a [`FrameHandler`] at a fixed target rate until cancelled
///
/// # Example
/// ```
/// use fusion_compass::{CancellationToken, FrameHandler, FrameScheduler, FrameSettings};
///
/// struct Countdown {
///     remaining: u32,
///     token: CancellationToken,
/// }
///
/// impl FrameHandler for Countdown {
///     fn update(&mut self, _delta: f32) {
///         self.remaining -= 1;
///         if self.remaining == 0 {
///             self.token.cancel();
///         }
///     }
///     fn render(&mut self) {}
/// }
///
/// let token = CancellationToken::new();
/// let settings = FrameSettings { target_fps: 100, minimum_sleep_ms: 1 };
/// let scheduler = FrameScheduler::new(settings, token.clone());
/// let stats = scheduler.run(&mut Countdown { remaining: 3, token });
/// assert_eq!(stats.frames, 3);
/// ```
pub struct FrameScheduler<C: Clock = SystemClock> {
    timing: FrameTiming,
    token: CancellationToken,
    clock: C,
}

impl FrameScheduler<SystemClock> {
    pub fn new(settings: FrameSettings, token: CancellationToken) -> Self {
        Self::with_clock(settings, token, SystemClock)
    }
}

impl<C: Clock> FrameScheduler<C> {
    pub fn with_clock(settings: FrameSettings, token: CancellationToken, clock: C) -> Self {
        Self {
            timing: FrameTiming::new(settings),
            token,
            clock,
        }
    }

    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Loop until the token is cancelled and return the accumulated stats
    pub fn run<H: FrameHandler + ?Sized>(&self, handler: &mut H) -> FrameStats {
        let mut stats = FrameStats::default();
        let mut delta = 1.0;
        let period = self.timing.target_period.as_secs_f32();

        while !self.token.is_cancelled() {
            let start = self.clock.now();

            handler.update(delta);
            handler.render();

            let elapsed = self.clock.now().saturating_duration_since(start);
            let sleep = self.timing.sleep_for(elapsed);
            let frame = sleep + elapsed;

            handler.frame_rate(FrameTiming::fps(frame));
            stats.record(frame);
            delta = frame.as_secs_f32() / period;

            self.clock.sleep(sleep);
        }

        log::debug!(
            "Frame loop stopped after {} frames in {:?}",
            stats.frames,
            stats.total_time
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Clock that only moves when told to
    #[derive(Clone)]
    struct ManualClock {
        base: Instant,
        offset: Arc<Mutex<Duration>>,
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
                sleeps: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn advance(&self, duration: Duration) {
            *self.offset.lock().unwrap() += duration;
        }

        fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration);
        }
    }

    /// Handler that takes a fixed amount of time per frame and stops after a frame budget
    struct BusyHandler {
        clock: ManualClock,
        work: Duration,
        frames_left: u32,
        token: CancellationToken,
        calls: Vec<&'static str>,
        rates: Vec<f32>,
        deltas: Vec<f32>,
    }

    impl BusyHandler {
        fn new(clock: ManualClock, work: Duration, frames: u32, token: CancellationToken) -> Self {
            Self {
                clock,
                work,
                frames_left: frames,
                token,
                calls: Vec::new(),
                rates: Vec::new(),
                deltas: Vec::new(),
            }
        }
    }

    impl FrameHandler for BusyHandler {
        fn update(&mut self, delta: f32) {
            self.calls.push("update");
            self.deltas.push(delta);
            self.clock.advance(self.work);
        }

        fn render(&mut self) {
            self.calls.push("render");
            self.frames_left -= 1;
            if self.frames_left == 0 {
                self.token.cancel();
            }
        }

        fn frame_rate(&mut self, fps: f32) {
            self.rates.push(fps);
        }
    }

    fn run_frames(settings: FrameSettings, work: Duration, frames: u32) -> (FrameStats, BusyHandler, ManualClock) {
        let clock = ManualClock::new();
        let token = CancellationToken::new();
        let scheduler = FrameScheduler::with_clock(settings, token.clone(), clock.clone());
        let mut handler = BusyHandler::new(clock.clone(), work, frames, token);
        let stats = scheduler.run(&mut handler);
        (stats, handler, clock)
    }

    #[test]
    fn test_sleep_fills_remaining_period() {
        let timing = FrameTiming::new(FrameSettings::default());
        let sleep = timing.sleep_for(Duration::from_millis(5));
        // 33.3 ms - 5 ms
        assert!(sleep > Duration::from_millis(28) && sleep < Duration::from_millis(29));
    }

    #[test]
    fn test_sleep_floor_applies_under_load() {
        let timing = FrameTiming::new(FrameSettings::default());
        assert_eq!(timing.sleep_for(Duration::from_millis(30)), Duration::from_millis(10));
        assert_eq!(timing.sleep_for(Duration::from_millis(50)), Duration::from_millis(10));
        assert!(timing.sleep_for(Duration::from_millis(20)) > Duration::from_millis(10));
    }

    #[test]
    fn test_zero_fps_does_not_divide_by_zero() {
        let timing = FrameTiming::new(FrameSettings {
            target_fps: 0,
            minimum_sleep_ms: 10,
        });
        assert_eq!(timing.target_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_loop_calls_update_then_render() {
        let (stats, handler, _) = run_frames(FrameSettings::default(), Duration::from_millis(5), 3);
        assert_eq!(stats.frames, 3);
        assert_eq!(
            handler.calls,
            vec!["update", "render", "update", "render", "update", "render"]
        );
    }

    #[test]
    fn test_reported_fps_matches_target() {
        let (stats, handler, clock) = run_frames(FrameSettings::default(), Duration::from_millis(5), 10);

        for fps in &handler.rates {
            assert!((fps - 30.0).abs() < 0.1, "fps {} should be ~30", fps);
        }
        for sleep in clock.sleeps() {
            assert!(sleep > Duration::from_millis(28) && sleep < Duration::from_millis(29));
        }
        assert!((stats.average_fps() - 30.0).abs() < 0.1);
        assert!((handler.deltas[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_overloaded_frames_slow_down() {
        let (stats, handler, clock) = run_frames(FrameSettings::default(), Duration::from_millis(40), 4);

        assert!(clock.sleeps().iter().all(|&sleep| sleep == Duration::from_millis(10)));
        // 40 ms work + 10 ms floor
        assert!(handler.rates.iter().all(|fps| (fps - 20.0).abs() < 0.01));
        assert_eq!(stats.total_time, Duration::from_millis(200));
        assert!(handler.deltas[1] > 1.0);
    }

    #[test]
    fn test_cancelled_before_start_runs_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::with_clock(FrameSettings::default(), token.clone(), clock.clone());
        let mut handler = BusyHandler::new(clock, Duration::ZERO, 1, token);

        let stats = scheduler.run(&mut handler);
        assert_eq!(stats, FrameStats::default());
        assert!(handler.calls.is_empty());
        assert_eq!(stats.average_fps(), 0.0);
    }

    #[test]
    fn test_cancel_finishes_current_frame() {
        // Cancelled during render: the sleep for that frame still happens
        let (stats, _, clock) = run_frames(FrameSettings::default(), Duration::from_millis(5), 1);
        assert_eq!(stats.frames, 1);
        assert_eq!(clock.sleeps().len(), 1);
    }

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
