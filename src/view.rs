//! Display state and the animation worker
//!
//! Each tick reads the resolved bearing from the [`Compass`], holds it steady
//! through the [`JitterFilter`], eases the needle towards it and hands a
//! [`RenderPayload`] to the host's [`Renderer`]. The tick runs on a dedicated
//! thread driven by the [`FrameScheduler`].

use crate::cardinal::cardinal_from_bearing;
use crate::error::{CompassError, Result};
use crate::jitter::JitterFilter;
use crate::manager::Compass;
use crate::needle::NeedleAnimator;
use crate::scheduler::{CancellationToken, FrameHandler, FrameScheduler, FrameStats};
use crate::types::{CompassConfig, CompassStatus, FrameSettings};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderPayload {
    /// e.g. `"045° NE"`
    pub bearing_text: String,
    /// e.g. `"variation: 07.9°"`
    pub declination_text: String,
    /// Needle angle in `[0, 360)`
    pub needle_angle: f32,
    pub status_text: &'static str,
    /// Frame rate achieved by the previous frame
    pub fps: f32,
}

/// Host-side drawing surface
///
/// Called from the animation thread once per frame.
pub trait Renderer: Send {
    fn render(&mut self, payload: &RenderPayload);
}

impl<F> Renderer for F
where
    F: FnMut(&RenderPayload) + Send,
{
    fn render(&mut self, payload: &RenderPayload) {
        self(payload)
    }
}

/// Rounded three-digit bearing followed by its compass point
///
/// # Example
/// ```
/// use fusion_compass::view::bearing_text;
///
/// assert_eq!(bearing_text(45.2), "045° NE");
/// assert_eq!(bearing_text(359.7), "000° N");
/// ```
pub fn bearing_text(bearing: f32) -> String {
    let rounded = crate::math::normalize_positive(bearing.round());
    format!("{:03}° {}", rounded as u32 % 360, cardinal_from_bearing(bearing))
}

/// Declination with one decimal and at least two integer digits
pub fn declination_text(declination: f32) -> String {
    // sign follows the displayed tenth so -0.04 prints as 00.0
    let rounded = (declination * 10.0).round() / 10.0;
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("variation: {}{:04.1}°", sign, rounded.abs())
}

pub fn status_text(status: CompassStatus) -> &'static str {
    match status {
        CompassStatus::Good => "",
        CompassStatus::Interference => "INTERFERENCE DETECTED!",
        CompassStatus::Inactive => "COMPASS INACTIVE",
    }
}

struct CompassDisplay {
    compass: Arc<Compass>,
    use_true_north: Arc<AtomicBool>,
    jitter: JitterFilter,
    needle: NeedleAnimator,
    payload: RenderPayload,
    fps: f32,
    renderer: Box<dyn Renderer>,
}

impl CompassDisplay {
    fn use_true_north(&self) -> bool {
        self.use_true_north.load(Ordering::Relaxed)
    }

    fn snap_to_bearing(&mut self) {
        let bearing = self.compass.positive_bearing(self.use_true_north());
        self.jitter.reset(bearing);
        self.needle.reset(bearing);
    }

    fn advance(&mut self) {
        let snapshot = self.compass.snapshot(self.use_true_north());
        let displayed = self.jitter.filter(snapshot.positive_bearing);
        let needle_angle = self.needle.step(displayed);

        self.payload = RenderPayload {
            bearing_text: bearing_text(displayed),
            declination_text: declination_text(snapshot.declination),
            needle_angle,
            status_text: status_text(snapshot.status),
            fps: self.fps,
        };
    }

    fn draw(&mut self) {
        self.renderer.render(&self.payload);
    }
}

/// Frame handler that locks the shared display once per call
struct DisplayLoop {
    display: Arc<Mutex<CompassDisplay>>,
}

impl DisplayLoop {
    fn display(&self) -> MutexGuard<'_, CompassDisplay> {
        lock(&self.display)
    }
}

impl FrameHandler for DisplayLoop {
    // Animation advances one step per tick, so the frame length is not used
    fn update(&mut self, _delta: f32) {
        self.display().advance();
    }

    fn render(&mut self) {
        self.display().draw();
    }

    fn frame_rate(&mut self, fps: f32) {
        self.display().fps = fps;
    }
}

struct Worker {
    token: CancellationToken,
    handle: JoinHandle<FrameStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Animated compass face bound to a shared [`Compass`]
pub struct CompassView {
    compass: Arc<Compass>,
    frame: FrameSettings,
    use_true_north: Arc<AtomicBool>,
    display: Arc<Mutex<CompassDisplay>>,
    worker: Mutex<Option<Worker>>,
}

impl CompassView {
    pub fn new(compass: Arc<Compass>, config: &CompassConfig, renderer: impl Renderer + 'static) -> Self {
        let use_true_north = Arc::new(AtomicBool::new(false));
        let display = CompassDisplay {
            compass: Arc::clone(&compass),
            use_true_north: Arc::clone(&use_true_north),
            jitter: JitterFilter::new(config.jitter),
            needle: NeedleAnimator::new(config.needle),
            payload: RenderPayload::default(),
            fps: 0.0,
            renderer: Box::new(renderer),
        };

        Self {
            compass,
            frame: config.frame,
            use_true_north,
            display: Arc::new(Mutex::new(display)),
            worker: Mutex::new(None),
        }
    }

    pub fn compass(&self) -> &Arc<Compass> {
        &self.compass
    }

    pub fn set_use_true_north(&self, use_true_north: bool) {
        self.use_true_north.store(use_true_north, Ordering::Relaxed);
    }

    pub fn use_true_north(&self) -> bool {
        self.use_true_north.load(Ordering::Relaxed)
    }

    /// Most recent payload; empty until the first tick
    pub fn payload(&self) -> RenderPayload {
        lock(&self.display).payload.clone()
    }

    /// Run one update and render on the calling thread
    pub fn tick(&self) {
        let mut display = lock(&self.display);
        display.advance();
        display.draw();
    }

    pub fn is_animating(&self) -> bool {
        lock(&self.worker).is_some()
    }

    /// Snap the needle to the current bearing and start the animation thread
    ///
    /// Does nothing if the animation is already running.
    pub fn start_animation(&self) -> Result<()> {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            return Ok(());
        }

        lock(&self.display).snap_to_bearing();

        let token = CancellationToken::new();
        let scheduler = FrameScheduler::new(self.frame, token.clone());
        let mut handler = DisplayLoop {
            display: Arc::clone(&self.display),
        };
        let handle = std::thread::Builder::new()
            .name("compass-animation".to_string())
            .spawn(move || scheduler.run(&mut handler))?;

        log::info!("Compass animation started at {} fps", self.frame.target_fps);
        *worker = Some(Worker { token, handle });
        Ok(())
    }

    /// Stop the animation thread and wait for it to finish its current frame
    ///
    /// Returns `None` if the animation was not running.
    pub fn stop_animation(&self) -> Result<Option<FrameStats>> {
        let Some(worker) = lock(&self.worker).take() else {
            return Ok(None);
        };

        worker.token.cancel();
        let stats = worker.handle.join().map_err(|_| CompassError::AnimationPanicked)?;
        log::info!(
            "Compass animation stopped: {} frames, average {:.1} fps",
            stats.frames,
            stats.average_fps()
        );
        Ok(Some(stats))
    }
}

impl Drop for CompassView {
    fn drop(&mut self) {
        if let Err(error) = self.stop_animation() {
            log::warn!("Compass animation did not stop cleanly: {}", error);
        }
    }
}
