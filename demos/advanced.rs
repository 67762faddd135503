//! Threaded compass demonstration
//!
//! Runs the full engine the way a handheld app would: a simulated sensor
//! platform delivers samples on its own thread, a location fix switches the
//! display to true north, a magnet is briefly held near the device and the
//! animation loop renders to the terminal.
//!
//! Features demonstrated:
//! - Configuration from JSON
//! - Sensor registration through a `SensorHost`
//! - Declination from the built-in geomagnetic model
//! - Interference detection
//! - The fixed-rate animation thread and its frame statistics
//!
//! Run with: `RUST_LOG=debug cargo run --example advanced`

use fusion_compass::{
    Compass, CompassConfig, CompassView, LocationFix, RenderPayload, SensorHost, SensorSample, SubscriptionRequest,
};
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const CONFIG: &str = r#"{
    "jitter": { "change_threshold": 5.0, "repeat_threshold": 40 },
    "needle": { "speed_modifier": 0.26, "accel_rate": 0.9 },
    "frame": { "target_fps": 30 }
}"#;

const SENSOR_PERIOD: Duration = Duration::from_millis(60); // roughly the UI sensor rate
const RUN_TIME: Duration = Duration::from_secs(6);

/// Sensor platform that only delivers while subscribed
#[derive(Clone, Default)]
struct SimulatedPlatform {
    delivering: Arc<AtomicBool>,
}

impl SensorHost for SimulatedPlatform {
    fn subscribe(&self, request: &SubscriptionRequest) {
        println!(
            "Platform: subscribing {:?} at {:?} rate, location every {} s / {} km",
            request.sensors,
            request.sensor_rate,
            request.location.min_interval_ms / 1000,
            request.location.min_distance_m / 1000.0
        );
        self.delivering.store(true, Ordering::SeqCst);
    }

    fn unsubscribe(&self) {
        println!("Platform: unsubscribed");
        self.delivering.store(false, Ordering::SeqCst);
    }
}

/// Device turning slowly clockwise, with a magnet nearby between 3 and 4 seconds
fn simulated_sample(elapsed: Duration) -> (SensorSample, SensorSample) {
    let seconds = elapsed.as_secs_f32();
    let heading = (seconds * 25.0).to_radians();
    let (sin, cos) = heading.sin_cos();

    let magnet = if (3.0..4.0).contains(&seconds) { 45.0 } else { 0.0 };
    let accelerometer = SensorSample::accelerometer(0.0, 0.0, 9.81);
    let magnetic = SensorSample::magnetic(-22.0 * sin + magnet, 22.0 * cos + magnet, -40.0 - magnet);
    (accelerometer, magnetic)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    println!("Advanced compass example - threaded engine with terminal output");

    let config = CompassConfig::from_json(CONFIG)?;
    let platform = SimulatedPlatform::default();
    let compass = Arc::new(Compass::with_config(&config, platform.clone()));

    let mut frame = 0u64;
    let view = CompassView::new(Arc::clone(&compass), &config, move |payload: &RenderPayload| {
        frame += 1;
        if frame % 15 == 0 {
            println!(
                "{:>8} | needle {:6.1} | {} | {:4.1} fps | {}",
                payload.bearing_text, payload.needle_angle, payload.declination_text, payload.fps, payload.status_text
            );
        }
    });

    compass.register();
    let start = Instant::now();
    let sensors = {
        let compass = Arc::clone(&compass);
        let delivering = Arc::clone(&platform.delivering);
        thread::spawn(move || {
            while start.elapsed() < RUN_TIME {
                if delivering.load(Ordering::SeqCst) {
                    let (accelerometer, magnetic) = simulated_sample(start.elapsed());
                    compass.on_sensor_sample(accelerometer);
                    compass.on_sensor_sample(magnetic);
                }
                thread::sleep(SENSOR_PERIOD);
            }
        })
    };

    view.start_animation()?;

    thread::sleep(Duration::from_secs(2));
    // Greenwich, November 2023
    compass.on_location_fix(LocationFix::new(51.4769, -0.0005, 46.0, 1_700_000_000_000));
    view.set_use_true_north(true);
    println!("Switched to true north, declination {:.2}°", compass.declination());

    thread::sleep(RUN_TIME.saturating_sub(start.elapsed()));
    compass.unregister();
    thread::sleep(Duration::from_millis(200));

    if let Some(stats) = view.stop_animation()? {
        println!(
            "Rendered {} frames in {:.2} s, average {:.1} fps",
            stats.frames,
            stats.total_time.as_secs_f32(),
            stats.average_fps()
        );
    }

    if sensors.join().is_err() {
        return Err("sensor thread panicked".into());
    }
    Ok(())
}
