use fusion_compass::{BearingService, SensorSample, cardinal_from_bearing};

const DECLINATION: f32 = 7.9; // degrees east, e.g. from a location fix

fn main() {
    let mut service = BearingService::new();
    service.set_declination(DECLINATION);

    for step in 0..12 {
        // this loop should repeat each time new sensor data is available
        let heading = (step * 30) as f32; // replace with a real device turning on the spot
        let (sin, cos) = heading.to_radians().sin_cos();

        service.update(SensorSample::accelerometer(0.0, 0.0, 9.81)); // replace with accelerometer data in m/s²
        service.update(SensorSample::magnetic(-22.0 * sin, 22.0 * cos, -40.0)); // replace with magnetometer data in µT

        let magnetic = service.positive_bearing(false);
        let true_north = service.positive_bearing(true);

        println!(
            "Magnetic: {:6.2}  True: {:6.2}  {}",
            magnetic,
            true_north,
            cardinal_from_bearing(true_north)
        );
    }
}
