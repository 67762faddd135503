//! Thread-safe compass shared between sensor callbacks and the render loop

use crate::bearing::BearingService;
use crate::cardinal::cardinal_from_bearing;
use crate::geomagnetic::{GeomagneticField, GeomagneticModel, SphericalHarmonicModel};
use crate::interference::InterferenceClassifier;
use crate::types::{
    CompassConfig, CompassStatus, LocationFix, LocationSettings, SensorAccuracy, SensorKind, SensorRate, SensorSample,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Everything the host needs to start delivering data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscriptionRequest {
    pub sensors: [SensorKind; 2],
    pub sensor_rate: SensorRate,
    pub location: LocationSettings,
}

/// Platform side of sensor and location delivery
///
/// After `subscribe` the host calls back into [`Compass::on_sensor_sample`],
/// [`Compass::on_accuracy_changed`] and [`Compass::on_location_fix`] from any
/// thread. Callbacks may be delivered from inside `subscribe`.
pub trait SensorHost: Send + Sync {
    fn subscribe(&self, request: &SubscriptionRequest);
    fn unsubscribe(&self);
}

#[derive(Debug, Default)]
struct CompassState {
    bearing: BearingService,
    field: Option<GeomagneticField>,
    /// Model total intensity at the last fix, in nanotesla
    expected_strength: Option<f32>,
    location: Option<LocationFix>,
    status: CompassStatus,
}

/// Values the display needs for one frame, read under a single lock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompassSnapshot {
    /// Bearing in `[0, 360)`
    pub positive_bearing: f32,
    pub declination: f32,
    pub status: CompassStatus,
}

/// Sensor fusion, interference detection and declination behind one lock
///
/// # Example
/// ```
/// use fusion_compass::{Compass, CompassStatus, SensorHost, SensorSample, SubscriptionRequest};
///
/// struct Manual;
/// impl SensorHost for Manual {
///     fn subscribe(&self, _request: &SubscriptionRequest) {}
///     fn unsubscribe(&self) {}
/// }
///
/// let compass = Compass::new(Manual);
/// assert!(compass.register());
/// compass.on_sensor_sample(SensorSample::accelerometer(0.0, 0.0, 9.81));
/// compass.on_sensor_sample(SensorSample::magnetic(-22.0, 0.0, -40.0)); // Facing east
///
/// assert_eq!(compass.status(), CompassStatus::Good);
/// assert!((compass.positive_bearing(false) - 90.0).abs() < 0.5);
/// assert_eq!(compass.cardinal(false), "E");
/// ```
pub struct Compass {
    state: Mutex<CompassState>,
    classifier: InterferenceClassifier,
    sensor_rate: SensorRate,
    location_settings: LocationSettings,
    model: Box<dyn GeomagneticModel>,
    host: Box<dyn SensorHost>,
    registered: AtomicBool,
    // Serializes register/unregister without holding the state lock across host calls
    lifecycle: Mutex<()>,
}

impl Compass {
    /// Compass with default settings and the built-in IGRF model
    pub fn new(host: impl SensorHost + 'static) -> Self {
        Self::with_model(&CompassConfig::default(), host, SphericalHarmonicModel::default())
    }

    pub fn with_config(config: &CompassConfig, host: impl SensorHost + 'static) -> Self {
        Self::with_model(config, host, SphericalHarmonicModel::default())
    }

    pub fn with_model(
        config: &CompassConfig,
        host: impl SensorHost + 'static,
        model: impl GeomagneticModel + 'static,
    ) -> Self {
        Self {
            state: Mutex::new(CompassState::default()),
            classifier: InterferenceClassifier::new(config.interference),
            sensor_rate: config.sensors.rate,
            location_settings: config.location,
            model: Box::new(model),
            host: Box::new(host),
            registered: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CompassState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a sensor sample, classifying magnetic samples while registered
    pub fn on_sensor_sample(&self, sample: SensorSample) {
        let mut state = self.state();
        if sample.kind == SensorKind::Magnetic && self.is_active() {
            let expected = self.expected_strength(&state);
            let status = self.classifier.classify(sample.values, expected);
            if status != state.status {
                log::debug!("Compass status {:?} -> {:?}", state.status, status);
            }
            state.status = status;
        }
        state.bearing.update(sample);
    }

    pub fn on_accuracy_changed(&self, kind: SensorKind, accuracy: SensorAccuracy) {
        log::debug!("{:?} accuracy changed to {:?}", kind, accuracy);
        self.state().bearing.set_accuracy(kind, accuracy);
    }

    /// Cache a location fix and recompute the expected geomagnetic field
    ///
    /// Declination and expected strength come from the model's
    /// [`GeomagneticModel::declination`] and [`GeomagneticModel::field_strength`],
    /// so a model overriding either one is honoured.
    pub fn on_location_fix(&self, fix: LocationFix) {
        let time = fix.timestamp_millis;
        let field = self.model.field(&fix, time);
        let declination = self.model.declination(&fix, time);
        let strength = self.model.field_strength(&fix, time);
        log::info!(
            "Location fix ({:.4}, {:.4}): declination {:.1}°, field {:.1} µT",
            fix.latitude,
            fix.longitude,
            declination,
            strength
        );

        let mut state = self.state();
        state.location = Some(fix);
        state.field = Some(field);
        state.expected_strength = Some(strength * 1000.0).filter(|nanotesla| nanotesla.is_finite());
        state.bearing.set_declination(declination);
    }

    /// Subscribe to sensors and location; returns `false` if already registered
    pub fn register(&self) -> bool {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if self.registered.load(Ordering::Acquire) {
            return false;
        }

        // Set before subscribing so samples delivered from inside subscribe are classified
        self.registered.store(true, Ordering::Release);
        self.host.subscribe(&self.subscription_request());
        log::info!("Compass sensors registered");
        true
    }

    /// Stop all subscriptions and mark the compass inactive; returns `false` if not registered
    pub fn unregister(&self) -> bool {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.registered.load(Ordering::Acquire) {
            return false;
        }

        self.host.unsubscribe();
        self.registered.store(false, Ordering::Release);
        self.state().status = CompassStatus::Inactive;
        log::info!("Compass sensors unregistered");
        true
    }

    pub fn is_active(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    pub fn subscription_request(&self) -> SubscriptionRequest {
        SubscriptionRequest {
            sensors: [SensorKind::Magnetic, SensorKind::Accelerometer],
            sensor_rate: self.sensor_rate,
            location: self.location_settings,
        }
    }

    pub fn status(&self) -> CompassStatus {
        self.state().status
    }

    /// Degrees east of true north, 0 until a location fix arrives
    pub fn declination(&self) -> f32 {
        self.state().bearing.declination()
    }

    /// Strength the interference classifier compares readings against
    pub fn expected_field_strength(&self) -> f32 {
        let state = self.state();
        self.expected_strength(&state)
    }

    fn expected_strength(&self, state: &CompassState) -> f32 {
        state
            .expected_strength
            .unwrap_or_else(|| self.classifier.nominal_field_strength())
    }

    pub fn location(&self) -> Option<LocationFix> {
        self.state().location
    }

    pub fn field(&self) -> Option<GeomagneticField> {
        self.state().field
    }

    /// Bearing in `[-180, 180)`
    pub fn bearing(&self, true_north: bool) -> f32 {
        self.state().bearing.bearing(true_north)
    }

    /// Bearing in `[0, 360)`
    pub fn positive_bearing(&self, true_north: bool) -> f32 {
        self.state().bearing.positive_bearing(true_north)
    }

    pub fn cardinal(&self, true_north: bool) -> &'static str {
        cardinal_from_bearing(self.bearing(true_north))
    }

    /// Whether both sensors have produced a usable orientation
    pub fn has_orientation(&self) -> bool {
        self.state().bearing.estimator_mut().orientation().is_some()
    }

    pub fn snapshot(&self, true_north: bool) -> CompassSnapshot {
        let mut state = self.state();
        CompassSnapshot {
            positive_bearing: state.bearing.positive_bearing(true_north),
            declination: state.bearing.declination(),
            status: state.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    enum HostCall {
        Subscribe(SubscriptionRequest),
        Unsubscribe,
    }

    #[derive(Clone, Default)]
    struct RecordingHost {
        calls: Arc<Mutex<Vec<HostCall>>>,
    }

    impl RecordingHost {
        fn calls(&self) -> Vec<HostCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SensorHost for RecordingHost {
        fn subscribe(&self, request: &SubscriptionRequest) {
            self.calls.lock().unwrap().push(HostCall::Subscribe(*request));
        }

        fn unsubscribe(&self) {
            self.calls.lock().unwrap().push(HostCall::Unsubscribe);
        }
    }

    /// Uniform field with fixed declination and strength
    struct FixedModel {
        declination: f32,
    }

    impl GeomagneticModel for FixedModel {
        fn field(&self, _location: &LocationFix, _time_millis: i64) -> GeomagneticField {
            let (sin, cos) = self.declination.to_radians().sin_cos();
            GeomagneticField {
                north: 20_000.0 * cos,
                east: 20_000.0 * sin,
                down: 40_000.0,
            }
        }
    }

    /// Field vector disagrees with the scalar overrides, which take precedence
    struct ScalarModel;

    impl GeomagneticModel for ScalarModel {
        fn field(&self, _location: &LocationFix, _time_millis: i64) -> GeomagneticField {
            GeomagneticField {
                north: 60_000.0,
                east: 0.0,
                down: 0.0,
            }
        }

        fn declination(&self, _location: &LocationFix, _time_millis: i64) -> f32 {
            -5.0
        }

        fn field_strength(&self, _location: &LocationFix, _time_millis: i64) -> f32 {
            30.0
        }
    }

    fn level_compass(host: RecordingHost) -> Compass {
        let compass = Compass::new(host);
        compass.on_sensor_sample(SensorSample::accelerometer(0.0, 0.0, 9.81));
        compass
    }

    #[test]
    fn test_register_is_idempotent() {
        let host = RecordingHost::default();
        let compass = Compass::new(host.clone());

        assert!(compass.register());
        assert!(!compass.register());
        assert!(compass.is_active());
        assert_eq!(host.calls().len(), 1);

        assert!(compass.unregister());
        assert!(!compass.unregister());
        assert!(!compass.is_active());
        assert_eq!(host.calls().len(), 2);
        assert_eq!(host.calls()[1], HostCall::Unsubscribe);
    }

    #[test]
    fn test_subscription_request_uses_location_settings() {
        let host = RecordingHost::default();
        let compass = Compass::new(host.clone());
        compass.register();

        let HostCall::Subscribe(request) = host.calls()[0].clone() else {
            panic!("expected a subscribe call");
        };
        assert_eq!(request.sensor_rate, SensorRate::Ui);
        assert_eq!(request.location.min_interval_ms, 60_000);
        assert_eq!(request.location.min_distance_m, 10_000.0);
    }

    #[test]
    fn test_subscription_request_uses_configured_rate() {
        let host = RecordingHost::default();
        let mut config = CompassConfig::default();
        config.sensors.rate = SensorRate::Game;
        let compass = Compass::with_config(&config, host.clone());

        assert_eq!(compass.subscription_request().sensor_rate, SensorRate::Game);
        compass.register();
        let HostCall::Subscribe(request) = host.calls()[0].clone() else {
            panic!("expected a subscribe call");
        };
        assert_eq!(request.sensor_rate, SensorRate::Game);
    }

    #[test]
    fn test_status_lifecycle() {
        let compass = level_compass(RecordingHost::default());
        assert_eq!(compass.status(), CompassStatus::Inactive);

        compass.register();
        compass.on_sensor_sample(SensorSample::magnetic(10.0, 10.0, 10.0));
        assert_eq!(compass.status(), CompassStatus::Good);

        // 70³ is well over 60³ × 1.05
        compass.on_sensor_sample(SensorSample::magnetic(70.0, 70.0, 70.0));
        assert_eq!(compass.status(), CompassStatus::Interference);

        compass.unregister();
        assert_eq!(compass.status(), CompassStatus::Inactive);
    }

    #[test]
    fn test_samples_while_unregistered_keep_inactive() {
        let compass = level_compass(RecordingHost::default());
        compass.on_sensor_sample(SensorSample::magnetic(70.0, 70.0, 70.0));

        assert_eq!(compass.status(), CompassStatus::Inactive);
        assert!(compass.has_orientation());
    }

    #[test]
    fn test_location_fix_sets_declination() {
        let compass = Compass::with_model(
            &CompassConfig::default(),
            RecordingHost::default(),
            FixedModel { declination: 12.0 },
        );
        compass.on_sensor_sample(SensorSample::accelerometer(0.0, 0.0, 9.81));
        compass.on_sensor_sample(SensorSample::magnetic(0.0, 22.0, -40.0));
        assert_eq!(compass.declination(), 0.0);
        assert_eq!(compass.expected_field_strength(), 216_000.0);

        compass.on_location_fix(LocationFix::new(10.0, 20.0, 0.0, 0));

        assert!((compass.declination() - 12.0).abs() < 1e-3);
        assert!((compass.positive_bearing(true) - 12.0).abs() < 0.5);
        assert!(compass.positive_bearing(false) < 0.5 || compass.positive_bearing(false) > 359.5);
        assert!(compass.location().is_some());
        // sqrt(20000² + 40000²)
        assert!((compass.expected_field_strength() - 44_721.36).abs() < 1.0);
    }

    #[test]
    fn test_location_fix_uses_model_scalars() {
        let compass = Compass::with_model(&CompassConfig::default(), RecordingHost::default(), ScalarModel);
        compass.register();
        compass.on_location_fix(LocationFix::new(10.0, 20.0, 0.0, 0));

        assert!((compass.declination() + 5.0).abs() < 1e-3);
        assert!((compass.expected_field_strength() - 30_000.0).abs() < 1.0);

        // 35³ is over 30000 × 1.05 but far under the field vector's 60000
        compass.on_sensor_sample(SensorSample::accelerometer(0.0, 0.0, 9.81));
        compass.on_sensor_sample(SensorSample::magnetic(35.0, 35.0, 35.0));
        assert_eq!(compass.status(), CompassStatus::Interference);
    }

    #[test]
    fn test_no_data_reads_zero() {
        let compass = Compass::new(RecordingHost::default());
        assert_eq!(compass.bearing(true), 0.0);
        assert_eq!(compass.positive_bearing(false), 0.0);
        assert_eq!(compass.cardinal(false), "N");
        assert!(!compass.has_orientation());
        assert!(compass.field().is_none());
    }

    #[test]
    fn test_snapshot_is_consistent() {
        let compass = level_compass(RecordingHost::default());
        compass.register();
        compass.on_sensor_sample(SensorSample::magnetic(22.0, 0.0, -40.0));

        let snapshot = compass.snapshot(false);
        assert!((snapshot.positive_bearing - 270.0).abs() < 0.5);
        assert_eq!(snapshot.declination, 0.0);
        assert_eq!(snapshot.status, CompassStatus::Good);
    }

    #[test]
    fn test_concurrent_samples_and_reads() {
        let compass = Arc::new(level_compass(RecordingHost::default()));
        compass.register();

        let writer = {
            let compass = Arc::clone(&compass);
            std::thread::spawn(move || {
                for i in 0..500 {
                    let angle = (i as f32).to_radians();
                    compass.on_sensor_sample(SensorSample::magnetic(-22.0 * angle.sin(), 22.0 * angle.cos(), -40.0));
                }
            })
        };

        for _ in 0..500 {
            let bearing = compass.positive_bearing(true);
            assert!((0.0..360.0).contains(&bearing));
        }
        writer.join().unwrap();
    }
}
