//! Cached orientation estimate from the latest accelerometer and magnetometer samples

use crate::compass::{orientation, rotation_matrix};
use crate::math::RAD_TO_DEG;
use crate::types::{OrientationVector, SensorAccuracy, SensorKind, SensorSample};
use nalgebra::Vector3;

/// Latest-sample orientation estimator
///
/// Stores the newest vector of each sensor kind and recomputes the
/// orientation lazily: samples only mark the estimate dirty, and the
/// rotation matrix is rebuilt on the next read. Sensors report far more often
/// than the render loop reads, so most samples never cost any trigonometry.
///
/// # Example
/// ```
/// use fusion_compass::{OrientationEstimator, SensorSample};
///
/// let mut estimator = OrientationEstimator::new();
/// assert_eq!(estimator.bearing(), 0.0);
/// assert!(estimator.orientation().is_none());
///
/// estimator.update(SensorSample::accelerometer(0.0, 0.0, 9.81));
/// estimator.update(SensorSample::magnetic(-22.0, 0.0, -40.0));
/// assert!((estimator.bearing() - 90.0).abs() < 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrientationEstimator {
    magnetic: Option<Vector3<f32>>,
    accelerometer: Option<Vector3<f32>>,
    magnetic_accuracy: SensorAccuracy,
    accelerometer_accuracy: SensorAccuracy,
    /// Set by every sample, cleared by recomputation
    dirty: bool,
    cached: Option<OrientationVector>,
}

impl OrientationEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored vector for the sample's kind and mark the estimate dirty
    pub fn update(&mut self, sample: SensorSample) {
        match sample.kind {
            SensorKind::Magnetic => {
                self.magnetic = Some(sample.values);
                self.magnetic_accuracy = sample.accuracy;
            }
            SensorKind::Accelerometer => {
                self.accelerometer = Some(sample.values);
                self.accelerometer_accuracy = sample.accuracy;
            }
        }
        self.dirty = true;
    }

    /// Record an accuracy change without a new reading
    pub fn set_accuracy(&mut self, kind: SensorKind, accuracy: SensorAccuracy) {
        match kind {
            SensorKind::Magnetic => self.magnetic_accuracy = accuracy,
            SensorKind::Accelerometer => self.accelerometer_accuracy = accuracy,
        }
    }

    /// Accuracy of the latest reading of the given kind
    pub fn accuracy(&self, kind: SensorKind) -> SensorAccuracy {
        match kind {
            SensorKind::Magnetic => self.magnetic_accuracy,
            SensorKind::Accelerometer => self.accelerometer_accuracy,
        }
    }

    /// Latest raw magnetometer vector, if any
    pub fn magnetic(&self) -> Option<Vector3<f32>> {
        self.magnetic
    }

    /// Whether both sensor kinds have reported at least once
    pub fn has_data(&self) -> bool {
        self.magnetic.is_some() && self.accelerometer.is_some()
    }

    /// Current orientation, `None` until a valid estimate exists
    pub fn orientation(&mut self) -> Option<OrientationVector> {
        self.refresh();
        self.cached
    }

    /// Azimuth in degrees (`-180..=180`)
    ///
    /// Returns the cached value when nothing changed or when the inputs are
    /// incomplete or degenerate, and 0 before the first estimate.
    pub fn bearing(&mut self) -> f32 {
        self.orientation()
            .map(|orientation| orientation.azimuth * RAD_TO_DEG)
            .unwrap_or(0.0)
    }

    /// Forget all samples and the cached estimate
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        let (Some(accelerometer), Some(magnetic)) = (self.accelerometer, self.magnetic) else {
            return;
        };

        match rotation_matrix(accelerometer, magnetic) {
            Some(rotation) => self.cached = Some(orientation(&rotation)),
            None => log::trace!("Degenerate gravity/field pair, keeping previous orientation"),
        }
        self.dirty = false;
    }
}
