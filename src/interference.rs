//! Magnetic interference detection

use crate::math::Vector3Ext;
use crate::types::{CompassStatus, InterferenceSettings};
use nalgebra::Vector3;

/// Flags magnetometer readings that are stronger than the local field allows
///
/// The reading's strength is the product of its three axis components,
/// compared against `expected × threshold_modifier`. The product keeps the
/// scale of the nominal fallback strength (60³).
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_compass::{CompassStatus, InterferenceClassifier, InterferenceSettings};
///
/// let classifier = InterferenceClassifier::new(InterferenceSettings::default());
/// let status = classifier.classify(Vector3::new(1.0, 2.0, 52.0), 100.0);
/// assert_eq!(status, CompassStatus::Good); // 104 <= 105
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InterferenceClassifier {
    settings: InterferenceSettings,
}

impl InterferenceClassifier {
    pub fn new(settings: InterferenceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> InterferenceSettings {
        self.settings
    }

    /// Strength used when no geomagnetic model is available
    pub fn nominal_field_strength(&self) -> f32 {
        self.settings.nominal_field_strength
    }

    /// Strength above which a reading counts as interference
    pub fn threshold(&self, expected_field_strength: f32) -> f32 {
        expected_field_strength * self.settings.threshold_modifier
    }

    /// Classify a raw magnetometer reading
    ///
    /// Returns [`CompassStatus::Good`] or [`CompassStatus::Interference`], never
    /// [`CompassStatus::Inactive`].
    pub fn classify(&self, magnetic: Vector3<f32>, expected_field_strength: f32) -> CompassStatus {
        if magnetic.axis_product() > self.threshold(expected_field_strength) {
            CompassStatus::Interference
        } else {
            CompassStatus::Good
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> InterferenceClassifier {
        InterferenceClassifier::new(InterferenceSettings::default())
    }

    #[test]
    fn test_threshold_boundary() {
        let classifier = classifier();
        assert_eq!(classifier.classify(Vector3::new(1.0, 1.0, 104.0), 100.0), CompassStatus::Good);
        assert_eq!(
            classifier.classify(Vector3::new(1.0, 1.0, 106.0), 100.0),
            CompassStatus::Interference
        );
    }

    #[test]
    fn test_nominal_fallback() {
        let classifier = classifier();
        let nominal = classifier.nominal_field_strength();
        assert_eq!(nominal, 216_000.0);

        // 60³ is within the 5% margin, 62³ is not
        assert_eq!(classifier.classify(Vector3::new(60.0, 60.0, 60.0), nominal), CompassStatus::Good);
        assert_eq!(
            classifier.classify(Vector3::new(62.0, 62.0, 62.0), nominal),
            CompassStatus::Interference
        );
    }

    #[test]
    fn test_negative_product_never_interferes() {
        // A typical northern hemisphere reading has a negative Z axis
        let status = classifier().classify(Vector3::new(300.0, 400.0, -500.0), 100.0);
        assert_eq!(status, CompassStatus::Good);
    }

    #[test]
    fn test_custom_modifier() {
        let classifier = InterferenceClassifier::new(InterferenceSettings {
            threshold_modifier: 1.5,
            ..Default::default()
        });
        assert_eq!(classifier.threshold(100.0), 150.0);
        assert_eq!(classifier.classify(Vector3::new(1.0, 1.0, 140.0), 100.0), CompassStatus::Good);
    }
}
