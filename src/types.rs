//! Core types and settings for the compass engine

use crate::error::{CompassError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Source of a [`SensorSample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Magnetometer, values in µT
    Magnetic,
    /// Accelerometer, values in m/s²
    Accelerometer,
}

/// Confidence reported by the host platform for a sensor reading
///
/// Ordinal 0-3, unreliable to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum SensorAccuracy {
    /// Readings cannot be trusted; calibration is needed
    #[default]
    Unreliable = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl SensorAccuracy {
    /// Map a platform ordinal onto an accuracy level, saturating above 3
    pub fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            0 => SensorAccuracy::Unreliable,
            1 => SensorAccuracy::Low,
            2 => SensorAccuracy::Medium,
            _ => SensorAccuracy::High,
        }
    }

    /// Ordinal value of this accuracy level
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// A single 3-axis reading delivered by the host
///
/// # Example
/// ```
/// use fusion_compass::{SensorAccuracy, SensorKind, SensorSample};
///
/// let sample = SensorSample::magnetic(22.0, 5.0, -40.0);
/// assert_eq!(sample.kind, SensorKind::Magnetic);
/// assert_eq!(sample.accuracy, SensorAccuracy::High);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub kind: SensorKind,
    pub values: Vector3<f32>,
    pub accuracy: SensorAccuracy,
}

impl SensorSample {
    pub fn new(kind: SensorKind, values: Vector3<f32>, accuracy: SensorAccuracy) -> Self {
        Self { kind, values, accuracy }
    }

    /// Magnetometer reading in µT with high accuracy
    pub fn magnetic(x: f32, y: f32, z: f32) -> Self {
        Self::new(SensorKind::Magnetic, Vector3::new(x, y, z), SensorAccuracy::High)
    }

    /// Accelerometer reading in m/s² with high accuracy
    pub fn accelerometer(x: f32, y: f32, z: f32) -> Self {
        Self::new(SensorKind::Accelerometer, Vector3::new(x, y, z), SensorAccuracy::High)
    }
}

/// Last known geolocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Geodetic latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
    /// Height above the WGS-84 ellipsoid in metres
    pub altitude: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp_millis: i64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, altitude: f64, timestamp_millis: i64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            timestamp_millis,
        }
    }
}

/// Health of the compass as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompassStatus {
    Good,
    /// Magnetic field reading is stronger than the local field should be
    Interference,
    /// Sensors are not registered
    #[default]
    Inactive,
}

/// Device orientation in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationVector {
    /// Rotation about the gravity axis, 0 = magnetic north, clockwise positive
    pub azimuth: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Interference classifier settings
///
/// # Example
/// ```
/// use fusion_compass::InterferenceSettings;
///
/// let settings = InterferenceSettings {
///     threshold_modifier: 1.10,
///     ..Default::default()
/// };
/// assert_eq!(settings.nominal_field_strength, 60.0 * 60.0 * 60.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterferenceSettings {
    /// Multiplier applied to the expected field strength to get the threshold
    pub threshold_modifier: f32,
    /// Expected strength used until a geomagnetic model is available
    pub nominal_field_strength: f32,
}

impl Default for InterferenceSettings {
    fn default() -> Self {
        Self {
            threshold_modifier: 1.05,
            nominal_field_strength: 60.0 * 60.0 * 60.0,
        }
    }
}

/// Jitter filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterSettings {
    /// Change in degrees that is displayed immediately
    pub change_threshold: f32,
    /// Consecutive small changes tolerated before the display catches up
    pub repeat_threshold: u32,
}

impl Default for JitterSettings {
    fn default() -> Self {
        Self {
            change_threshold: 5.0,
            repeat_threshold: 40,
        }
    }
}

/// Needle animation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedleSettings {
    /// Fraction of the remaining distance the needle wants to cover per tick
    pub speed_modifier: f32,
    /// Maximum change in velocity per tick, degrees per tick²
    pub accel_rate: f32,
}

impl Default for NeedleSettings {
    fn default() -> Self {
        Self {
            speed_modifier: 0.26,
            accel_rate: 0.9,
        }
    }
}

/// Frame scheduler settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    pub target_fps: u32,
    /// Sleep floor so the worker always yields, in milliseconds
    pub minimum_sleep_ms: u64,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            target_fps: 30,
            minimum_sleep_ms: 10,
        }
    }
}

/// Delivery rate requested from the host for sensor samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SensorRate {
    Normal,
    /// Rate suitable for driving a user interface
    #[default]
    Ui,
    Game,
    Fastest,
}

/// Sensor subscription settings passed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub rate: SensorRate,
}

/// Location subscription settings passed to the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    /// Minimum time between location updates in milliseconds
    pub min_interval_ms: u64,
    /// Minimum distance between location updates in metres
    pub min_distance_m: f32,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 60_000,
            min_distance_m: 10_000.0,
        }
    }
}

/// Complete engine configuration
///
/// Every field has a tunable default; a partial JSON document only needs the
/// values it overrides.
///
/// # Example
/// ```
/// use fusion_compass::CompassConfig;
///
/// let config = CompassConfig::from_json(r#"{ "jitter": { "change_threshold": 8.0 } }"#).unwrap();
/// assert_eq!(config.jitter.change_threshold, 8.0);
/// assert_eq!(config.jitter.repeat_threshold, 40);
/// assert_eq!(config.frame.target_fps, 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassConfig {
    pub interference: InterferenceSettings,
    pub jitter: JitterSettings,
    pub needle: NeedleSettings,
    pub frame: FrameSettings,
    pub sensors: SensorSettings,
    pub location: LocationSettings,
}

impl CompassConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CompassConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every tunable is usable
    pub fn validate(&self) -> Result<()> {
        if self.frame.target_fps == 0 {
            return Err(CompassError::InvalidConfig(
                "frame.target_fps must be greater than zero".to_string(),
            ));
        }

        let non_negative = [
            ("interference.threshold_modifier", self.interference.threshold_modifier),
            ("jitter.change_threshold", self.jitter.change_threshold),
            ("needle.speed_modifier", self.needle.speed_modifier),
            ("needle.accel_rate", self.needle.accel_rate),
            ("location.min_distance_m", self.location.min_distance_m),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CompassError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !self.interference.nominal_field_strength.is_finite() {
            return Err(CompassError::InvalidConfig(
                "interference.nominal_field_strength must be finite".to_string(),
            ));
        }

        Ok(())
    }
}
