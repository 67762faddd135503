//! [![github]](https://github.com/wboayue/fusion-compass)&ensp;[![crates-io]](https://crates.io/crates/fusion-compass)&ensp;[![license]](https://opensource.org/licenses/MIT)
//!
//! [github]: https://img.shields.io/badge/github-8da0cb?style=for-the-badge&labelColor=555555&logo=github
//! [crates-io]: https://img.shields.io/badge/crates.io-fc8d62?style=for-the-badge&labelColor=555555&logo=rust
//! [license]: https://img.shields.io/badge/License-MIT-blue.svg?style=for-the-badge&labelColor=555555
//!
//! Fusion Compass - a handheld electronic compass engine
//!
//! This library turns raw magnetometer and accelerometer samples, plus an
//! optional location fix, into a stable heading and animates a needle
//! towards it at a fixed frame rate.
//!
//! # Features
//!
//! - Tilt-compensated azimuth from gravity and the geomagnetic vector
//! - Magnetic interference detection against the expected local field
//! - True-north correction from a built-in IGRF spherical-harmonic model
//! - Jitter suppression for the displayed reading
//! - Needle animation with bounded acceleration that wraps through north
//! - Fixed-rate render loop on a worker thread with cooperative shutdown
//!
//! # Quick Start
//!
//! ```rust
//! use fusion_compass::{BearingService, SensorSample};
//!
//! let mut service = BearingService::new();
//!
//! // Device lying flat, top edge pointing magnetic east
//! service.update(SensorSample::accelerometer(0.0, 0.0, 9.81)); // m/s²
//! service.update(SensorSample::magnetic(-22.0, 0.0, -40.0)); // µT
//!
//! let bearing = service.positive_bearing(false);
//! assert!((bearing - 90.0).abs() < 0.5);
//! ```
//!
//! For the threaded engine see [`Compass`] and [`CompassView`].

mod bearing;
pub mod cardinal;
pub mod compass;
mod error;
pub mod geomagnetic;
mod interference;
mod jitter;
mod manager;
mod math;
mod needle;
mod orientation;
pub mod scheduler;
mod types;
pub mod view;

// Re-export all public types and functions
pub use bearing::BearingService;
pub use cardinal::cardinal_from_bearing;
pub use compass::calculate_heading;
pub use error::{CompassError, Result};
pub use geomagnetic::{GeomagneticField, GeomagneticModel, SphericalHarmonicModel};
pub use interference::InterferenceClassifier;
pub use jitter::JitterFilter;
pub use manager::{Compass, CompassSnapshot, SensorHost, SubscriptionRequest};
pub use math::{DEG_TO_RAD, FULL_CIRCLE, RAD_TO_DEG, Vector3Ext, normalize_positive, normalize_signed};
pub use needle::{AnimationState, NeedleAnimator};
pub use orientation::OrientationEstimator;
pub use scheduler::{CancellationToken, Clock, FrameHandler, FrameScheduler, FrameStats, FrameTiming, SystemClock};
pub use types::*;
pub use view::{CompassView, RenderPayload, Renderer};
