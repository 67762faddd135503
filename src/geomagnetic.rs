//! Geomagnetic main-field model for declination and expected field strength
//!
//! Evaluates a spherical-harmonic expansion of the main field with Schmidt
//! semi-normalized Gauss coefficients over the WGS-84 ellipsoid. The built-in
//! coefficients are the IGRF-13 epoch 2020.0 main field and secular
//! variation, truncated at degree 6. Compared to the full model this keeps
//! declination within about two degrees outside the polar regions, which is
//! below what a handheld magnetometer resolves.

use crate::types::LocationFix;

/// WGS-84 semi-major axis in km
const WGS84_A: f64 = 6378.137;
/// WGS-84 semi-minor axis in km
const WGS84_B: f64 = 6356.752_314_2;
/// Geomagnetic reference radius in km
const REFERENCE_RADIUS: f64 = 6371.2;

const MILLIS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0 * 1000.0;
const MAX_DEGREE: usize = 6;
/// Secular variation is linear; extrapolation is capped to keep results sane
const MAX_EXTRAPOLATION_YEARS: f64 = 10.0;
const MIN_SIN_COLATITUDE: f64 = 1e-10;

/// One Gauss coefficient pair with its yearly rate of change (nT, nT/year)
#[derive(Debug, Clone, Copy)]
pub struct GaussCoefficient {
    pub n: usize,
    pub m: usize,
    pub g: f64,
    pub h: f64,
    pub g_rate: f64,
    pub h_rate: f64,
}

const fn coefficient(n: usize, m: usize, g: f64, h: f64, g_rate: f64, h_rate: f64) -> GaussCoefficient {
    GaussCoefficient {
        n,
        m,
        g,
        h,
        g_rate,
        h_rate,
    }
}

/// IGRF-13, epoch 2020.0
const IGRF_2020: [GaussCoefficient; 27] = [
    coefficient(1, 0, -29404.8, 0.0, 5.7, 0.0),
    coefficient(1, 1, -1450.9, 4652.5, 7.4, -25.9),
    coefficient(2, 0, -2499.6, 0.0, -11.0, 0.0),
    coefficient(2, 1, 2982.0, -2991.6, -7.0, -30.2),
    coefficient(2, 2, 1677.0, -734.6, -2.1, -22.4),
    coefficient(3, 0, 1363.2, 0.0, 2.2, 0.0),
    coefficient(3, 1, -2381.2, -82.1, -5.9, 6.0),
    coefficient(3, 2, 1236.2, 241.9, 3.1, -1.1),
    coefficient(3, 3, 525.7, -543.4, -12.0, 0.5),
    coefficient(4, 0, 903.0, 0.0, -1.2, 0.0),
    coefficient(4, 1, 809.5, 281.9, -1.6, -0.1),
    coefficient(4, 2, 86.3, -158.4, -5.9, 6.5),
    coefficient(4, 3, -309.4, 199.7, 5.2, 3.6),
    coefficient(4, 4, 48.0, -349.7, -5.1, -5.0),
    coefficient(5, 0, -234.3, 0.0, -0.3, 0.0),
    coefficient(5, 1, 363.2, 47.7, 0.5, 0.0),
    coefficient(5, 2, 187.8, 208.3, -0.6, 2.5),
    coefficient(5, 3, -140.7, -121.2, 0.2, -0.6),
    coefficient(5, 4, -151.2, 32.3, 1.3, 3.0),
    coefficient(5, 5, 13.5, 98.9, 0.9, 0.3),
    coefficient(6, 0, 66.0, 0.0, -0.5, 0.0),
    coefficient(6, 1, 65.5, -19.1, -0.3, 0.0),
    coefficient(6, 2, 72.9, 25.1, 0.4, -1.6),
    coefficient(6, 3, -121.5, 52.8, 1.3, -1.3),
    coefficient(6, 4, -36.2, -64.5, -1.4, 0.8),
    coefficient(6, 5, 13.5, 8.9, 0.0, 0.0),
    coefficient(6, 6, -64.7, 68.1, 0.9, 1.0),
];

/// Geomagnetic field vector at a point, in nanotesla
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeomagneticField {
    pub north: f32,
    pub east: f32,
    pub down: f32,
}

impl GeomagneticField {
    /// Angle from true north to magnetic north in degrees, positive east
    pub fn declination(&self) -> f32 {
        self.east.atan2(self.north).to_degrees()
    }

    /// Dip angle in degrees, positive when the field points down
    pub fn inclination(&self) -> f32 {
        self.down.atan2(self.horizontal_strength()).to_degrees()
    }

    /// Horizontal intensity in nanotesla
    pub fn horizontal_strength(&self) -> f32 {
        self.north.hypot(self.east)
    }

    /// Total intensity in nanotesla
    pub fn field_strength_nanotesla(&self) -> f32 {
        self.horizontal_strength().hypot(self.down)
    }

    /// Total intensity in microtesla
    pub fn field_strength(&self) -> f32 {
        self.field_strength_nanotesla() / 1000.0
    }
}

/// Source of the expected geomagnetic field at a location and time
///
/// Implementations must be pure: the same inputs always give the same field.
pub trait GeomagneticModel: Send + Sync {
    fn field(&self, location: &LocationFix, time_millis: i64) -> GeomagneticField;

    /// Declination in degrees, positive east
    fn declination(&self, location: &LocationFix, time_millis: i64) -> f32 {
        self.field(location, time_millis).declination()
    }

    /// Total intensity in microtesla
    fn field_strength(&self, location: &LocationFix, time_millis: i64) -> f32 {
        self.field(location, time_millis).field_strength()
    }
}

/// Spherical-harmonic main-field model
///
/// # Example
/// ```
/// use fusion_compass::{GeomagneticModel, LocationFix, SphericalHarmonicModel};
///
/// let model = SphericalHarmonicModel::default();
/// // Boulder, Colorado in mid 2020
/// let boulder = LocationFix::new(40.015, -105.27, 1655.0, 1_593_561_600_000);
/// let declination = model.declination(&boulder, boulder.timestamp_millis);
/// assert!((declination - 8.0).abs() < 2.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SphericalHarmonicModel {
    /// Decimal year the coefficients refer to
    epoch: f64,
    coefficients: &'static [GaussCoefficient],
}

impl Default for SphericalHarmonicModel {
    fn default() -> Self {
        Self::igrf_2020()
    }
}

impl SphericalHarmonicModel {
    /// Built-in IGRF-13 epoch 2020.0 coefficients
    pub fn igrf_2020() -> Self {
        Self {
            epoch: 2020.0,
            coefficients: &IGRF_2020,
        }
    }

    /// Model from caller-supplied coefficients of degree at most 6
    pub fn with_coefficients(epoch: f64, coefficients: &'static [GaussCoefficient]) -> Self {
        Self { epoch, coefficients }
    }

    pub fn epoch(&self) -> f64 {
        self.epoch
    }
}

impl GeomagneticModel for SphericalHarmonicModel {
    fn field(&self, location: &LocationFix, time_millis: i64) -> GeomagneticField {
        let years = (decimal_year(time_millis) - self.epoch)
            .clamp(-MAX_EXTRAPOLATION_YEARS, MAX_EXTRAPOLATION_YEARS);

        let latitude = location.latitude.clamp(-90.0, 90.0).to_radians();
        let longitude = location.longitude.to_radians();
        let altitude_km = location.altitude / 1000.0;

        let frame = GeocentricFrame::from_geodetic(latitude, altitude_km);
        let legendre = Legendre::new(frame.cos_colatitude, frame.sin_colatitude);
        let ratio = REFERENCE_RADIUS / frame.radius;

        // Geocentric north, east, down
        let (mut x, mut y, mut z) = (0.0f64, 0.0f64, 0.0f64);
        for c in self.coefficients.iter().filter(|c| c.n >= 1 && c.n <= MAX_DEGREE && c.m <= c.n) {
            let g = c.g + c.g_rate * years;
            let h = c.h + c.h_rate * years;
            let (sin_ml, cos_ml) = (c.m as f64 * longitude).sin_cos();
            let scale = ratio.powi(c.n as i32 + 2);
            let p = legendre.p[c.n][c.m];
            let dp = legendre.dp[c.n][c.m];
            let gh = g * cos_ml + h * sin_ml;

            x += scale * gh * dp;
            y += scale * c.m as f64 * (g * sin_ml - h * cos_ml) * p / frame.sin_colatitude;
            z -= (c.n as f64 + 1.0) * scale * gh * p;
        }

        // Back to the geodetic horizon
        GeomagneticField {
            north: (x * frame.cos_delta + z * frame.sin_delta) as f32,
            east: y as f32,
            down: (z * frame.cos_delta - x * frame.sin_delta) as f32,
        }
    }
}

/// Convert milliseconds since the Unix epoch to a decimal year
pub fn decimal_year(time_millis: i64) -> f64 {
    1970.0 + time_millis as f64 / MILLIS_PER_YEAR
}

/// Geocentric position of a geodetic point plus the rotation between the two horizons
struct GeocentricFrame {
    radius: f64,
    cos_colatitude: f64,
    sin_colatitude: f64,
    cos_delta: f64,
    sin_delta: f64,
}

impl GeocentricFrame {
    fn from_geodetic(latitude: f64, altitude_km: f64) -> Self {
        let a2 = WGS84_A * WGS84_A;
        let b2 = WGS84_B * WGS84_B;
        let (sin_lat, cos_lat) = latitude.sin_cos();

        let one = a2 * cos_lat * cos_lat;
        let two = b2 * sin_lat * sin_lat;
        let three = one + two;
        let rho = three.sqrt();
        let radius = (altitude_km * (altitude_km + 2.0 * rho) + (a2 * one + b2 * two) / three).sqrt();

        let cos_delta = (altitude_km + rho) / radius;
        let sin_delta = (a2 - b2) / rho * sin_lat * cos_lat / radius;

        Self {
            radius,
            cos_colatitude: sin_lat * cos_delta - cos_lat * sin_delta,
            sin_colatitude: (cos_lat * cos_delta + sin_lat * sin_delta).max(MIN_SIN_COLATITUDE),
            cos_delta,
            sin_delta,
        }
    }
}

/// Schmidt semi-normalized associated Legendre functions and their colatitude derivatives
struct Legendre {
    p: [[f64; MAX_DEGREE + 1]; MAX_DEGREE + 1],
    dp: [[f64; MAX_DEGREE + 1]; MAX_DEGREE + 1],
}

impl Legendre {
    fn new(cos_theta: f64, sin_theta: f64) -> Self {
        let mut p = [[0.0; MAX_DEGREE + 1]; MAX_DEGREE + 1];
        let mut dp = [[0.0; MAX_DEGREE + 1]; MAX_DEGREE + 1];
        p[0][0] = 1.0;

        for n in 1..=MAX_DEGREE {
            for m in 0..=n {
                if n == m {
                    if n == 1 {
                        p[1][1] = sin_theta;
                        dp[1][1] = cos_theta;
                    } else {
                        let k = ((2 * n - 1) as f64 / (2 * n) as f64).sqrt();
                        p[n][n] = k * sin_theta * p[n - 1][n - 1];
                        dp[n][n] = k * (sin_theta * dp[n - 1][n - 1] + cos_theta * p[n - 1][n - 1]);
                    }
                } else {
                    let norm = ((n * n - m * m) as f64).sqrt();
                    let k = (((n - 1) * (n - 1) - m * m) as f64).sqrt();
                    let (p2, dp2) = if n >= 2 { (p[n - 2][m], dp[n - 2][m]) } else { (0.0, 0.0) };
                    let odd = (2 * n - 1) as f64;

                    p[n][m] = (odd * cos_theta * p[n - 1][m] - k * p2) / norm;
                    dp[n][m] = (odd * (cos_theta * dp[n - 1][m] - sin_theta * p[n - 1][m]) - k * dp2) / norm;
                }
            }
        }

        Self { p, dp }
    }
}
