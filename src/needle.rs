//! Needle animation with bounded acceleration

use crate::math::{FULL_CIRCLE, normalize_positive};
use crate::types::NeedleSettings;

const LOWER_QUADRANT: f32 = 90.0;
const UPPER_QUADRANT: f32 = 270.0;

/// Angle and velocity of the drawn needle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationState {
    /// Displayed angle in `[0, 360)`
    pub angle: f32,
    /// Degrees per tick
    pub velocity: f32,
}

/// Eases the needle towards a target bearing once per tick
///
/// The needle wants to cover `speed_modifier` of the remaining distance each
/// tick, but its velocity can only change by `accel_rate` per tick. Targets
/// across the 0/360 seam are unwrapped first so the needle always takes the
/// short way round.
///
/// # Example
/// ```
/// use fusion_compass::{NeedleAnimator, NeedleSettings};
///
/// let mut needle = NeedleAnimator::new(NeedleSettings::default());
/// needle.reset(355.0);
/// let angle = needle.step(5.0);
/// assert!(angle > 355.0); // Forwards through north, not back through south
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NeedleAnimator {
    settings: NeedleSettings,
    state: AnimationState,
}

impl NeedleAnimator {
    pub fn new(settings: NeedleSettings) -> Self {
        Self {
            settings,
            state: AnimationState::default(),
        }
    }

    /// Advance one tick towards `target` (degrees in `[0, 360)`) and return the new angle
    pub fn step(&mut self, target: f32) -> f32 {
        let distance = self.unwrap_target(target) - self.state.angle;
        let target_velocity = distance * self.settings.speed_modifier;

        let accel = self.settings.accel_rate;
        let change = (target_velocity - self.state.velocity).clamp(-accel, accel);
        self.state.velocity += change;

        self.state.angle = normalize_positive(self.state.angle + self.state.velocity);
        self.state.angle
    }

    /// Place the needle at `angle` and stop it
    pub fn reset(&mut self, angle: f32) {
        self.state = AnimationState {
            angle: normalize_positive(angle),
            velocity: 0.0,
        };
    }

    pub fn angle(&self) -> f32 {
        self.state.angle
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    fn unwrap_target(&self, target: f32) -> f32 {
        let current = self.state.angle;
        if current < LOWER_QUADRANT && target > UPPER_QUADRANT {
            target - FULL_CIRCLE
        } else if current > UPPER_QUADRANT && target < LOWER_QUADRANT {
            target + FULL_CIRCLE
        } else {
            target
        }
    }
}
