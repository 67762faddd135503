//! Jitter suppression for the displayed bearing

use crate::types::JitterSettings;

/// Holds the displayed bearing steady against small oscillations
///
/// A change larger than `change_threshold` is shown immediately. Smaller
/// changes are only shown once they have persisted for more than
/// `repeat_threshold` consecutive ticks, so noise does not flicker the digits
/// while a slow real rotation still registers.
///
/// # Example
/// ```
/// use fusion_compass::{JitterFilter, JitterSettings};
///
/// let mut filter = JitterFilter::new(JitterSettings::default());
/// assert_eq!(filter.filter(100.0), 100.0); // Large jump from 0
/// assert_eq!(filter.filter(103.0), 100.0); // Small change held back
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JitterFilter {
    settings: JitterSettings,
    displayed: f32,
    repeat_count: u32,
}

impl JitterFilter {
    pub fn new(settings: JitterSettings) -> Self {
        Self {
            settings,
            displayed: 0.0,
            repeat_count: 0,
        }
    }

    /// Feed this tick's bearing and return the bearing to display
    pub fn filter(&mut self, bearing: f32) -> f32 {
        if (self.displayed - bearing).abs() > self.settings.change_threshold {
            self.snap(bearing);
        } else {
            self.repeat_count += 1;
            if self.repeat_count > self.settings.repeat_threshold {
                self.snap(bearing);
            }
        }
        self.displayed
    }

    pub fn displayed(&self) -> f32 {
        self.displayed
    }

    /// Consecutive sub-threshold ticks since the last snap
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Show `bearing` immediately
    pub fn reset(&mut self, bearing: f32) {
        self.snap(bearing);
    }

    fn snap(&mut self, bearing: f32) {
        self.displayed = bearing;
        self.repeat_count = 0;
    }
}
