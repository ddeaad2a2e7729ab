// THEORY:
// The scoreboard is the only part of the detector that remembers anything between
// frames, and it is strictly observational: nothing here feeds back into how a frame
// is classified or what is printed for it.
//
// Two independent trackers live here:
// 1.  `BeerPoints` integrates detections over wall-clock time. Each frame adds (or
//     subtracts) a per-second rate times the time since the previous frame. The step
//     is capped so a stalled camera cannot award a burst of points, and the score
//     never drops below zero.
// 2.  `DetectionStateTracker` turns the noisy per-frame stream into debounced state
//     changes. A flip is only reported once the cooldown since the previous reported
//     flip has elapsed, so a can at the edge of the threshold does not flap.
//
// Both take `Instant`s from the caller rather than reading the clock themselves.

use crate::config::ScoringConfig;
use crate::pipeline::Detection;
use std::time::{Duration, Instant};

/// Time-integrated score that rises while beer is in view and falls otherwise.
#[derive(Debug, Clone)]
pub struct BeerPoints {
    points: f64,
    last_frame_at: Option<Instant>,
    gain_per_second: f64,
    loss_per_second: f64,
    max_step: Duration,
}

impl BeerPoints {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            points: 0.0,
            last_frame_at: None,
            gain_per_second: config.points_per_second_detected,
            loss_per_second: config.points_per_second_missing,
            max_step: Duration::from_millis(config.max_frame_step_ms),
        }
    }

    /// Applies one frame's worth of scoring and returns the new total.
    pub fn record(&mut self, detection: Detection, now: Instant) -> f64 {
        let step = match self.last_frame_at {
            Some(previous) => now.saturating_duration_since(previous).min(self.max_step),
            None => Duration::ZERO,
        };
        self.last_frame_at = Some(now);

        let rate = match detection {
            Detection::Detected => self.gain_per_second,
            Detection::NotDetected => -self.loss_per_second,
        };
        self.points = (self.points + rate * step.as_secs_f64()).max(0.0);
        self.points
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    /// The score as shown to a person: rounded to a whole number.
    pub fn displayed(&self) -> u64 {
        self.points.round() as u64
    }
}

/// A debounced flip of the detection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// `None` for the very first observation.
    pub from: Option<Detection>,
    pub to: Detection,
}

/// Reports detection state changes no more often than the configured cooldown.
#[derive(Debug, Clone)]
pub struct DetectionStateTracker {
    current: Option<Detection>,
    last_change_at: Option<Instant>,
    cooldown: Duration,
}

impl DetectionStateTracker {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            current: None,
            last_change_at: None,
            cooldown: Duration::from_millis(config.state_change_cooldown_ms),
        }
    }

    /// Feeds one frame's detection; returns a change if one is reported.
    pub fn observe(&mut self, detection: Detection, now: Instant) -> Option<StateChange> {
        if let Some(changed_at) = self.last_change_at {
            if now.saturating_duration_since(changed_at) < self.cooldown {
                return None;
            }
        }
        if self.current == Some(detection) {
            return None;
        }

        let change = StateChange {
            from: self.current,
            to: detection,
        };
        self.current = Some(detection);
        self.last_change_at = Some(now);
        Some(change)
    }

    /// The last reported state, if any.
    pub fn current(&self) -> Option<Detection> {
        self.current
    }
}
