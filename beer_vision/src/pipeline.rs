// THEORY:
// The `pipeline` module is the top-level API for classifying a single frame. It
// chains the core modules in a fixed order and hands back everything a caller might
// want to look at afterwards:
//
//   Frame --(Pixel::to_hsv + ColorRange)--> Mask --(detection_ratio)--> ratio --> Detection
//
// The pipeline holds configuration only. Calling `analyze` twice on the same frame
// always yields the same result; cross-frame memory belongs to the scoreboard.

use crate::core_modules::color_range::color_range::{BLUE_RANGE, ColorRange};
use crate::core_modules::frame::frame::Frame;
use crate::core_modules::mask::mask::{self as mask_ops, Mask};
use serde::Deserialize;
use std::fmt;

/// Printed when the ratio clears the threshold. The trailing space is part of the line.
pub const DETECTED_MESSAGE: &str = "Beer detected ";
pub const NOT_DETECTED_MESSAGE: &str = "No beer";

/// Configuration for the DetectionPipeline.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub color_range: ColorRange,
    /// A frame is a detection only when its ratio is strictly greater than this.
    #[serde(default = "default_ratio_threshold")]
    pub ratio_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            color_range: BLUE_RANGE,
            ratio_threshold: default_ratio_threshold(),
        }
    }
}

fn default_ratio_threshold() -> f64 {
    0.05
}

/// The verdict for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detection {
    Detected,
    NotDetected,
}

impl Detection {
    /// The exact line emitted for this verdict.
    pub fn message(&self) -> &'static str {
        match self {
            Detection::Detected => DETECTED_MESSAGE,
            Detection::NotDetected => NOT_DETECTED_MESSAGE,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Detection::Detected)
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub mask: Mask,
    pub ratio: f64,
    pub detection: Detection,
}

pub struct DetectionPipeline {
    config: PipelineConfig,
}

impl DetectionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Strict comparison: a ratio equal to the threshold is not a detection.
    pub fn classify(&self, ratio: f64) -> Detection {
        if ratio > self.config.ratio_threshold {
            Detection::Detected
        } else {
            Detection::NotDetected
        }
    }

    pub fn analyze(&self, frame: &Frame) -> FrameAnalysis {
        // Stage 1: Color conversion and range test
        let mask = mask_ops::build_mask(frame, &self.config.color_range);

        // Stage 2: Coverage
        let ratio = mask_ops::detection_ratio(&mask);

        // Stage 3: Decision
        let detection = self.classify(ratio);

        FrameAnalysis {
            mask,
            ratio,
            detection,
        }
    }

    pub fn beer_detected(&self, frame: &Frame) -> bool {
        self.analyze(frame).detection.is_detected()
    }
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    const BLUE: Pixel = Pixel::new(255, 0, 0);
    const RED: Pixel = Pixel::new(0, 0, 255);

    #[test]
    fn all_blue_frame_is_detected() {
        let analysis = DetectionPipeline::default().analyze(&Frame::filled(32, 24, BLUE));
        assert_eq!(analysis.ratio, 1.0);
        assert_eq!(analysis.detection, Detection::Detected);
        assert_eq!(analysis.detection.to_string(), "Beer detected ");
    }

    #[test]
    fn all_red_frame_is_not_detected() {
        let analysis = DetectionPipeline::default().analyze(&Frame::filled(32, 24, RED));
        assert_eq!(analysis.ratio, 0.0);
        assert_eq!(analysis.detection, Detection::NotDetected);
        assert_eq!(analysis.detection.to_string(), "No beer");
    }

    #[test]
    fn threshold_is_strict() {
        let pipeline = DetectionPipeline::default();
        assert_eq!(pipeline.classify(0.05), Detection::NotDetected);
        assert_eq!(pipeline.classify(0.050001), Detection::Detected);
        assert_eq!(pipeline.classify(0.0), Detection::NotDetected);
        assert_eq!(pipeline.classify(1.0), Detection::Detected);
    }

    #[test]
    fn exactly_five_percent_blue_is_not_detected() {
        // 1 blue pixel out of 20.
        let mut pixels = vec![RED; 20];
        pixels[7] = BLUE;
        let frame = Frame::from_pixels(5, 4, &pixels).unwrap();
        let analysis = DetectionPipeline::default().analyze(&frame);
        assert_eq!(analysis.ratio, 0.05);
        assert_eq!(analysis.detection, Detection::NotDetected);
    }

    #[test]
    fn just_over_five_percent_blue_is_detected() {
        // 2 blue pixels out of 39 is about 5.1%.
        let mut pixels = vec![RED; 39];
        pixels[0] = BLUE;
        pixels[38] = BLUE;
        let frame = Frame::from_pixels(13, 3, &pixels).unwrap();
        assert!(DetectionPipeline::default().beer_detected(&frame));
    }

    #[test]
    fn mask_has_frame_dimensions() {
        let analysis = DetectionPipeline::default().analyze(&Frame::filled(11, 5, BLUE));
        assert_eq!(analysis.mask.dimensions(), (11, 5));
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let pipeline = DetectionPipeline::new(PipelineConfig {
            ratio_threshold: 0.5,
            ..PipelineConfig::default()
        });
        let frame = Frame::from_pixels(2, 2, &[BLUE, BLUE, RED, RED]).unwrap();
        assert_eq!(pipeline.analyze(&frame).detection, Detection::NotDetected);
    }
}
