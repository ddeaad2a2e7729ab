// THEORY:
// This file is the entry point for the `beer_vision` library crate. It exposes the
// per-frame `DetectionPipeline`, the `DetectorLoop` that drives it from a camera, and
// the traits a front end implements to supply frames and preview windows.
//
// The library never links a camera or windowing API itself. Those live behind the
// `CaptureDevice`, `FrameSource` and `PreviewSurface` traits so that everything here
// can be exercised with synthetic frames.

pub mod config;
pub mod core_modules;
pub mod detector_loop;
pub mod error;
pub mod pipeline;

pub use config::{ConfigError, DetectorConfig, LoggingConfig, ScoringConfig};
pub use core_modules::color_range::color_range::{BLUE_RANGE, ColorRange};
pub use core_modules::frame::frame::Frame;
pub use core_modules::mask::mask::Mask;
pub use core_modules::pixel::pixel::{Hsv, Pixel};
pub use detector_loop::{
    CANNOT_OPEN_MESSAGE, CaptureDevice, DetectorLoop, FrameSource, HeadlessPreview,
    PreviewSurface, RunSummary, StopReason,
};
pub use error::VisionError;
pub use pipeline::{Detection, DetectionPipeline, FrameAnalysis, PipelineConfig};
