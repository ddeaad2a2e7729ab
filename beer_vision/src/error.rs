use thiserror::Error;

/// Failures surfaced by the detector and its device/display boundaries.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("cannot open capture device {index}")]
    DeviceUnavailable { index: i32 },
    #[error("frame buffer has {got} bytes, expected {expected}")]
    FrameSize { expected: usize, got: usize },
    #[error("capture backend error: {0}")]
    Capture(String),
    #[error("preview backend error: {0}")]
    Display(String),
    #[error("failed to write detection output: {0}")]
    Output(#[from] std::io::Error),
}
