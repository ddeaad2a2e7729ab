// THEORY:
// The `DetectorLoop` is the only moving part of the program: open the camera, then
// pull / classify / print / preview / poll, until the stream ends or someone presses
// ESC or 'q'. It is strictly sequential and blocking.
//
// Key architectural principles:
// 1.  **Boundaries as traits**: The camera (`CaptureDevice` / `FrameSource`) and the
//     preview windows (`PreviewSurface`) are traits, so the loop never touches a
//     camera API directly. The binary plugs in OpenCV; tests plug in scripted fakes.
// 2.  **Two failure paths**: A device that will not open is reported with a single
//     stdout line and the run stops. A failed or empty read is not an error at all;
//     it is the normal end of the stream.
// 3.  **Release exactly once**: The frame source is wrapped in a guard. The normal
//     exits release it explicitly, and the guard's `Drop` covers an unwinding panic.
//     The second call is a no-op either way.
// 4.  **Stdout is a protocol**: Exactly one line per processed frame goes to `out`.
//     Everything else goes through `tracing`.

use crate::config::DetectorConfig;
use crate::core_modules::frame::frame::Frame;
use crate::core_modules::mask::mask::Mask;
use crate::core_modules::scoreboard::{BeerPoints, DetectionStateTracker};
use crate::error::VisionError;
use crate::pipeline::{Detection, DetectionPipeline};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Printed once when the capture device cannot be opened.
pub const CANNOT_OPEN_MESSAGE: &str = "Cannot open camera";

pub const ESCAPE_KEY: i32 = 27;
pub const QUIT_KEY: i32 = b'q' as i32;

/// True for ESC or 'q' after masking the key code to its low byte.
pub fn is_termination_key(key: i32) -> bool {
    matches!(key & 0xFF, ESCAPE_KEY | QUIT_KEY)
}

/// Opens a capture device by index.
pub trait CaptureDevice {
    type Source: FrameSource;

    fn open(&mut self, index: i32) -> Result<Self::Source, VisionError>;
}

/// An open stream of frames.
pub trait FrameSource {
    /// The next frame, or `None` once the stream has ended.
    fn read_frame(&mut self) -> Result<Option<Frame>, VisionError>;

    /// Gives the device back. Called exactly once per opened source.
    fn release(&mut self);
}

/// The two preview windows and the key poll.
pub trait PreviewSurface {
    fn show(&mut self, frame: &Frame, mask: &Mask) -> Result<(), VisionError>;

    /// Waits up to `wait` for a key press.
    fn poll_key(&mut self, wait: Duration) -> Result<Option<i32>, VisionError>;

    fn close(&mut self);
}

/// A preview that shows nothing and never reports a key.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessPreview;

impl PreviewSurface for HeadlessPreview {
    fn show(&mut self, _frame: &Frame, _mask: &Mask) -> Result<(), VisionError> {
        Ok(())
    }

    fn poll_key(&mut self, _wait: Duration) -> Result<Option<i32>, VisionError> {
        Ok(None)
    }

    fn close(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source stopped producing frames.
    StreamEnded,
    /// A termination key was pressed; carries the raw key code.
    TerminationKey(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub detections: u64,
    pub stop_reason: StopReason,
    pub points: f64,
    pub state_changes: u64,
}

struct CaptureGuard<S: FrameSource> {
    source: S,
    released: bool,
}

impl<S: FrameSource> CaptureGuard<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }
}

impl<S: FrameSource> Drop for CaptureGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}

struct RunTally {
    frames_processed: u64,
    detections: u64,
    state_changes: u64,
}

pub struct DetectorLoop {
    pipeline: DetectionPipeline,
    device_index: i32,
    key_wait: Duration,
    points: BeerPoints,
    state: DetectionStateTracker,
}

impl DetectorLoop {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            pipeline: DetectionPipeline::new(config.detection),
            device_index: config.device_index,
            key_wait: config.key_wait(),
            points: BeerPoints::new(&config.scoring),
            state: DetectionStateTracker::new(&config.scoring),
        }
    }

    pub fn points(&self) -> &BeerPoints {
        &self.points
    }

    /// Opens the device and runs until the stream ends or a termination key arrives.
    ///
    /// On `DeviceUnavailable` the only output is [`CANNOT_OPEN_MESSAGE`]. The device
    /// is released and the preview closed on every path after a successful open.
    pub fn run<D, P, W>(
        &mut self,
        device: &mut D,
        preview: &mut P,
        out: &mut W,
    ) -> Result<RunSummary, VisionError>
    where
        D: CaptureDevice,
        P: PreviewSurface,
        W: Write,
    {
        let source = match device.open(self.device_index) {
            Ok(source) => source,
            Err(e) => {
                warn!(index = self.device_index, error = %e, "capture device unavailable");
                writeln!(out, "{CANNOT_OPEN_MESSAGE}")?;
                out.flush()?;
                return Err(VisionError::DeviceUnavailable {
                    index: self.device_index,
                });
            }
        };
        info!(index = self.device_index, "capture device opened");

        let mut capture = CaptureGuard::new(source);
        let mut tally = RunTally {
            frames_processed: 0,
            detections: 0,
            state_changes: 0,
        };
        let outcome = self.drive(&mut capture, preview, out, &mut tally);

        capture.release();
        preview.close();
        debug!("capture device released");

        let stop_reason = outcome?;
        Ok(RunSummary {
            frames_processed: tally.frames_processed,
            detections: tally.detections,
            stop_reason,
            points: self.points.points(),
            state_changes: tally.state_changes,
        })
    }

    fn drive<S, P, W>(
        &mut self,
        capture: &mut CaptureGuard<S>,
        preview: &mut P,
        out: &mut W,
        tally: &mut RunTally,
    ) -> Result<StopReason, VisionError>
    where
        S: FrameSource,
        P: PreviewSurface,
        W: Write,
    {
        loop {
            let frame = match capture.source.read_frame() {
                Ok(Some(frame)) if !frame.is_empty() => frame,
                Ok(_) => {
                    info!(frames = tally.frames_processed, "stream ended");
                    return Ok(StopReason::StreamEnded);
                }
                Err(e) => {
                    warn!(error = %e, frames = tally.frames_processed, "frame read failed, stopping");
                    return Ok(StopReason::StreamEnded);
                }
            };

            let analysis = self.pipeline.analyze(&frame);
            writeln!(out, "{}", analysis.detection)?;
            out.flush()?;

            tally.frames_processed += 1;
            if analysis.detection.is_detected() {
                tally.detections += 1;
            }
            self.observe(analysis.detection, Instant::now(), tally);
            debug!(
                frame = tally.frames_processed,
                ratio = format!("{:.4}", analysis.ratio),
                mean_color = ?frame.average_pixel(),
                detected = analysis.detection.is_detected(),
                "frame classified"
            );

            preview.show(&frame, &analysis.mask)?;

            if let Some(key) = preview.poll_key(self.key_wait)? {
                if is_termination_key(key) {
                    info!(key, frames = tally.frames_processed, "termination key pressed");
                    return Ok(StopReason::TerminationKey(key));
                }
            }
        }
    }

    fn observe(&mut self, detection: Detection, now: Instant, tally: &mut RunTally) {
        let points = self.points.record(detection, now);
        if let Some(change) = self.state.observe(detection, now) {
            tally.state_changes += 1;
            info!(
                from = ?change.from,
                to = ?change.to,
                points = self.points.displayed(),
                "detection state changed"
            );
        }
        debug!(points = format!("{points:.2}"), "beer points");
    }
}
