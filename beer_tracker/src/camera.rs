use beer_vision::{CaptureDevice, Frame, FrameSource, VisionError};
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::warn;

fn capture_error(e: opencv::Error) -> VisionError {
    VisionError::Capture(e.to_string())
}

/// The system camera, opened through OpenCV's video I/O backend.
#[derive(Debug, Default)]
pub struct OpenCvCamera;

impl CaptureDevice for OpenCvCamera {
    type Source = CameraStream;

    fn open(&mut self, index: i32) -> Result<CameraStream, VisionError> {
        let capture = match VideoCapture::new(index, videoio::CAP_ANY) {
            Ok(capture) => capture,
            Err(e) => {
                warn!(index, error = %e, "backend refused to create capture");
                return Err(VisionError::DeviceUnavailable { index });
            }
        };
        if !capture.is_opened().unwrap_or(false) {
            return Err(VisionError::DeviceUnavailable { index });
        }
        Ok(CameraStream {
            capture,
            frame: Mat::default(),
        })
    }
}

/// An opened camera. The `Mat` is reused across reads.
pub struct CameraStream {
    capture: VideoCapture,
    frame: Mat,
}

impl FrameSource for CameraStream {
    fn read_frame(&mut self) -> Result<Option<Frame>, VisionError> {
        let grabbed = self.capture.read(&mut self.frame).map_err(capture_error)?;
        if !grabbed || self.frame.empty() {
            return Ok(None);
        }
        mat_to_frame(&self.frame).map(Some)
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!(error = %e, "failed to release capture device");
        }
    }
}

/// Copies an 8-bit camera `Mat` into a packed BGR `Frame`.
///
/// Gray and BGRA captures are converted to BGR first.
fn mat_to_frame(mat: &Mat) -> Result<Frame, VisionError> {
    if mat.depth() != core::CV_8U {
        return Err(VisionError::Capture(format!(
            "unsupported frame depth {}",
            mat.depth()
        )));
    }

    let conversion = match mat.channels() {
        3 => None,
        1 => Some(imgproc::COLOR_GRAY2BGR),
        4 => Some(imgproc::COLOR_BGRA2BGR),
        n => {
            return Err(VisionError::Capture(format!(
                "unsupported channel count {n}"
            )));
        }
    };

    let mut converted = Mat::default();
    let bgr = match conversion {
        Some(code) => {
            imgproc::cvt_color(mat, &mut converted, code, 0).map_err(capture_error)?;
            &converted
        }
        None => mat,
    };

    let bytes = if bgr.is_continuous() {
        bgr.data_bytes().map_err(capture_error)?.to_vec()
    } else {
        let packed = bgr.try_clone().map_err(capture_error)?;
        packed.data_bytes().map_err(capture_error)?.to_vec()
    };
    Frame::from_bgr_bytes(bgr.cols() as u32, bgr.rows() as u32, bytes)
}
