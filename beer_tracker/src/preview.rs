use beer_vision::{Frame, Mask, PreviewSurface, VisionError};
use opencv::{
    core::{self, Mat, Scalar},
    highgui,
    prelude::*,
};
use std::time::Duration;
use tracing::warn;

pub const FRAME_WINDOW: &str = "Frame";
pub const MASK_WINDOW: &str = "Blue Mask";

fn display_error(e: opencv::Error) -> VisionError {
    VisionError::Display(e.to_string())
}

/// Two HighGUI windows: the raw frame and the blue mask.
///
/// Windows are created lazily by the first `imshow`, so nothing appears if the
/// camera never opens.
pub struct HighGuiPreview {
    frame_mat: Mat,
    mask_mat: Mat,
}

impl HighGuiPreview {
    pub fn new() -> Self {
        Self {
            frame_mat: Mat::default(),
            mask_mat: Mat::default(),
        }
    }
}

impl Default for HighGuiPreview {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies `bytes` into `target`, reallocating only when the shape changes.
fn upload(target: &mut Mat, rows: i32, cols: i32, typ: i32, bytes: &[u8]) -> opencv::Result<()> {
    if target.rows() != rows || target.cols() != cols || target.typ() != typ {
        *target = Mat::new_rows_cols_with_default(rows, cols, typ, Scalar::all(0.0))?;
    }
    target.data_bytes_mut()?.copy_from_slice(bytes);
    Ok(())
}

impl PreviewSurface for HighGuiPreview {
    fn show(&mut self, frame: &Frame, mask: &Mask) -> Result<(), VisionError> {
        upload(
            &mut self.frame_mat,
            frame.height() as i32,
            frame.width() as i32,
            core::CV_8UC3,
            frame.as_bytes(),
        )
        .map_err(display_error)?;
        upload(
            &mut self.mask_mat,
            mask.height() as i32,
            mask.width() as i32,
            core::CV_8UC1,
            mask.as_raw(),
        )
        .map_err(display_error)?;

        highgui::imshow(FRAME_WINDOW, &self.frame_mat).map_err(display_error)?;
        highgui::imshow(MASK_WINDOW, &self.mask_mat).map_err(display_error)?;
        Ok(())
    }

    fn poll_key(&mut self, wait: Duration) -> Result<Option<i32>, VisionError> {
        let delay = wait.as_millis().clamp(1, i32::MAX as u128) as i32;
        let key = highgui::wait_key(delay).map_err(display_error)?;
        Ok((key >= 0).then_some(key))
    }

    fn close(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            warn!(error = %e, "failed to close preview windows");
        }
    }
}
