// THEORY:
// The mask is the bridge between per-pixel color tests and the single number the
// classifier consumes. It is an 8-bit grayscale image with the same dimensions as
// the source frame: 255 where the pixel is inside the color range, 0 elsewhere.
// Keeping it as a real image (rather than a bit vector) means it can be shown in a
// preview window as-is.

pub mod mask {
    use crate::core_modules::color_range::color_range::ColorRange;
    use crate::core_modules::frame::frame::Frame;
    use image::{GrayImage, Luma};

    /// Binary selection grid; nonzero cells are "in range".
    pub type Mask = GrayImage;

    /// Intensity written for selected cells.
    pub const MASK_ON: u8 = 255;
    /// Intensity written for rejected cells.
    pub const MASK_OFF: u8 = 0;

    /// Builds the in-range mask for `frame`.
    pub fn build_mask(frame: &Frame, range: &ColorRange) -> Mask {
        GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            let selected = frame.pixel_at(x, y).is_some_and(|pixel| range.matches(pixel));
            Luma([if selected { MASK_ON } else { MASK_OFF }])
        })
    }

    pub fn selected_count(mask: &Mask) -> usize {
        mask.as_raw().iter().filter(|&&cell| cell != MASK_OFF).count()
    }

    /// Fraction of nonzero cells, in [0, 1]. An empty mask has ratio 0.
    pub fn detection_ratio(mask: &Mask) -> f64 {
        let total = mask.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        selected_count(mask) as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::mask::*;
    use crate::core_modules::color_range::color_range::BLUE_RANGE;
    use crate::core_modules::frame::frame::Frame;
    use crate::core_modules::pixel::pixel::Pixel;

    const BLUE: Pixel = Pixel::new(255, 0, 0);
    const RED: Pixel = Pixel::new(0, 0, 255);

    #[test]
    fn mask_matches_frame_dimensions() {
        for (w, h) in [(1, 1), (7, 3), (64, 48)] {
            let mask = build_mask(&Frame::filled(w, h, RED), &BLUE_RANGE);
            assert_eq!(mask.dimensions(), (w, h));
        }
    }

    #[test]
    fn all_blue_frame_is_fully_selected() {
        let mask = build_mask(&Frame::filled(16, 9, BLUE), &BLUE_RANGE);
        assert!(mask.as_raw().iter().all(|&cell| cell == MASK_ON));
        assert_eq!(detection_ratio(&mask), 1.0);
    }

    #[test]
    fn all_red_frame_is_never_selected() {
        let mask = build_mask(&Frame::filled(16, 9, RED), &BLUE_RANGE);
        assert_eq!(selected_count(&mask), 0);
        assert_eq!(detection_ratio(&mask), 0.0);
    }

    #[test]
    fn ratio_counts_selected_cells() {
        // One blue pixel in a 2x2 frame.
        let frame = Frame::from_pixels(2, 2, &[BLUE, RED, RED, RED]).unwrap();
        let mask = build_mask(&frame, &BLUE_RANGE);
        assert_eq!(mask.get_pixel(0, 0).0, [MASK_ON]);
        assert_eq!(mask.get_pixel(1, 0).0, [MASK_OFF]);
        assert_eq!(detection_ratio(&mask), 0.25);
    }

    #[test]
    fn ratio_stays_in_unit_interval() {
        let pixels: Vec<Pixel> = (0..=255u8)
            .map(|i| Pixel::new(i, i.wrapping_mul(7), i.wrapping_mul(13)))
            .collect();
        let frame = Frame::from_pixels(16, 16, &pixels).unwrap();
        let ratio = detection_ratio(&build_mask(&frame, &BLUE_RANGE));
        assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn empty_mask_has_zero_ratio() {
        let frame = Frame::from_bgr_bytes(0, 0, Vec::new()).unwrap();
        assert_eq!(detection_ratio(&build_mask(&frame, &BLUE_RANGE)), 0.0);
    }
}
