// THEORY:
// A `ColorRange` is the entire "model" of what a beer can looks like: an inclusive
// box in 8-bit HSV space. A pixel either falls inside the box or it does not; there
// is no partial membership, no learning, and no adaptation to lighting.
//
// Hue is circular, so a box whose lower hue is greater than its upper hue is read as
// wrapping through zero (e.g. 170..10 selects reds on both sides of the seam).
// Saturation and value are linear and never wrap.

pub mod color_range {
    use crate::core_modules::pixel::pixel::{Hsv, Pixel};
    use serde::Deserialize;

    /// The default "blue can" selection box: hue 90-130, saturation 80-255, value 60-255.
    pub const BLUE_RANGE: ColorRange = ColorRange {
        lower: Hsv::new(90, 80, 60),
        upper: Hsv::new(130, 255, 255),
    };

    /// An inclusive selection box over 8-bit HSV.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
    pub struct ColorRange {
        pub lower: Hsv,
        pub upper: Hsv,
    }

    impl Default for ColorRange {
        fn default() -> Self {
            BLUE_RANGE
        }
    }

    impl ColorRange {
        pub const fn new(lower: Hsv, upper: Hsv) -> Self {
            Self { lower, upper }
        }

        /// True when the hue interval passes through the 0/180 seam.
        pub fn wraps_hue(&self) -> bool {
            self.lower.hue > self.upper.hue
        }

        pub fn contains(&self, hsv: Hsv) -> bool {
            let hue_in_range = if self.wraps_hue() {
                hsv.hue >= self.lower.hue || hsv.hue <= self.upper.hue
            } else {
                hsv.hue >= self.lower.hue && hsv.hue <= self.upper.hue
            };
            hue_in_range
                && (self.lower.saturation..=self.upper.saturation).contains(&hsv.saturation)
                && (self.lower.value..=self.upper.value).contains(&hsv.value)
        }

        /// Converts the pixel and tests it against the box.
        pub fn matches(&self, pixel: Pixel) -> bool {
            self.contains(pixel.to_hsv())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::color_range::*;
    use crate::core_modules::pixel::pixel::{Hsv, Pixel};

    #[test]
    fn bounds_are_inclusive() {
        assert!(BLUE_RANGE.contains(Hsv::new(90, 80, 60)));
        assert!(BLUE_RANGE.contains(Hsv::new(130, 255, 255)));
        assert!(!BLUE_RANGE.contains(Hsv::new(89, 200, 200)));
        assert!(!BLUE_RANGE.contains(Hsv::new(131, 200, 200)));
        assert!(!BLUE_RANGE.contains(Hsv::new(110, 79, 200)));
        assert!(!BLUE_RANGE.contains(Hsv::new(110, 200, 59)));
    }

    #[test]
    fn default_range_is_blue() {
        assert_eq!(ColorRange::default(), BLUE_RANGE);
        assert!(!BLUE_RANGE.wraps_hue());
        assert!(BLUE_RANGE.matches(Pixel::new(255, 0, 0)));
        assert!(!BLUE_RANGE.matches(Pixel::new(0, 0, 255)));
        assert!(!BLUE_RANGE.matches(Pixel::new(0, 255, 0)));
    }

    #[test]
    fn dark_blue_fails_the_value_floor() {
        // Hue 120, full saturation, but value 40 < 60.
        assert!(!BLUE_RANGE.matches(Pixel::new(40, 0, 0)));
    }

    #[test]
    fn wrapped_hue_selects_both_sides_of_the_seam() {
        let reds = ColorRange::new(Hsv::new(170, 50, 50), Hsv::new(10, 255, 255));
        assert!(reds.wraps_hue());
        assert!(reds.contains(Hsv::new(175, 100, 100)));
        assert!(reds.contains(Hsv::new(0, 100, 100)));
        assert!(reds.contains(Hsv::new(10, 100, 100)));
        assert!(!reds.contains(Hsv::new(90, 100, 100)));
        assert!(reds.matches(Pixel::new(0, 0, 255)));
    }
}
