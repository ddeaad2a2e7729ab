// THEORY:
// The `Frame` module represents one captured image. It is the unit of work for the
// whole detector: every iteration of the loop produces exactly one `Frame`, runs it
// through the pipeline, and drops it. Nothing survives into the next iteration.
//
// Key architectural principles:
// 1.  **Device Order**: Bytes are stored exactly as the camera produces them, three
//     channels per pixel in blue, green, red order, rows packed without padding.
//     Converting to any other layout is the job of the caller or of `Pixel`.
// 2.  **Validated Construction**: A `Frame` can only be built from a buffer whose
//     length matches `width * height * 3`, so downstream code may index freely.
// 3.  **Data Container**: Like `Pixel`, `Frame` is "dumb". It knows how to hand out
//     its pixels and summarize itself, but it does not know what "blue" means.

pub mod frame {
    use crate::core_modules::pixel::pixel::{Byte, CHANNELS, Pixel};
    use crate::error::VisionError;

    /// A "dumb" data container for a single BGR camera image.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Frame {
        /// The width of the frame in pixels.
        width: u32,
        /// The height of the frame in pixels.
        height: u32,
        /// Packed BGR bytes, row-major.
        data: Vec<Byte>,
    }

    impl Frame {
        /// Wraps a packed BGR buffer, rejecting buffers of the wrong length.
        pub fn from_bgr_bytes(width: u32, height: u32, data: Vec<Byte>) -> Result<Self, VisionError> {
            let expected = width as usize * height as usize * CHANNELS;
            if data.len() != expected {
                return Err(VisionError::FrameSize {
                    expected,
                    got: data.len(),
                });
            }
            Ok(Self {
                width,
                height,
                data,
            })
        }

        /// A frame where every pixel has the same color.
        pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
            let bytes: [Byte; CHANNELS] = pixel.into();
            let count = width as usize * height as usize;
            let mut data = Vec::with_capacity(count * CHANNELS);
            for _ in 0..count {
                data.extend_from_slice(&bytes);
            }
            Self {
                width,
                height,
                data,
            }
        }

        /// Builds a frame from a row-major pixel list.
        pub fn from_pixels(width: u32, height: u32, pixels: &[Pixel]) -> Result<Self, VisionError> {
            let data = pixels
                .iter()
                .flat_map(|pixel| <[Byte; CHANNELS]>::from(*pixel))
                .collect();
            Self::from_bgr_bytes(width, height, data)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn pixel_count(&self) -> usize {
            self.width as usize * self.height as usize
        }

        /// True for zero-area frames, which carry no pixels to classify.
        pub fn is_empty(&self) -> bool {
            self.pixel_count() == 0
        }

        pub fn as_bytes(&self) -> &[Byte] {
            &self.data
        }

        /// The pixel at column `x`, row `y`, or `None` outside the frame.
        pub fn pixel_at(&self, x: u32, y: u32) -> Option<Pixel> {
            if x >= self.width || y >= self.height {
                return None;
            }
            let start = (y as usize * self.width as usize + x as usize) * CHANNELS;
            let bytes = &self.data[start..start + CHANNELS];
            Some(Pixel::new(bytes[0], bytes[1], bytes[2]))
        }

        /// Iterates pixels in row-major order.
        pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
            self.data
                .chunks_exact(CHANNELS)
                .map(|bytes| Pixel::new(bytes[0], bytes[1], bytes[2]))
        }

        /// Calculates the average pixel value for the entire frame.
        pub fn average_pixel(&self) -> Pixel {
            let num_pixels = self.pixel_count() as u64;
            if num_pixels == 0 {
                return Pixel::default();
            }

            let (mut sum_b, mut sum_g, mut sum_r) = (0u64, 0u64, 0u64);
            for pixel in self.pixels() {
                sum_b += pixel.blue as u64;
                sum_g += pixel.green as u64;
                sum_r += pixel.red as u64;
            }

            Pixel::new(
                (sum_b / num_pixels) as Byte,
                (sum_g / num_pixels) as Byte,
                (sum_r / num_pixels) as Byte,
            )
        }
    }
}
