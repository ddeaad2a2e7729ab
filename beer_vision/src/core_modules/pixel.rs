// THEORY (Single-Pixel Color Model):
// The `Pixel` module is the most fundamental unit of the detector. It is a "dumb"
// data container for one camera pixel in device order (blue, green, red) plus the
// single conversion every later stage depends on: BGR → 8-bit HSV.
//
// The HSV representation is the compact 8-bit one used by camera tooling:
//   • hue        0..180  (degrees / 2, so it fits in a byte)
//   • saturation 0..255  (chroma / value, scaled)
//   • value      0..255  (the maximum channel)
//
// Exactness matters more than elegance here. Thresholds such as "hue 90..130" are
// only meaningful if every frame is converted the same way a camera pipeline would
// convert it, so the conversion reproduces the integer fixed-point algorithm:
//   - value = max(b, g, r), chroma = value - min(b, g, r)
//   - saturation = round(chroma * 255 / value) via a 12-bit reciprocal table
//   - hue sector chosen red first, then green, then blue when channels tie
//   - hue = round(sector_offset * 180 / (6 * chroma)) via a second 12-bit table,
//     wrapped into [0, 180)
// Both reciprocal tables are 256 entries, built once behind a `OnceLock`; the hot
// path is two table lookups, a multiply and a shift per pixel. No floats per pixel.

pub mod pixel {
    use serde::Deserialize;
    use std::sync::OnceLock;

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Hue = Byte;
    pub type Saturation = Byte;
    pub type Value = Byte;
    pub type Chroma = Byte;

    /// Bytes per pixel in a device-order frame buffer.
    pub const CHANNELS: usize = 3;
    /// Exclusive upper end of the 8-bit hue scale.
    pub const HUE_SCALE: i32 = 180;

    const HSV_SHIFT: u32 = 12;
    const HSV_ROUND: i32 = 1 << (HSV_SHIFT - 1);

    struct DivisionTables {
        /// round((255 << 12) / v) for v in 1..=255; index 0 is unused.
        saturation: [i32; 256],
        /// round((180 << 12) / (6 * chroma)) for chroma in 1..=255; index 0 is unused.
        hue: [i32; 256],
    }

    static DIVISION_TABLES: OnceLock<DivisionTables> = OnceLock::new();

    fn division_tables() -> &'static DivisionTables {
        DIVISION_TABLES.get_or_init(|| {
            let mut saturation = [0i32; 256];
            let mut hue = [0i32; 256];
            for i in 1..256usize {
                let divisor = i as f64;
                saturation[i] = (((255 << HSV_SHIFT) as f64) / divisor).round_ties_even() as i32;
                hue[i] = (((HUE_SCALE << HSV_SHIFT) as f64) / (6.0 * divisor)).round_ties_even() as i32;
            }
            DivisionTables { saturation, hue }
        })
    }

    /// A single pixel in the 8-bit hue/saturation/value representation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
    #[serde(from = "[Byte; 3]")]
    pub struct Hsv {
        /// Hue on the half-degree scale, 0..180.
        pub hue: Hue,
        pub saturation: Saturation,
        pub value: Value,
    }

    impl Hsv {
        pub const fn new(hue: Hue, saturation: Saturation, value: Value) -> Self {
            Self {
                hue,
                saturation,
                value,
            }
        }
    }

    impl From<[Byte; 3]> for Hsv {
        fn from([hue, saturation, value]: [Byte; 3]) -> Self {
            Hsv::new(hue, saturation, value)
        }
    }

    /// A "dumb" data container representing a single pixel in device (BGR) order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The red channel value (0-255).
        pub red: Channel,
    }

    impl Pixel {
        pub const fn new(blue: Channel, green: Channel, red: Channel) -> Self {
            Pixel { blue, green, red }
        }

        /// Brightest channel; the HSV value.
        pub fn value(&self) -> Value {
            self.blue.max(self.green).max(self.red)
        }

        /// max - min across the three channels.
        pub fn chroma(&self) -> Chroma {
            self.value() - self.blue.min(self.green).min(self.red)
        }

        /// Converts to 8-bit HSV with the fixed-point camera algorithm.
        pub fn to_hsv(&self) -> Hsv {
            let tables = division_tables();
            let (b, g, r) = (self.blue as i32, self.green as i32, self.red as i32);
            let value = self.value() as i32;
            let chroma = self.chroma() as i32;

            let saturation = (chroma * tables.saturation[value as usize] + HSV_ROUND) >> HSV_SHIFT;

            // Sector precedence is red, then green, then blue.
            let sector = if value == r {
                g - b
            } else if value == g {
                b - r + 2 * chroma
            } else {
                r - g + 4 * chroma
            };
            let mut hue = (sector * tables.hue[chroma as usize] + HSV_ROUND) >> HSV_SHIFT;
            if hue < 0 {
                hue += HUE_SCALE;
            }

            Hsv::new(hue as Hue, saturation as Saturation, value as Value)
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from([blue, green, red]: [Byte; CHANNELS]) -> Self {
            Pixel::new(blue, green, red)
        }
    }

    impl From<Pixel> for [Byte; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.blue, pixel.green, pixel.red]
        }
    }
}
