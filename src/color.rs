use std::fmt;

use crate::error::{StemkitError, StemkitResult};

const ONE_THIRD: f64 = 1.0 / 3.0;
const ONE_SIXTH: f64 = 1.0 / 6.0;
const TWO_THIRD: f64 = 2.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// HSL with every component normalized to 0..1 (hue is a fraction of a full turn).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Average of the three channels on the 0..255 scale.
    pub fn brightness(self) -> f64 {
        (f64::from(self.r) + f64::from(self.g) + f64::from(self.b)) / 3.0
    }

    pub fn to_unit(self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }

    /// Inverse of [`Rgb8::to_unit`]. Channels are truncated, not rounded.
    pub fn from_unit(rgb: [f64; 3]) -> Self {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0) as u8
        }
        Self::new(to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]))
    }

    pub fn to_hsl(self) -> Hsl {
        rgb_to_hsl(self.to_unit())
    }

    pub fn from_hsl(hsl: Hsl) -> Self {
        Self::from_unit(hsl_to_rgb(hsl))
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}

impl From<image::Rgb<u8>> for Rgb8 {
    fn from(px: image::Rgb<u8>) -> Self {
        let [r, g, b] = px.0;
        Self::new(r, g, b)
    }
}

impl std::str::FromStr for Rgb8 {
    type Err = StemkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s)
    }
}

/// Parses `#rrggbb` (the `#` is optional, digits are case-insensitive).
pub fn parse_hex(s: &str) -> StemkitResult<Rgb8> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StemkitError::validation(format!(
            "invalid hex color \"{s}\": expected #RRGGBB"
        )));
    }

    let byte = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| StemkitError::validation(format!("invalid hex byte in \"{s}\"")))
    };

    Ok(Rgb8::new(byte(0)?, byte(2)?, byte(4)?))
}

pub fn rgb_to_hsl(rgb: [f64; 3]) -> Hsl {
    let [r, g, b] = rgb;
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let sumc = maxc + minc;
    let rangec = maxc - minc;
    let l = sumc / 2.0;

    if minc == maxc {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let s = if l <= 0.5 {
        rangec / sumc
    } else {
        // Evaluated as `2 - max - min`, not `2 - sum`.
        rangec / (2.0 - maxc - minc)
    };

    let rc = (maxc - r) / rangec;
    let gc = (maxc - g) / rangec;
    let bc = (maxc - b) / rangec;

    let h = if r == maxc {
        bc - gc
    } else if g == maxc {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    Hsl {
        h: (h / 6.0).rem_euclid(1.0),
        s,
        l,
    }
}

pub fn hsl_to_rgb(hsl: Hsl) -> [f64; 3] {
    let Hsl { h, s, l } = hsl;
    if s == 0.0 {
        return [l, l, l];
    }

    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - (l * s) };
    let m1 = 2.0 * l - m2;

    [
        hue_to_channel(m1, m2, h + ONE_THIRD),
        hue_to_channel(m1, m2, h),
        hue_to_channel(m1, m2, h - ONE_THIRD),
    ]
}

fn hue_to_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < ONE_SIXTH {
        return m1 + (m2 - m1) * hue * 6.0;
    }
    if hue < 0.5 {
        return m2;
    }
    if hue < TWO_THIRD {
        return m1 + (m2 - m1) * (TWO_THIRD - hue) * 6.0;
    }
    m1
}
