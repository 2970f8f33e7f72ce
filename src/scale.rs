//! Numeric scales used by conditional formatting.

use std::fmt;
use std::str::FromStr;

/// Observed (min, max) over the values that are numeric; `None` when none are.
pub fn extent<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}

/// Position of `v` within `[a, b]`; a degenerate domain maps everything to the midpoint.
fn normalize(a: f64, b: f64, v: f64) -> f64 {
    let span = b - a;
    if span == 0.0 {
        0.5
    } else {
        (v - a) / span
    }
}

fn sign_pow(v: f64, exponent: f64) -> f64 {
    if v < 0.0 {
        -(-v).powf(exponent)
    } else {
        v.powf(exponent)
    }
}

/// Power scale: the domain is raised to `exponent` (sign-preserving) before linear mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
    pub exponent: f64,
}

impl PowScale {
    pub fn new(domain: (f64, f64), range: (f64, f64), exponent: f64) -> Self {
        Self {
            domain,
            range,
            exponent,
        }
    }

    pub fn sqrt(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self::new(domain, range, 0.5)
    }

    pub fn map(&self, v: f64) -> f64 {
        let t = normalize(
            sign_pow(self.domain.0, self.exponent),
            sign_pow(self.domain.1, self.exponent),
            sign_pow(v, self.exponent),
        );
        let (r0, r1) = self.range;
        r0 + t * (r1 - r0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex color '{}'", self.0)
    }
}

impl std::error::Error for ColorParseError {}

impl FromStr for Rgb {
    type Err = ColorParseError;

    /// Accepts `#rgb` and `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
                Ok(Rgb {
                    r: expand(0)?,
                    g: expand(1)?,
                    b: expand(2)?,
                })
            }
            6 => Ok(Rgb {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Linear interpolation between two colors in RGB space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearColorScale {
    pub domain: (f64, f64),
    pub range: (Rgb, Rgb),
}

impl LinearColorScale {
    pub fn new(domain: (f64, f64), range: (Rgb, Rgb)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, v: f64) -> Rgb {
        let t = normalize(self.domain.0, self.domain.1, v);
        let lerp = |a: u8, b: u8| {
            let value = a as f64 + t * (b as f64 - a as f64);
            value.round().clamp(0.0, 255.0) as u8
        };
        let (lo, hi) = self.range;
        Rgb {
            r: lerp(lo.r, hi.r),
            g: lerp(lo.g, hi.g),
            b: lerp(lo.b, hi.b),
        }
    }
}
