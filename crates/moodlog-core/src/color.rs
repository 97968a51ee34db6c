//! HSLA color values.
//!
//! Registry colors are written in CSS `hsla(h, s%, l%, a)` notation so they
//! can be handed to any renderer unchanged. [`Hsla`] parses that notation and
//! converts it to 8-bit RGB for terminals.

use std::fmt;
use std::str::FromStr;

use crate::error::MoodlogError;

/// A parsed `hsla(...)` color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    /// Hue in degrees, `[0, 360)`
    pub hue: f32,
    /// Saturation, `[0, 1]`
    pub saturation: f32,
    /// Lightness, `[0, 1]`
    pub lightness: f32,
    /// Alpha, `[0, 1]`
    pub alpha: f32,
}

impl Hsla {
    /// Convert to RGB, ignoring alpha.
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let s = self.saturation;
        let l = self.lightness;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    /// Blend toward `background` by this color's alpha.
    pub fn over(&self, background: (u8, u8, u8)) -> (u8, u8, u8) {
        let (r, g, b) = self.to_rgb();
        let a = self.alpha;
        let mix = |fg: u8, bg: u8| (fg as f32 * a + bg as f32 * (1.0 - a)).round() as u8;
        (mix(r, background.0), mix(g, background.1), mix(b, background.2))
    }
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            self.hue,
            self.saturation * 100.0,
            self.lightness * 100.0,
            self.alpha
        )
    }
}

impl FromStr for Hsla {
    type Err = MoodlogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || MoodlogError::InvalidInput(format!("Invalid hsla color: {}", value));

        let inner = value
            .trim()
            .strip_prefix("hsla(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(invalid());
        }

        let number = |raw: &str| raw.parse::<f32>().map_err(|_| invalid());
        let percent = |raw: &str| {
            raw.strip_suffix('%')
                .ok_or_else(invalid)
                .and_then(|n| number(n))
                .map(|n| n / 100.0)
        };

        let hue = number(parts[0])?;
        let saturation = percent(parts[1])?;
        let lightness = percent(parts[2])?;
        let alpha = number(parts[3])?;

        let unit = 0.0_f32..=1.0;
        if !(0.0_f32..360.0).contains(&hue)
            || !unit.contains(&saturation)
            || !unit.contains(&lightness)
            || !unit.contains(&alpha)
        {
            return Err(invalid());
        }

        Ok(Self {
            hue,
            saturation,
            lightness,
            alpha,
        })
    }
}
