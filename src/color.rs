use glam::DVec3;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// 8-bit RGB color, printed as `#rrggbb`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline(always)]
    fn to_vec(self) -> DVec3 {
        DVec3::new(self.r as f64, self.g as f64, self.b as f64)
    }

    #[inline(always)]
    fn from_vec(v: DVec3) -> Self {
        let v = v.round().clamp(DVec3::ZERO, DVec3::splat(255.0));
        Self::rgb(v.x as u8, v.y as u8, v.z as u8)
    }

    /// Linear interpolation in RGB space, `t` clamped to [0, 1]
    pub fn lerp(self, other: Color, t: f64) -> Color {
        Self::from_vec(self.to_vec().lerp(other.to_vec(), t.clamp(0.0, 1.0)))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts `#rrggbb` and the short `#rgb` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || Error::Color(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
        if !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());

        match hex.len() {
            6 => Ok(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|c| c * 17);
                Ok(Self::rgb(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(bad()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let c: Color = "#1a2B3c".parse().unwrap();
        assert_eq!(c, Color::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(c.to_string(), "#1a2b3c");
    }

    #[test]
    fn test_parse_short_form() {
        let c: Color = "#f80".parse().unwrap();
        assert_eq!(c, Color::rgb(0xff, 0x88, 0x00));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("ff0000".parse::<Color>().is_err());
        assert!("#ff00".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        assert_eq!(Color::WHITE.lerp(Color::RED, 0.0), Color::WHITE);
        assert_eq!(Color::WHITE.lerp(Color::RED, 1.0), Color::RED);
        assert_eq!(Color::WHITE.lerp(Color::RED, 0.5), Color::rgb(255, 128, 128));
        // Out of range is clamped
        assert_eq!(Color::WHITE.lerp(Color::RED, 7.0), Color::RED);
    }
}
