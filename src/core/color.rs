use crate::prelude::HashMap;
use crate::{MapError, Result};
use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

/// CSS colour with an opacity in `0.0..=1.0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: f64,
}

static NAMED_COLORS: Lazy<HashMap<&'static str, Color>> = Lazy::new(|| {
    [
        ("black", Color::rgb(0, 0, 0)),
        ("white", Color::rgb(255, 255, 255)),
        ("red", Color::rgb(255, 0, 0)),
        ("green", Color::rgb(0, 128, 0)),
        ("lime", Color::rgb(0, 255, 0)),
        ("blue", Color::rgb(0, 0, 255)),
        ("yellow", Color::rgb(255, 255, 0)),
        ("orange", Color::rgb(255, 165, 0)),
        ("purple", Color::rgb(128, 0, 128)),
        ("magenta", Color::rgb(255, 0, 255)),
        ("fuchsia", Color::rgb(255, 0, 255)),
        ("cyan", Color::rgb(0, 255, 255)),
        ("aqua", Color::rgb(0, 255, 255)),
        ("gray", Color::rgb(128, 128, 128)),
        ("grey", Color::rgb(128, 128, 128)),
        ("silver", Color::rgb(192, 192, 192)),
        ("maroon", Color::rgb(128, 0, 0)),
        ("olive", Color::rgb(128, 128, 0)),
        ("navy", Color::rgb(0, 0, 128)),
        ("teal", Color::rgb(0, 128, 128)),
        ("brown", Color::rgb(165, 42, 42)),
        ("pink", Color::rgb(255, 192, 203)),
        ("gold", Color::rgb(255, 215, 0)),
        ("indigo", Color::rgb(75, 0, 130)),
        ("violet", Color::rgb(238, 130, 238)),
        ("crimson", Color::rgb(220, 20, 60)),
        ("darkgreen", Color::rgb(0, 100, 0)),
        ("darkblue", Color::rgb(0, 0, 139)),
        ("darkred", Color::rgb(139, 0, 0)),
        ("darkorange", Color::rgb(255, 140, 0)),
        ("steelblue", Color::rgb(70, 130, 180)),
        ("transparent", Color::TRANSPARENT),
    ]
    .into_iter()
    .collect()
});

impl Color {
    pub const BLACK: Color = Color::rgba(0, 0, 0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` or a CSS colour name.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::try_from_hex(hex)
                .ok_or_else(|| MapError::ParseError(format!("invalid hex colour: {value}")));
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::from_functional(args)
                .ok_or_else(|| MapError::ParseError(format!("invalid rgb colour: {value}")));
        }
        NAMED_COLORS
            .get(lower.as_str())
            .copied()
            .ok_or_else(|| MapError::ParseError(format!("unknown colour: {value}")))
    }

    /// Like [`Color::parse`], falling back to black for anything unparseable.
    pub fn parse_or_black(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|err| {
            log::debug!("{err}, using black");
            Color::BLACK
        })
    }

    fn try_from_hex(hex: &str) -> Option<Self> {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::rgb(it.next()??, it.next()??, it.next()??))
            }
            6 | 8 => {
                let r = channel(hex.get(0..2)?)?;
                let g = channel(hex.get(2..4)?)?;
                let b = channel(hex.get(4..6)?)?;
                let a = match hex.get(6..8) {
                    Some(a) if !a.is_empty() => channel(a)? as f64 / 255.0,
                    _ => 1.0,
                };
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    fn from_functional(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8);
        let a = match parts.get(3) {
            Some(a) => a.parse::<f64>().ok()?.clamp(0.0, 1.0),
            None => 1.0,
        };
        Some(Self::rgba(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            a,
        ))
    }

    pub fn r(&self) -> u8 {
        self.r
    }

    pub fn g(&self) -> u8 {
        self.g
    }

    pub fn b(&self) -> u8 {
        self.b
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn with_alpha(&self, a: f64) -> Self {
        Self { a, ..*self }
    }

    /// `rgba(r, g, b, a)` with the alpha printed in its shortest form.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// The colour at half its opacity, used for marker fills.
pub fn transparent_fill(color: &str) -> String {
    let c = Color::parse_or_black(color);
    c.with_alpha(c.a() / 2.0).to_css()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(Color::parse("#ffcc33").unwrap(), Color::rgb(255, 204, 51));
        assert_eq!(Color::parse("#fff").unwrap(), Color::rgb(255, 255, 255));
        assert_eq!(Color::parse("rgba(10, 20, 30, 0.4)").unwrap(), Color::rgba(10, 20, 30, 0.4));
        assert_eq!(Color::parse("Yellow").unwrap(), Color::rgb(255, 255, 0));
        assert!(Color::parse("not-a-colour").is_err());
        assert!(Color::parse("#12345").is_err());
    }

    #[test]
    fn test_transparent_fill_halves_alpha() {
        assert_eq!(transparent_fill("yellow"), "rgba(255, 255, 0, 0.5)");
        assert_eq!(transparent_fill("rgba(1, 2, 3, 0.4)"), "rgba(1, 2, 3, 0.2)");
    }

    #[test]
    fn test_unparseable_colour_falls_back_to_black() {
        assert_eq!(Color::parse_or_black("???"), Color::BLACK);
    }
}
