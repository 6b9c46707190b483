//! Theme profiles and color values.
//!
//! A [`ThemeProfile`] is static configuration: it picks the background
//! treatment, particle and line colors, and the aurora palette for one of the
//! two page themes. Colors are kept in sRGB with a straight (non-premultiplied)
//! alpha, the same representation CSS uses, so they can be handed to a browser
//! canvas unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Page theme the background is mounted under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The full palette for this theme.
    pub fn profile(self) -> ThemeProfile {
        ThemeProfile::for_theme(self)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a theme name is neither `light` nor `dark`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme `{0}` (expected `light` or `dark`)")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}

/// An sRGB color with straight alpha in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

/// Error returned by [`Rgba::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CSS color `{0}`")]
pub struct ColorParseError(pub String);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::rgba(0, 0, 0, 0.0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with its alpha replaced (clamped to `0..=1`).
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: clamp_unit(a),
            ..self
        }
    }

    /// Same color with its alpha multiplied by `factor`.
    ///
    /// This is how a canvas `globalAlpha` is folded into a fill or stroke.
    pub fn scale_alpha(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// Premultiplied `[r, g, b, a]` in `0.0..=1.0`.
    pub fn premultiplied(&self) -> [f32; 4] {
        let a = clamp_unit(self.a);
        [
            self.r as f32 / 255.0 * a,
            self.g as f32 / 255.0 * a,
            self.b as f32 / 255.0 * a,
            a,
        ]
    }

    /// Linear interpolation in premultiplied space, returned premultiplied.
    pub fn mix_premultiplied(a: &Rgba, b: &Rgba, t: f32) -> [f32; 4] {
        let t = clamp_unit(t);
        let pa = a.premultiplied();
        let pb = b.premultiplied();
        [
            pa[0] + (pb[0] - pa[0]) * t,
            pa[1] + (pb[1] - pa[1]) * t,
            pa[2] + (pb[2] - pa[2]) * t,
            pa[3] + (pb[3] - pa[3]) * t,
        ]
    }

    /// CSS text: `#rrggbb` when opaque, `rgba(r, g, b, a)` otherwise.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, trim_float(self.a))
        }
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let s = input.trim();
        let err = || ColorParseError(input.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            let digits: Vec<u8> = hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8))
                .collect::<Option<_>>()
                .ok_or_else(err)?;
            return match digits.as_slice() {
                [r, g, b] => Ok(Rgba::rgb(r * 17, g * 17, b * 17)),
                [r1, r0, g1, g0, b1, b0] => {
                    Ok(Rgba::rgb(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0))
                }
                _ => Err(err()),
            };
        }

        let (body, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(err());
        };
        let body = body.strip_suffix(')').ok_or_else(err)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();

        let channel = |p: &str| p.parse::<u8>().map_err(|_| err());
        match (parts.as_slice(), has_alpha) {
            ([r, g, b], false) => Ok(Rgba::rgb(channel(*r)?, channel(*g)?, channel(*b)?)),
            ([r, g, b, a], true) => {
                let a: f32 = a.parse().map_err(|_| err())?;
                if !a.is_finite() {
                    return Err(err());
                }
                Ok(Rgba::rgba(channel(*r)?, channel(*g)?, channel(*b)?, clamp_unit(a)))
            }
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgba::parse(s)
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::parse(&value)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_css()
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn trim_float(v: f32) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

const LIGHT_AURORAS: &[Rgba] = &[
    Rgba::rgba(124, 58, 237, 0.15),
    Rgba::rgba(59, 130, 246, 0.10),
    Rgba::rgba(16, 185, 129, 0.05),
];

const DARK_AURORAS: &[Rgba] = &[
    Rgba::rgba(124, 58, 237, 0.08),
    Rgba::rgba(59, 130, 246, 0.05),
];

/// Palette and density choices for one theme.
#[derive(Clone, Debug, PartialEq)]
pub struct ThemeProfile {
    pub theme: Theme,
    /// Opaque fill painted every frame, or `None` to clear to transparent so
    /// the host page shows through.
    pub background: Option<Rgba>,
    pub particle: Rgba,
    /// Tint of the faint 40px reference grid.
    pub grid: Rgba,
    /// Base stroke color of connection lines, before distance fall-off.
    pub link: Rgba,
    /// One entry per aurora seeded; also fixes the aurora count.
    pub auroras: &'static [Rgba],
    /// Outer stop of every aurora gradient.
    pub aurora_edge: Rgba,
}

impl ThemeProfile {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                theme,
                background: Some(Rgba::WHITE),
                particle: Rgba::rgb(0x7c, 0x3a, 0xed),
                grid: Rgba::rgba(124, 58, 237, 0.03),
                link: Rgba::rgba(124, 58, 237, 0.15),
                auroras: LIGHT_AURORAS,
                aurora_edge: Rgba::rgba(255, 255, 255, 0.0),
            },
            Theme::Dark => Self {
                theme,
                background: None,
                particle: Rgba::rgb(0xa7, 0x8b, 0xfa),
                grid: Rgba::rgba(255, 255, 255, 0.03),
                link: Rgba::rgba(167, 139, 250, 0.15),
                auroras: DARK_AURORAS,
                aurora_edge: Rgba::rgba(255, 255, 255, 0.0),
            },
        }
    }

    pub fn aurora_count(&self) -> usize {
        self.auroras.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parse() {
        assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!(" DARK ".parse::<Theme>(), Ok(Theme::Dark));
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_theme_serde_lowercase() {
        let json = serde_json::to_string(&Theme::Dark).unwrap();
        assert_eq!(json, "\"dark\"");
        let back: Theme = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(back, Theme::Light);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgba::parse("#7c3aed").unwrap(), Rgba::rgb(124, 58, 237));
        assert_eq!(Rgba::parse("#fff").unwrap(), Rgba::WHITE);
        assert!(Rgba::parse("#12345").is_err());
        assert!(Rgba::parse("#zzzzzz").is_err());
    }

    #[test]
    fn test_parse_rgba() {
        let c = Rgba::parse("rgba(59, 130, 246, 0.10)").unwrap();
        assert_eq!((c.r, c.g, c.b), (59, 130, 246));
        assert!((c.a - 0.1).abs() < 1e-6);

        assert_eq!(Rgba::parse("rgb(1,2,3)").unwrap(), Rgba::rgb(1, 2, 3));
        assert!(Rgba::parse("rgba(1, 2, 3)").is_err());
        assert!(Rgba::parse("rgb(300, 0, 0)").is_err());
    }

    #[test]
    fn test_css_round_trip() {
        let c = Rgba::rgba(124, 58, 237, 0.15);
        assert_eq!(c.to_css(), "rgba(124, 58, 237, 0.15)");
        assert_eq!(Rgba::parse(&c.to_css()).unwrap(), c);
        assert_eq!(Rgba::rgb(0xa7, 0x8b, 0xfa).to_css(), "#a78bfa");
    }

    #[test]
    fn test_scale_alpha_clamps() {
        let c = Rgba::rgba(0, 0, 0, 0.5);
        assert_eq!(c.scale_alpha(0.5).a, 0.25);
        assert_eq!(c.scale_alpha(4.0).a, 1.0);
        assert_eq!(c.scale_alpha(-1.0).a, 0.0);
    }

    #[test]
    fn test_profiles() {
        let light = ThemeProfile::for_theme(Theme::Light);
        assert_eq!(light.aurora_count(), 3);
        assert_eq!(light.background, Some(Rgba::WHITE));

        let dark = Theme::Dark.profile();
        assert_eq!(dark.aurora_count(), 2);
        assert!(dark.background.is_none());
        // Dark glows are more transparent than their light counterparts.
        assert!(dark.auroras[0].a < light.auroras[0].a);
    }
}
