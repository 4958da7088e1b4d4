// =============================================================================
// color.rs - Conversion des couleurs / Color format codec
// =============================================================================
//
// Transforme un échantillon RGB(A) en texte dans l'une des cinq notations.
// Turns an RGB(A) sample into text in one of the five notations.
//
// Tout ici est pur : pas d'état, pas d'E/S.
// Everything here is pure: no state, no I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::ParseColorError;

// =============================================================================
// FORMATS
// =============================================================================

/// Notation textuelle d'une couleur
/// Textual notation of a color
///
/// Toute valeur inconnue (stockage, message) devient `Hex`.
/// Any unknown value (storage, message) becomes `Hex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ColorFormat {
    Hex,
    Rgb,
    Rgba,
    Hsl,
    Hsla,
}

impl ColorFormat {
    /// Tous les formats, dans l'ordre de la page d'options
    /// Every format, in the order the options page lists them
    pub const ALL: [ColorFormat; 5] = [
        ColorFormat::Hex,
        ColorFormat::Rgb,
        ColorFormat::Rgba,
        ColorFormat::Hsl,
        ColorFormat::Hsla,
    ];

    /// Nom stocké / Stored name
    pub fn as_str(self) -> &'static str {
        match self {
            ColorFormat::Hex => "hex",
            ColorFormat::Rgb => "rgb",
            ColorFormat::Rgba => "rgba",
            ColorFormat::Hsl => "hsl",
            ColorFormat::Hsla => "hsla",
        }
    }

    /// Lit un nom exact, `None` s'il est inconnu
    /// Reads an exact name, `None` if unknown
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.as_str() == value)
    }

    /// Lit un nom, en retombant sur le format par défaut
    /// Reads a name, falling back to the default format
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }
}

impl Default for ColorFormat {
    fn default() -> Self {
        config::DEFAULT_COLOR_FORMAT
    }
}

impl From<&str> for ColorFormat {
    fn from(value: &str) -> Self {
        Self::parse_or_default(value)
    }
}

impl From<String> for ColorFormat {
    fn from(value: String) -> Self {
        Self::parse_or_default(&value)
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ÉCHANTILLON
// SAMPLE
// =============================================================================

/// Un pixel capturé : RGB + alpha, chaque canal dans [0, 255]
/// One captured pixel: RGB + alpha, each channel in [0, 255]
///
/// L'alpha est une opacité [0, 1] mise à l'échelle sur [0, 255].
/// Alpha is a [0, 1] opacity scaled to [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorSample {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Échantillon opaque, comme ceux du capteur d'écran
    /// Opaque sample, like the ones the screen sampler produces
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, u8::MAX)
    }

    /// Construit un échantillon depuis une opacité fractionnaire, bornée à [0, 1]
    /// Builds a sample from a fractional opacity, clamped to [0, 1]
    pub fn from_fraction_alpha(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        let alpha = if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) };
        Self::new(r, g, b, (alpha * 255.0).round() as u8)
    }

    /// Lit `#RRGGBB` (opaque) ou `#RRGGBBAA`, majuscules ou minuscules
    /// Reads `#RRGGBB` (opaque) or `#RRGGBBAA`, upper or lower case
    pub fn from_hex(text: &str) -> Result<Self, ParseColorError> {
        let invalid = || ParseColorError(text.to_string());

        let digits = text.strip_prefix('#').ok_or_else(invalid)?;
        if !matches!(digits.len(), 6 | 8) || !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        // Les chiffres sont ASCII, donc chaque tranche tombe sur une frontière de caractère
        // Digits are ASCII, so every slice falls on a char boundary
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());

        let a = if digits.len() == 8 { channel(6)? } else { u8::MAX };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Alpha en fraction dans [0, 1]
    /// Alpha as a fraction in [0, 1]
    pub fn alpha_fraction(self) -> f64 {
        f64::from(self.a) / 255.0
    }

    pub fn to_hex(self) -> String {
        render(self, ColorFormat::Hex)
    }
}

impl FromStr for ColorSample {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// =============================================================================
// RGB -> HSL
// =============================================================================

/// Convertit RGB en HSL arrondi : (teinte en degrés, saturation %, luminosité %)
/// Converts RGB to rounded HSL: (hue in degrees, saturation %, lightness %)
///
/// Rounding is half away from zero (`f64::round`). All intermediate values are
/// non-negative, so this matches round-half-up at every `.5` boundary.
///
/// The hue is not wrapped: a red with a trace of blue, such as (255, 0, 1),
/// rounds up to 360.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (u16, u8, u8) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    let (h, s) = if max == min {
        // Achromatique / Achromatic
        (0.0, 0.0)
    } else {
        let d = max - min;
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

        // L'ordre des tests fixe le départage quand deux canaux sont égaux
        // Test order settles the tie when two channels are equal
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        (h / 6.0, s)
    };

    (
        (h * 360.0).round() as u16,
        (s * 100.0).round() as u8,
        (l * 100.0).round() as u8,
    )
}

// =============================================================================
// RENDU
// RENDERING
// =============================================================================

/// Rend un échantillon dans le format demandé
/// Renders a sample in the requested format
///
/// * `hex`  - `#rrggbb`, lowercase, alpha ignored
/// * `rgb`  - `rgb(r, g, b)`
/// * `rgba` - `rgba(r, g, b, A)` with `A = a / 255` and two decimals
/// * `hsl`  - `hsl(H, S%, L%)`
/// * `hsla` - `hsla(H, S%, L%, A)`
pub fn render(sample: ColorSample, format: ColorFormat) -> String {
    let ColorSample { r, g, b, .. } = sample;

    match format {
        ColorFormat::Hex => format!("#{:02x}{:02x}{:02x}", r, g, b),
        ColorFormat::Rgb => format!("rgb({}, {}, {})", r, g, b),
        ColorFormat::Rgba => {
            format!("rgba({}, {}, {}, {})", r, g, b, format_alpha(sample.alpha_fraction()))
        }
        ColorFormat::Hsl => {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            format!("hsl({}, {}%, {}%)", h, s, l)
        }
        ColorFormat::Hsla => {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            format!("hsla({}, {}%, {}%, {})", h, s, l, format_alpha(sample.alpha_fraction()))
        }
    }
}

/// Rend avec un nom de format brut ; un nom inconnu donne `hex`
/// Renders with a raw format name; an unknown name gives `hex`
pub fn render_named(sample: ColorSample, format: &str) -> String {
    render(sample, ColorFormat::parse_or_default(format))
}

fn format_alpha(alpha: f64) -> String {
    format!("{:.*}", config::ALPHA_DECIMALS, alpha)
}

// =============================================================================
// TESTS
// =============================================================================
