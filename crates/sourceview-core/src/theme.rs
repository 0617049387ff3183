//! Themes and color parsing.
//!
//! A [`Theme`] maps token kinds to colors and carries the editor chrome
//! styling (gutter, line numbers, font). Colors parse from CSS-style
//! strings: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
//! `rgba(r, g, b, a)` and a small set of named colors.

use std::fmt;

use crate::token::TokenKind;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

/// Why a color string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Empty input string.
    Empty,
    /// `#` form with a length other than 3, 4, 6 or 8 hex digits.
    BadHexLength(usize),
    /// Non-hex digit in a `#` form.
    BadHexDigit,
    /// `rgb()`/`rgba()` form with the wrong number of components or a
    /// component out of range.
    BadComponent,
    /// Not a recognized named color or format.
    UnknownFormat,
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty color string"),
            Self::BadHexLength(len) => write!(f, "hex color has invalid length {len}"),
            Self::BadHexDigit => write!(f, "hex color contains a non-hex digit"),
            Self::BadComponent => write!(f, "rgb()/rgba() component invalid or out of range"),
            Self::UnknownFormat => write!(f, "unrecognized color format"),
        }
    }
}

impl std::error::Error for ColorParseError {}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from components with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    /// Parse a CSS-style color string.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ColorParseError::Empty);
        }
        if let Some(hex) = input.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("rgb(") || lower.starts_with("rgba(") {
            return Self::parse_functional(&lower);
        }
        Self::parse_named(&lower).ok_or(ColorParseError::UnknownFormat)
    }

    fn parse_hex(hex: &str) -> Result<Self, ColorParseError> {
        fn nibble(c: u8) -> Result<u8, ColorParseError> {
            match c {
                b'0'..=b'9' => Ok(c - b'0'),
                b'a'..=b'f' => Ok(c - b'a' + 10),
                b'A'..=b'F' => Ok(c - b'A' + 10),
                _ => Err(ColorParseError::BadHexDigit),
            }
        }
        let bytes = hex.as_bytes();
        match bytes.len() {
            // Shorthand digits expand by repetition: #abc == #aabbcc.
            3 | 4 => {
                let mut parts = [0u8; 4];
                for (i, &b) in bytes.iter().enumerate() {
                    let n = nibble(b)?;
                    parts[i] = n << 4 | n;
                }
                let a = if bytes.len() == 4 { parts[3] } else { 255 };
                Ok(Self::rgba(parts[0], parts[1], parts[2], a))
            }
            6 | 8 => {
                let mut parts = [0u8; 4];
                for (i, pair) in bytes.chunks_exact(2).enumerate() {
                    parts[i] = nibble(pair[0])? << 4 | nibble(pair[1])?;
                }
                let a = if bytes.len() == 8 { parts[3] } else { 255 };
                Ok(Self::rgba(parts[0], parts[1], parts[2], a))
            }
            len => Err(ColorParseError::BadHexLength(len)),
        }
    }

    fn parse_functional(lower: &str) -> Result<Self, ColorParseError> {
        let has_alpha = lower.starts_with("rgba");
        let inner = lower
            .trim_start_matches("rgba")
            .trim_start_matches("rgb")
            .trim();
        let inner = inner
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or(ColorParseError::UnknownFormat)?;

        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(ColorParseError::BadComponent);
        }

        let channel = |s: &str| s.parse::<u8>().map_err(|_| ColorParseError::BadComponent);
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = if has_alpha {
            // Alpha accepts either a 0..=255 integer or a 0.0..=1.0 float.
            if let Ok(byte) = parts[3].parse::<u8>() {
                byte
            } else {
                let f: f64 = parts[3]
                    .parse()
                    .map_err(|_| ColorParseError::BadComponent)?;
                if !(0.0..=1.0).contains(&f) {
                    return Err(ColorParseError::BadComponent);
                }
                (f * 255.0).round() as u8
            }
        } else {
            255
        };
        Ok(Self::rgba(r, g, b, a))
    }

    fn parse_named(lower: &str) -> Option<Self> {
        let color = match lower {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "cyan" => Self::rgb(0, 255, 255),
            "magenta" => Self::rgb(255, 0, 255),
            "clear" | "transparent" => Self::rgba(0, 0, 0, 0),
            _ => return None,
        };
        Some(color)
    }
}

impl std::str::FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Font request passed through to the host renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Family name; the host falls back to its monospace default when the
    /// family is unavailable.
    pub family: String,
    /// Point size.
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "monospace".to_string(),
            size: 14.0,
        }
    }
}

/// Gutter column styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GutterStyle {
    /// Gutter fill color.
    pub background: Color,
    /// Fixed gutter width in points; 0 hides the gutter.
    pub min_width: f32,
}

/// Line number styling inside the gutter.
#[derive(Debug, Clone, PartialEq)]
pub struct LineNumberStyle {
    /// Line number font.
    pub font: FontSpec,
    /// Line number color.
    pub text_color: Color,
}

/// Colors and chrome for rendering a colored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Document font.
    pub font: FontSpec,
    /// Document background.
    pub background_color: Color,
    /// Fallback for token kinds without an explicit entry.
    pub foreground_color: Color,
    /// Gutter styling.
    pub gutter: GutterStyle,
    /// Line number styling.
    pub line_numbers: LineNumberStyle,
    /// Background applied to inactive search matches.
    pub match_background: Color,
    /// Background applied to the active search match.
    pub active_match_background: Color,
    keyword: Color,
    string: Color,
    number: Color,
    comment: Color,
    identifier: Color,
    function: Color,
    type_name: Color,
    placeholder: Color,
}

impl Theme {
    /// Color for a token kind, falling back to the theme foreground.
    pub fn color(&self, kind: TokenKind) -> Color {
        match kind {
            TokenKind::Plain => self.foreground_color,
            TokenKind::Keyword => self.keyword,
            TokenKind::String => self.string,
            TokenKind::Number => self.number,
            TokenKind::Comment => self.comment,
            TokenKind::Identifier => self.identifier,
            TokenKind::Function => self.function,
            TokenKind::Type => self.type_name,
            TokenKind::EditorPlaceholder => self.placeholder,
        }
    }

    /// Override the color for a token kind.
    pub fn set_color(&mut self, kind: TokenKind, color: Color) {
        match kind {
            TokenKind::Plain => self.foreground_color = color,
            TokenKind::Keyword => self.keyword = color,
            TokenKind::String => self.string = color,
            TokenKind::Number => self.number = color,
            TokenKind::Comment => self.comment = color,
            TokenKind::Identifier => self.identifier = color,
            TokenKind::Function => self.function = color,
            TokenKind::Type => self.type_name = color,
            TokenKind::EditorPlaceholder => self.placeholder = color,
        }
    }
}

impl Default for Theme {
    /// Dark default resembling a classic IDE scheme.
    fn default() -> Self {
        let font = FontSpec::default();
        Self {
            background_color: Color::rgb(31, 32, 41),
            foreground_color: Color::rgb(223, 223, 223),
            gutter: GutterStyle {
                background: Color::rgb(31, 32, 41),
                min_width: 32.0,
            },
            line_numbers: LineNumberStyle {
                font: font.clone(),
                text_color: Color::rgb(110, 110, 110),
            },
            match_background: Color::rgba(255, 235, 59, 96),
            active_match_background: Color::rgba(255, 152, 0, 160),
            keyword: Color::rgb(178, 24, 137),
            string: Color::rgb(252, 106, 93),
            number: Color::rgb(116, 109, 176),
            comment: Color::rgb(65, 182, 69),
            identifier: Color::rgb(20, 156, 146),
            function: Color::rgb(91, 161, 255),
            type_name: Color::rgb(77, 191, 182),
            placeholder: Color::rgb(145, 145, 145),
            font,
        }
    }
}
