//! Data-driven theme definitions.
//!
//! A theme is a JSON object:
//!
//! ```json
//! {
//!   "fontStyle": { "family": "Menlo", "size": 14 },
//!   "backgroundColor": "#1f2029",
//!   "foregroundColor": "#dfdfdf",
//!   "gutterStyle": { "backgroundColor": "#1f2029", "minWidth": 32 },
//!   "lineNumberStyle": { "textColor": "#6e6e6e" },
//!   "tokenColors": {
//!     "keyword": "#b21889",
//!     "string": "rgb(252, 106, 93)",
//!     "comment": "#41b645"
//!   }
//! }
//! ```
//!
//! Loading is total: a malformed document yields the default theme, an
//! unparsable color or unknown token key leaves that entry at its default,
//! and both are logged.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use sourceview_core::{Color, FontSpec, Theme, TokenKind};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeSpec {
    font_style: Option<FontSpecDef>,
    background_color: Option<String>,
    foreground_color: Option<String>,
    gutter_style: Option<GutterSpec>,
    line_number_style: Option<LineNumberSpec>,
    #[serde(default)]
    token_colors: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FontSpecDef {
    family: Option<String>,
    size: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GutterSpec {
    background_color: Option<String>,
    min_width: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineNumberSpec {
    text_color: Option<String>,
    font_style: Option<FontSpecDef>,
}

/// Build a theme from a JSON document.
///
/// Never fails: anything unparsable falls back to the corresponding default
/// and is logged.
pub fn theme_from_json(json: &str) -> Theme {
    let spec: ThemeSpec = match serde_json::from_str(json) {
        Ok(spec) => spec,
        Err(err) => {
            debug!(%err, "malformed theme definition, using default theme");
            return Theme::default();
        }
    };

    let mut theme = Theme::default();

    if let Some(font) = spec.font_style {
        theme.font = merge_font(theme.font, font);
    }
    if let Some(color) = spec.background_color.as_deref().and_then(parse_color) {
        theme.background_color = color;
        theme.gutter.background = color;
    }
    if let Some(color) = spec.foreground_color.as_deref().and_then(parse_color) {
        theme.foreground_color = color;
    }
    if let Some(gutter) = spec.gutter_style {
        if let Some(color) = gutter.background_color.as_deref().and_then(parse_color) {
            theme.gutter.background = color;
        }
        if let Some(width) = gutter.min_width {
            theme.gutter.min_width = width;
        }
    }
    if let Some(numbers) = spec.line_number_style {
        if let Some(color) = numbers.text_color.as_deref().and_then(parse_color) {
            theme.line_numbers.text_color = color;
        }
        if let Some(font) = numbers.font_style {
            theme.line_numbers.font = merge_font(theme.line_numbers.font, font);
        }
    }

    for (name, value) in &spec.token_colors {
        let Some(kind) = token_kind(name) else {
            debug!(token = %name, "ignoring color for unknown token type");
            continue;
        };
        if let Some(color) = parse_color(value) {
            theme.set_color(kind, color);
        }
    }

    theme
}

fn merge_font(base: FontSpec, def: FontSpecDef) -> FontSpec {
    FontSpec {
        family: def.family.unwrap_or(base.family),
        size: def.size.unwrap_or(base.size),
    }
}

fn parse_color(value: &str) -> Option<Color> {
    match Color::parse(value) {
        Ok(color) => Some(color),
        Err(err) => {
            debug!(value, %err, "ignoring unparsable color");
            None
        }
    }
}

fn token_kind(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "plain" => TokenKind::Plain,
        "number" => TokenKind::Number,
        "string" => TokenKind::String,
        "identifier" | "id" => TokenKind::Identifier,
        "keyword" => TokenKind::Keyword,
        "comment" => TokenKind::Comment,
        "placeholder" | "editorPlaceholder" => TokenKind::EditorPlaceholder,
        "function" => TokenKind::Function,
        "type" => TokenKind::Type,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_theme() {
        let theme = theme_from_json(
            r##"{
                "fontStyle": { "family": "Menlo", "size": 13.5 },
                "backgroundColor": "#101010",
                "foregroundColor": "#eeeeee",
                "gutterStyle": { "backgroundColor": "#181818", "minWidth": 40 },
                "lineNumberStyle": { "textColor": "#555555" },
                "tokenColors": {
                    "keyword": "#b21889",
                    "string": "rgb(252, 106, 93)"
                }
            }"##,
        );

        assert_eq!(theme.font.family, "Menlo");
        assert_eq!(theme.font.size, 13.5);
        assert_eq!(theme.background_color, Color::rgb(16, 16, 16));
        assert_eq!(theme.gutter.background, Color::rgb(24, 24, 24));
        assert_eq!(theme.gutter.min_width, 40.0);
        assert_eq!(theme.line_numbers.text_color, Color::rgb(85, 85, 85));
        assert_eq!(theme.color(TokenKind::Keyword), Color::rgb(178, 24, 137));
        assert_eq!(theme.color(TokenKind::String), Color::rgb(252, 106, 93));
        // Unspecified kinds keep their defaults.
        assert_eq!(
            theme.color(TokenKind::Comment),
            Theme::default().color(TokenKind::Comment)
        );
    }

    #[test]
    fn test_background_propagates_to_gutter_unless_overridden() {
        let theme = theme_from_json(r##"{ "backgroundColor": "#202020" }"##);
        assert_eq!(theme.gutter.background, Color::rgb(32, 32, 32));
    }

    #[test]
    fn test_bad_color_keeps_default_entry() {
        let theme = theme_from_json(
            r##"{ "tokenColors": { "keyword": "#zzz", "number": "#102030" } }"##,
        );
        assert_eq!(
            theme.color(TokenKind::Keyword),
            Theme::default().color(TokenKind::Keyword)
        );
        assert_eq!(theme.color(TokenKind::Number), Color::rgb(16, 32, 48));
    }

    #[test]
    fn test_malformed_document_degrades_to_default() {
        assert_eq!(theme_from_json("not json"), Theme::default());
        assert_eq!(theme_from_json("[1, 2, 3]"), Theme::default());
    }

    #[test]
    fn test_unknown_token_key_ignored() {
        let theme = theme_from_json(r##"{ "tokenColors": { "sparkle": "#ffffff" } }"##);
        assert_eq!(theme, Theme::default());
    }
}
