use std::fs;
use std::path::PathBuf;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

pub const DEFAULT_THEME: &str = "detran";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid colour {0:?}, expected #rrggbb")]
pub struct BadColor(String);

/// A `#rrggbb` colour. Malformed values fail when the theme file is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    r: u8,
    g: u8,
    b: u8,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse(text: &str) -> Result<Self, BadColor> {
        let hex = text.trim().strip_prefix('#').unwrap_or(text.trim());
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(BadColor(text.to_string()));
        }
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        };
        match (channel(0), channel(2), channel(4)) {
            (Some(r), Some(g), Some(b)) => Ok(Self::rgb(r, g, b)),
            _ => Err(BadColor(text.to_string())),
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = BadColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> Self {
        format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
    }
}

impl From<HexColor> for Color {
    fn from(c: HexColor) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: HexColor,
    pub fg: HexColor,
    pub text_muted: HexColor,
    pub option_selected_bg: HexColor,
    pub option_selected_fg: HexColor,
    pub correct: HexColor,
    pub incorrect: HexColor,
    pub accent: HexColor,
    pub accent_dim: HexColor,
    pub border: HexColor,
    pub border_focused: HexColor,
    pub header_bg: HexColor,
    pub header_fg: HexColor,
    pub bar_filled: HexColor,
    pub bar_empty: HexColor,
    pub error: HexColor,
    pub warning: HexColor,
    pub success: HexColor,
}

impl Theme {
    /// Look the theme up in the user's theme directory first, then among
    /// the bundled ones.
    pub fn load(name: &str) -> Option<Self> {
        let file_name = format!("{name}.toml");

        if let Some(path) = user_theme_dir().map(|dir| dir.join(&file_name)) {
            if let Ok(content) = fs::read_to_string(&path) {
                match toml::from_str::<Theme>(&content) {
                    Ok(theme) => return Some(theme),
                    Err(err) => warn!(path = %path.display(), %err, "ignoring unparsable theme"),
                }
            }
        }

        let file = ThemeAssets::get(&file_name)?;
        let parsed = std::str::from_utf8(file.data.as_ref())
            .map_err(|err| err.to_string())
            .and_then(|content| toml::from_str::<Theme>(content).map_err(|err| err.to_string()));
        match parsed {
            Ok(theme) => Some(theme),
            Err(err) => {
                warn!(theme = name, %err, "bundled theme is broken");
                None
            }
        }
    }

    pub fn available_themes() -> Vec<String> {
        ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect()
    }
}

fn user_theme_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("simulado").join("themes"))
}

impl Default for Theme {
    fn default() -> Self {
        Self::load(DEFAULT_THEME).unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        let blue = HexColor::rgb(0x3b, 0x82, 0xf6);
        let green = HexColor::rgb(0x22, 0xc5, 0x5e);
        let red = HexColor::rgb(0xef, 0x44, 0x44);
        let slate = HexColor::rgb(0x1e, 0x29, 0x3b);
        Self {
            bg: HexColor::rgb(0x0f, 0x17, 0x2a),
            fg: HexColor::rgb(0xe2, 0xe8, 0xf0),
            text_muted: HexColor::rgb(0x64, 0x74, 0x8b),
            option_selected_bg: HexColor::rgb(0x1e, 0x3a, 0x8a),
            option_selected_fg: HexColor::rgb(0xf8, 0xfa, 0xfc),
            correct: green,
            incorrect: red,
            accent: blue,
            accent_dim: HexColor::rgb(0x33, 0x41, 0x55),
            border: HexColor::rgb(0x33, 0x41, 0x55),
            border_focused: blue,
            header_bg: slate,
            header_fg: HexColor::rgb(0xf1, 0xf5, 0xf9),
            bar_filled: blue,
            bar_empty: slate,
            error: red,
            warning: HexColor::rgb(0xf5, 0x9e, 0x0b),
            success: green,
        }
    }
}

impl ThemeColors {
    pub fn bg(&self) -> Color { self.bg.into() }
    pub fn fg(&self) -> Color { self.fg.into() }
    pub fn text_muted(&self) -> Color { self.text_muted.into() }
    pub fn option_selected_bg(&self) -> Color { self.option_selected_bg.into() }
    pub fn option_selected_fg(&self) -> Color { self.option_selected_fg.into() }
    pub fn correct(&self) -> Color { self.correct.into() }
    pub fn incorrect(&self) -> Color { self.incorrect.into() }
    pub fn accent(&self) -> Color { self.accent.into() }
    pub fn accent_dim(&self) -> Color { self.accent_dim.into() }
    pub fn border(&self) -> Color { self.border.into() }
    pub fn border_focused(&self) -> Color { self.border_focused.into() }
    pub fn header_bg(&self) -> Color { self.header_bg.into() }
    pub fn header_fg(&self) -> Color { self.header_fg.into() }
    pub fn bar_filled(&self) -> Color { self.bar_filled.into() }
    pub fn bar_empty(&self) -> Color { self.bar_empty.into() }
    pub fn error(&self) -> Color { self.error.into() }
    pub fn warning(&self) -> Color { self.warning.into() }
    pub fn success(&self) -> Color { self.success.into() }
}
