// src/core/color.rs

use crate::models::ColorSettings;
use anyhow::{Result, anyhow};
use colored::{Color, ColoredString, Colorize};

/// Names accepted by `-color` and in `[display.colors]`.
pub const COLOR_NAMES: &[&str] = &[
    "reset",
    "black",
    "red",
    "green",
    "yellow",
    "blue",
    "magenta",
    "cyan",
    "white",
    "bright black",
    "bright red",
    "bright green",
    "bright yellow",
    "bright blue",
    "bright magenta",
    "bright cyan",
    "bright white",
];

/// Parses a color name. `reset` means "terminal default" and yields `None`.
pub fn parse_color_name(name: &str) -> Result<Option<Color>> {
    let normalized = name.trim().to_lowercase().replace(['_', '-'], " ");
    match normalized.as_str() {
        "reset" | "default" => Ok(None),
        "black" => Ok(Some(Color::Black)),
        "red" => Ok(Some(Color::Red)),
        "green" => Ok(Some(Color::Green)),
        "yellow" => Ok(Some(Color::Yellow)),
        "blue" => Ok(Some(Color::Blue)),
        "magenta" => Ok(Some(Color::Magenta)),
        "cyan" => Ok(Some(Color::Cyan)),
        "white" => Ok(Some(Color::White)),
        "bright black" | "grey" | "gray" => Ok(Some(Color::BrightBlack)),
        "bright red" => Ok(Some(Color::BrightRed)),
        "bright green" => Ok(Some(Color::BrightGreen)),
        "bright yellow" => Ok(Some(Color::BrightYellow)),
        "bright blue" => Ok(Some(Color::BrightBlue)),
        "bright magenta" => Ok(Some(Color::BrightMagenta)),
        "bright cyan" => Ok(Some(Color::BrightCyan)),
        "bright white" => Ok(Some(Color::BrightWhite)),
        _ => Err(anyhow!("Unknown color: '{}'", name)),
    }
}

/// The colors of every rendered element, resolved once from the settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Palette {
    pub def1: Option<Color>,
    pub def2: Option<Color>,
    pub index: Option<Color>,
    pub phrase: Option<Color>,
    pub phonetic: Option<Color>,
    pub label: Option<Color>,
    pub example: Option<Color>,
    pub etym: Option<Color>,
    pub delimiter: Option<Color>,
    pub error: Option<Color>,
}

impl Palette {
    pub fn from_settings(colors: &ColorSettings) -> Result<Self> {
        Ok(Self {
            def1: parse_color_name(&colors.def1)?,
            def2: parse_color_name(&colors.def2)?,
            index: parse_color_name(&colors.index)?,
            phrase: parse_color_name(&colors.phrase)?,
            phonetic: parse_color_name(&colors.phonetic)?,
            label: parse_color_name(&colors.label)?,
            example: parse_color_name(&colors.example)?,
            etym: parse_color_name(&colors.etym)?,
            delimiter: parse_color_name(&colors.delimiter)?,
            error: parse_color_name(&colors.error)?,
        })
    }

    /// Like [`Palette::from_settings`], but unknown names fall back to the default color.
    pub fn from_settings_lossy(colors: &ColorSettings) -> Self {
        Self::from_settings(colors).unwrap_or_else(|e| {
            log::warn!("{}; using default colors.", e);
            Self::from_settings(&ColorSettings::default()).unwrap_or_default()
        })
    }
}

/// Colors `text`, or leaves it plain for the terminal default.
pub fn paint(text: &str, color: Option<Color>) -> ColoredString {
    match color {
        Some(color) => text.color(color),
        None => text.normal(),
    }
}

/// Returns the settings field a `-color` element name refers to.
pub fn element_mut<'a>(colors: &'a mut ColorSettings, element: &str) -> Option<&'a mut String> {
    match element.trim().to_lowercase().as_str() {
        "def1" => Some(&mut colors.def1),
        "def2" => Some(&mut colors.def2),
        "index" => Some(&mut colors.index),
        "phrase" => Some(&mut colors.phrase),
        "phon" | "phonetic" => Some(&mut colors.phonetic),
        "pos" | "label" => Some(&mut colors.label),
        "exsen" | "example" => Some(&mut colors.example),
        "etym" => Some(&mut colors.etym),
        "delimit" | "delimiter" => Some(&mut colors.delimiter),
        "err" | "error" => Some(&mut colors.error),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_name_parses() {
        for name in COLOR_NAMES {
            assert!(parse_color_name(name).is_ok(), "{}", name);
        }
        assert_eq!(parse_color_name("Bright_Red").unwrap(), Some(Color::BrightRed));
        assert_eq!(parse_color_name("reset").unwrap(), None);
        assert!(parse_color_name("chartreuse").is_err());
    }

    #[test]
    fn test_default_palette_resolves() {
        let palette = Palette::from_settings(&ColorSettings::default()).unwrap();
        assert_eq!(palette.def1, None);
        assert_eq!(palette.label, Some(Color::Yellow));
    }

    #[test]
    fn test_bad_color_falls_back_in_lossy_mode() {
        let colors = ColorSettings {
            label: "nope".to_string(),
            ..ColorSettings::default()
        };
        assert!(Palette::from_settings(&colors).is_err());
        assert_eq!(Palette::from_settings_lossy(&colors).label, Some(Color::Yellow));
    }

    #[test]
    fn test_element_names_reach_settings() {
        let mut colors = ColorSettings::default();
        *element_mut(&mut colors, "exsen").unwrap() = "red".to_string();
        assert_eq!(colors.example, "red");
        assert!(element_mut(&mut colors, "nothing").is_none());
    }
}
