//! Light and dark page palettes.

use serde::Serialize;

#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn tokens(self) -> &'static ThemeTokens {
        match self {
            Self::Light => &SKY_BLUE,
            Self::Dark => &DARK,
        }
    }
}

/// Colors and fonts used by the exported preview page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeTokens {
    pub primary: &'static str,
    pub layout_bg: &'static str,
    pub container_bg: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    /// Background behind rendered diagrams.
    pub diagram_bg: &'static str,
    pub border_radius_px: u8,
    pub font_family: &'static str,
}

pub const MONO_FONT_FAMILY: &str = "'JetBrains Mono', 'Fira Code', 'SF Mono', Consolas, monospace";

static SKY_BLUE: ThemeTokens = ThemeTokens {
    primary: "#1890ff",
    layout_bg: "#f0f5ff",
    container_bg: "#ffffff",
    text: "rgba(0, 0, 0, 0.88)",
    text_secondary: "rgba(0, 0, 0, 0.65)",
    diagram_bg: "#fafafa",
    border_radius_px: 6,
    font_family: MONO_FONT_FAMILY,
};

static DARK: ThemeTokens = ThemeTokens {
    primary: "#177ddc",
    layout_bg: "#141414",
    container_bg: "#1f1f1f",
    text: "#ffffff",
    text_secondary: "#a6a6a6",
    diagram_bg: "#2d2d2d",
    border_radius_px: 6,
    font_family: MONO_FONT_FAMILY,
};
