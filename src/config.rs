use std::path::{Path, PathBuf};

use ratatui::style::Color;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::content::DEFAULT_MAX_DOCUMENT_BYTES;

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub accent: Color,
    pub border_active: Color,
    pub border_inactive: Color,
    pub divider: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,
            divider: Color::DarkGray,
        }
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct Behavior {
    /// Width of the grab area around a divider, in cells.
    pub divider_thickness: u16,
    /// Scales how far off-axis a pane may sit and still be reached by
    /// directional focus. 1.0 requires the panes to overlap.
    pub focus_tolerance: f64,
    pub docs_dir: PathBuf,
    pub max_document_bytes: u64,
    /// Overrides the daemon socket location.
    pub socket_path: Option<PathBuf>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            divider_thickness: 1,
            focus_tolerance: 1.0,
            docs_dir: PathBuf::from("."),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            socket_path: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub theme: Theme,
    pub behavior: Behavior,
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("scriptbook").join("config.toml"))
    }

    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Read a config file. A missing file gives the defaults; an invalid one
    /// is logged and also gives the defaults.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match Self::parse(&content) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let mut config = Self::default();

        if let Some(t) = raw.theme {
            let colors = [
                (t.accent, &mut config.theme.accent),
                (t.border_active, &mut config.theme.border_active),
                (t.border_inactive, &mut config.theme.border_inactive),
                (t.divider, &mut config.theme.divider),
            ];
            for (value, slot) in colors {
                if let Some(s) = value {
                    match parse_color(&s) {
                        Some(c) => *slot = c,
                        None => warn!(color = %s, "unknown color"),
                    }
                }
            }
        }

        if let Some(b) = raw.behavior {
            if let Some(v) = b.divider_thickness {
                config.behavior.divider_thickness = v.max(1);
            }
            if let Some(v) = b.focus_tolerance {
                if v.is_finite() && v > 0.0 {
                    config.behavior.focus_tolerance = v;
                } else {
                    warn!(value = v, "focus_tolerance must be positive");
                }
            }
            if let Some(v) = b.docs_dir {
                config.behavior.docs_dir = v;
            }
            if let Some(v) = b.max_document_bytes {
                config.behavior.max_document_bytes = v;
            }
            if let Some(v) = b.socket_path {
                config.behavior.socket_path = Some(v);
            }
        }

        config
    }
}

// ---------------------------------------------------------------------------
// Raw TOML structs (all-optional for merge)
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct RawConfig {
    theme: Option<RawTheme>,
    behavior: Option<RawBehavior>,
}

#[derive(Deserialize, Default)]
struct RawTheme {
    accent: Option<String>,
    border_active: Option<String>,
    border_inactive: Option<String>,
    divider: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawBehavior {
    divider_thickness: Option<u16>,
    focus_tolerance: Option<f64>,
    docs_dir: Option<PathBuf>,
    max_document_bytes: Option<u64>,
    socket_path: Option<PathBuf>,
}

/// Parse a color name or a `#rgb` / `#rrggbb` hex value.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim().to_lowercase();

    if let Some(hex) = s.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        return match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::Rgb(r, g, b))
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Color::Rgb(r, g, b))
            }
            _ => None,
        };
    }

    match s.as_str() {
        "reset" => Some(Color::Reset),
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "gray" | "grey" => Some(Color::Gray),
        "white" => Some(Color::White),
        "dark_gray" | "dark_grey" | "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "light_red" | "lightred" => Some(Color::LightRed),
        "light_green" | "lightgreen" => Some(Color::LightGreen),
        "light_yellow" | "lightyellow" => Some(Color::LightYellow),
        "light_blue" | "lightblue" => Some(Color::LightBlue),
        "light_magenta" | "lightmagenta" => Some(Color::LightMagenta),
        "light_cyan" | "lightcyan" => Some(Color::LightCyan),
        _ => None,
    }
}
