//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block and UI colours, loadable from a btop-style theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colours (index 0..=6): cyan, yellow, magenta, green, red, blue, orange.
    pub blocks: [Color; 7],
    /// Playfield background (empty cells).
    pub bg: Color,
    /// Playfield border.
    pub border: Color,
    /// Text (score, level, lines).
    pub main_fg: Color,
    /// Titles and highlights.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// Hardcoded One Dark defaults (hex values from onedark.theme).
    pub fn onedark_default() -> Self {
        Self {
            blocks: [
                parse_hex("#56B6C2").unwrap(), // cyan (I)
                parse_hex("#E5C07B").unwrap(), // yellow (O)
                parse_hex("#C678DD").unwrap(), // magenta (T)
                parse_hex("#98C379").unwrap(), // green (S)
                parse_hex("#E06C75").unwrap(), // red (Z)
                parse_hex("#61AFEF").unwrap(), // blue (J)
                parse_hex("#D19A66").unwrap(), // orange (L)
            ],
            bg: parse_hex("#31353F").unwrap(),
            border: parse_hex("#3F444F").unwrap(),
            main_fg: parse_hex("#ABB2BF").unwrap(),
            title: parse_hex("#E5C07B").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"`.
    /// Falls back to One Dark defaults if path is None or file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override block colours for high-contrast or colorblind palettes.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.blocks = [
                    parse_hex("#00FFFF").unwrap(),
                    parse_hex("#FFFF00").unwrap(),
                    parse_hex("#FF00FF").unwrap(),
                    parse_hex("#00FF00").unwrap(),
                    parse_hex("#FF0000").unwrap(),
                    parse_hex("#0088FF").unwrap(),
                    parse_hex("#FF8800").unwrap(),
                ];
            }
            crate::Palette::Colorblind => {
                // Avoid red/green alone; Tol bright-ish hues.
                self.blocks = [
                    parse_hex("#009988").unwrap(),
                    parse_hex("#BBBB00").unwrap(),
                    parse_hex("#EE3377").unwrap(),
                    parse_hex("#0077BB").unwrap(),
                    parse_hex("#CC3311").unwrap(),
                    parse_hex("#33BBEE").unwrap(),
                    parse_hex("#EE7733").unwrap(),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let defaults = Self::onedark_default();
        Self {
            blocks: [
                get("hi_fg").unwrap_or(defaults.blocks[0]),
                get("cpu_mid").unwrap_or(defaults.blocks[1]),
                get("net_box").unwrap_or(defaults.blocks[2]),
                get("mem_box").unwrap_or(defaults.blocks[3]),
                get("cpu_end").unwrap_or(defaults.blocks[4]),
                get("cpu_box").unwrap_or(defaults.blocks[5]),
                get("proc_misc").unwrap_or(defaults.blocks[6]),
            ],
            bg: get("meter_bg").unwrap_or(defaults.bg),
            border: get("div_line").unwrap_or(defaults.border),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
        }
    }

    /// Block colour for a piece/cell colour index.
    #[inline]
    pub fn block_color(&self, index: u8) -> Color {
        self.blocks[(index as usize) % self.blocks.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let component = |part: &str| {
        u8::from_str_radix(part, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = if s.len() == 6 {
        (component(&s[0..2])?, component(&s[2..4])?, component(&s[4..6])?)
    } else if s.len() == 3 {
        (
            component(&s[0..1])? * 17,
            component(&s[1..2])? * 17,
            component(&s[2..3])? * 17,
        )
    } else {
        return Err(ThemeError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}
