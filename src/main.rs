//! Blockfall — classic falling-block puzzle game in the terminal.

mod app;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Base gravity period in ms; effective period is drop_ms / level.
    pub drop_ms: u64,
    /// RNG seed for the piece supplier.
    pub seed: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let seed = args.seed.unwrap_or_else(seed_from_clock);
    let config = GameConfig {
        drop_ms: args.drop_ms,
        seed,
    };
    App::new(config, theme).run()?;
    Ok(())
}

/// Time-derived seed when none is given.
fn seed_from_clock() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0x1234_5678)
}

/// Classic falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Classic falling-block puzzle in the terminal. Stack pieces, clear full rows to score.",
    long_about = "Blockfall is a terminal rendition of the classic falling-block puzzle.\n\n\
        Pieces fall into a 10x16 well. Move and rotate them to fill horizontal rows; \
        full rows clear and score points. Every 10 cleared lines the level rises and \
        gravity speeds up. When a fresh piece has no room to spawn, the game shows your \
        final score and restarts.\n\n\
        CONTROLS (normal):\n  Left/Right  Move    Up  Rotate    Down  Soft drop    Q / Esc  Quit\n\n\
        CONTROLS (vim):\n  h/l  Move    k  Rotate    j  Soft drop    q  Quit\n\n\
        Hold a movement key to keep the piece moving. Use --theme to load a btop-style \
        theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Base gravity period in ms at level 1; each level divides it.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub drop_ms: u64,

    /// Piece RNG seed (for reproducible games). Random when not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
