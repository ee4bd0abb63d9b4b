//! Layout and drawing: playfield, score sidebar, key help, game-over notice.

use crate::app::GameOverNotice;
use crate::game::{BOARD_HEIGHT, BOARD_WIDTH, Cell, GameState};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Two terminal columns per board cell so blocks look roughly square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 20;

/// Playfield size in terminal cells, border included.
fn playfield_pixel_size() -> (u16, u16) {
    (
        BOARD_WIDTH as u16 * CELL_WIDTH + 2,
        BOARD_HEIGHT as u16 + 2,
    )
}

/// Draw the game: centered playfield with the active piece merged in, a
/// stats sidebar, and (when present) the game-over notice on top.
pub fn draw(frame: &mut Frame, state: &GameState, theme: &Theme, notice: Option<&GameOverNotice>) {
    let area = frame.area();
    let (pw, ph) = playfield_pixel_size();
    let total_w = pw + SIDEBAR_WIDTH;

    if area.width < total_w || area.height < ph {
        let msg = Paragraph::new(format!(
            "Terminal too small: need {}x{}, have {}x{}",
            total_w, ph, area.width, area.height
        ))
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.main_fg));
        frame.render_widget(msg, area);
        return;
    }

    let x = area.x + (area.width - total_w) / 2;
    let y = area.y + (area.height - ph) / 2;
    let playfield = Rect::new(x, y, pw, ph);
    let sidebar = Rect::new(x + pw + 1, y, SIDEBAR_WIDTH.saturating_sub(1), ph);

    draw_playfield(frame, state, theme, playfield);
    draw_sidebar(frame, state, theme, sidebar);

    if let Some(notice) = notice {
        draw_game_over(frame, theme, notice, playfield);
    }
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let border = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    let inner = border.inner(area);
    frame.render_widget(border, area);

    let grid = state.display_grid();
    let lines: Vec<Line> = grid
        .rows()
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| {
                    let bg = match cell {
                        Cell::Block(idx) => theme.block_color(*idx),
                        Cell::Empty => theme.bg,
                    };
                    Span::styled("  ", Style::default().bg(bg))
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let text_style = Style::default().fg(theme.main_fg);
    let title_style = Style::default().fg(theme.title);
    let lines = vec![
        Line::styled("blockfall", title_style),
        Line::raw(""),
        Line::styled(format!("Score  {}", state.score), text_style),
        Line::styled(format!("Level  {}", state.level), text_style),
        Line::styled(format!("Lines  {}", state.lines_cleared), text_style),
        Line::raw(""),
        Line::styled("←/→  move", text_style),
        Line::styled("↓    soft drop", text_style),
        Line::styled("↑    rotate", text_style),
        Line::styled("q    quit", text_style),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_game_over(frame: &mut Frame, theme: &Theme, notice: &GameOverNotice, playfield: Rect) {
    let w = (playfield.width.saturating_sub(2)).max(16).min(playfield.width);
    let h = 6u16;
    let x = playfield.x + (playfield.width.saturating_sub(w)) / 2;
    let y = playfield.y + (playfield.height.saturating_sub(h)) / 2;
    let popup = Rect::new(x, y, w, h);

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines = vec![
        Line::styled("GAME OVER", Style::default().fg(theme.title)).alignment(Alignment::Center),
        Line::styled(
            format!("Score {}  Level {}", notice.score, notice.level),
            Style::default().fg(theme.main_fg),
        )
        .alignment(Alignment::Center),
        Line::styled(
            format!("Lines {}", notice.lines),
            Style::default().fg(theme.main_fg),
        )
        .alignment(Alignment::Center),
        Line::styled("restarting...", Style::default().fg(theme.main_fg))
            .alignment(Alignment::Center),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
