//! App: terminal init, main loop, gravity timer and key handling.

use crate::GameConfig;
use crate::game::{GameState, StepOutcome};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// DAS (Delayed Auto-Shift): delay before movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding.
const REPEAT_INTERVAL_MS: u64 = 50;

/// How long the game-over notice stays on screen before play resumes.
const GAME_OVER_NOTICE_MS: u64 = 2500;

/// Target render frame interval.
const FRAME_MS: u64 = 16;

/// Gravity as a resettable countdown: the effective delay before the next
/// drop is measured from the most recent position or level change, not a
/// fixed clock. Period shrinks with level: `base_ms / level`.
#[derive(Debug, Clone, Copy)]
pub struct DropTimer {
    deadline: Instant,
}

impl DropTimer {
    pub fn period(base_ms: u64, level: u32) -> Duration {
        Duration::from_millis(base_ms / u64::from(level.max(1)))
    }

    pub fn armed(now: Instant, base_ms: u64, level: u32) -> Self {
        Self {
            deadline: now + Self::period(base_ms, level),
        }
    }

    /// Restart the countdown; called whenever the piece position or the
    /// level changes.
    pub fn rearm(&mut self, now: Instant, base_ms: u64, level: u32) {
        *self = Self::armed(now, base_ms, level);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    pub fn time_left(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }
}

/// Final stats shown when a spawn was blocked; play resumes after `until`.
#[derive(Debug, Clone, Copy)]
pub struct GameOverNotice {
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    until: Instant,
}

impl GameOverNotice {
    fn expired(&self, now: Instant) -> bool {
        now >= self.until
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    drop_timer: DropTimer,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
    notice: Option<GameOverNotice>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let now = Instant::now();
        let state = GameState::new(config.seed);
        let drop_timer = DropTimer::armed(now, config.drop_ms, state.level);
        Self {
            config,
            theme,
            state,
            drop_timer,
            repeat_state: None,
            last_repeat_fire: None,
            notice: None,
        }
    }

    fn rearm_drop_timer(&mut self, now: Instant) {
        self.drop_timer.rearm(now, self.config.drop_ms, self.state.level);
    }

    fn apply_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::MoveLeft => self.apply_shift(-1, 0, now),
            Action::MoveRight => self.apply_shift(1, 0, now),
            Action::SoftDrop => self.apply_step_down(now),
            // Rotation never changes the position, so the timer stays armed.
            Action::Rotate => self.state = self.state.rotated(),
            Action::Quit | Action::None => {}
        }
    }

    fn apply_shift(&mut self, dx: i32, dy: i32, now: Instant) {
        let next = self.state.shifted(dx, dy);
        if next.position != self.state.position {
            self.state = next;
            self.rearm_drop_timer(now);
        }
    }

    /// One drop step: gravity tick and soft-drop share this path.
    fn apply_step_down(&mut self, now: Instant) {
        let (next, outcome) = self.state.step_down();
        self.state = next;
        match outcome {
            StepOutcome::Moved | StepOutcome::Locked { .. } => {}
            StepOutcome::GameOver {
                final_score,
                final_level,
                final_lines,
            } => {
                self.notice = Some(GameOverNotice {
                    score: final_score,
                    level: final_level,
                    lines: final_lines,
                    until: now + Duration::from_millis(GAME_OVER_NOTICE_MS),
                });
                self.repeat_state = None;
                self.last_repeat_fire = None;
            }
        }
        // Position (and possibly level) changed in every outcome.
        self.rearm_drop_timer(now);
    }

    fn tick_repeat(&mut self) {
        let now = Instant::now();
        let Some((action, first)) = self.repeat_state else {
            return;
        };
        if first.elapsed() < Duration::from_millis(REPEAT_DELAY_MS) {
            return;
        }
        let next = self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action, now);
            self.last_repeat_fire = Some(now);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Attempt to enable enhanced keyboard for Release events.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();

            // The notice stands in for the original blocking alert: gravity
            // and input hold until it expires, then the fresh game starts
            // its countdown.
            if self.notice.is_some_and(|n| n.expired(now)) {
                self.notice = None;
                self.rearm_drop_timer(now);
            }

            terminal.draw(|f| {
                crate::ui::draw(f, &self.state, &self.theme, self.notice.as_ref());
            })?;

            let timeout = self
                .drop_timer
                .time_left(now)
                .min(Duration::from_millis(FRAME_MS));

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    let action = key_to_action(key);

                    // Ignore OS repeats; only the first Press arms our own
                    // repeat, and Release disarms it.
                    if key.kind != KeyEventKind::Press {
                        if key.kind == KeyEventKind::Release
                            && self.repeat_state.map(|(a, _)| a) == Some(action)
                        {
                            self.repeat_state = None;
                            self.last_repeat_fire = None;
                        }
                        continue;
                    }
                    if self.repeat_state.map(|(a, _)| a) == Some(action) {
                        continue;
                    }

                    if action == Action::Quit {
                        return Ok(());
                    }
                    if self.notice.is_some() || action == Action::None {
                        continue;
                    }

                    let now = Instant::now();
                    self.apply_action(action, now);
                    if matches!(action, Action::MoveLeft | Action::MoveRight | Action::SoftDrop) {
                        self.repeat_state = Some((action, now));
                        self.last_repeat_fire = None;
                    }
                }
            }

            if self.notice.is_none() {
                self.tick_repeat();
                let now = Instant::now();
                if self.drop_timer.is_due(now) {
                    self.apply_step_down(now);
                }
            }
        }
    }
}
