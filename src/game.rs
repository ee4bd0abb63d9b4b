//! Game state: board grid, falling piece, collision, row clears, scoring.

/// Playfield width in cells.
pub const BOARD_WIDTH: usize = 10;
/// Playfield height in cells.
pub const BOARD_HEIGHT: usize = 16;

/// Spawn anchor for a fresh piece (top-left of its shape matrix).
pub const SPAWN_POSITION: Position = Position { x: 4, y: 0 };

/// Points awarded per cleared line, multiplied by the current level.
const POINTS_PER_LINE: u32 = 10;
/// Total lines needed per level before the level advances.
const LINES_PER_LEVEL: u32 = 10;

/// Single cell: either empty or a block with a colour index (0..7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Block(u8),
}

impl Cell {
    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Block(_))
    }
}

/// Top-left anchor of the piece's shape matrix, in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Tetromino kinds (I, O, T, S, Z, J, L).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TetrominoKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::S, Self::Z, Self::J, Self::L];

    /// Occupancy matrix in spawn orientation. Rows need not equal columns;
    /// rotation handles rectangular shapes.
    fn shape(self) -> Vec<Vec<u8>> {
        match self {
            Self::I => vec![vec![1, 1, 1, 1]],
            Self::O => vec![vec![1, 1], vec![1, 1]],
            Self::T => vec![vec![1, 1, 1], vec![0, 1, 0]],
            Self::S => vec![vec![0, 1, 1], vec![1, 1, 0]],
            Self::Z => vec![vec![1, 1, 0], vec![0, 1, 1]],
            Self::J => vec![vec![1, 0, 0], vec![1, 1, 1]],
            Self::L => vec![vec![0, 0, 1], vec![1, 1, 1]],
        }
    }

    /// Colour index 0..7 into theme.block_color().
    pub fn color_index(self) -> u8 {
        match self {
            Self::I => 0, // Cyan
            Self::O => 1, // Yellow
            Self::T => 2, // Magenta
            Self::S => 3, // Green
            Self::Z => 4, // Red
            Self::J => 5, // Blue
            Self::L => 6, // Orange
        }
    }
}

/// Active falling shape: occupancy matrix plus colour index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub shape: Vec<Vec<u8>>,
    pub color_index: u8,
}

impl Piece {
    pub fn from_kind(kind: TetrominoKind) -> Self {
        Self {
            shape: kind.shape(),
            color_index: kind.color_index(),
        }
    }

    /// 90° clockwise rotation as a proper N×M → M×N transform:
    /// `out[i][j] = shape[rows - 1 - j][i]`. Dimensionally safe for
    /// rectangular shapes (a 1×4 bar becomes 4×1).
    pub fn rotated(&self) -> Self {
        let rows = self.shape.len();
        let cols = self.shape.first().map_or(0, Vec::len);
        let shape = (0..cols)
            .map(|i| (0..rows).map(|j| self.shape[rows - 1 - j][i]).collect())
            .collect();
        Self {
            shape,
            color_index: self.color_index,
        }
    }

    /// Iterator over occupied sub-cells as (row, col) offsets into the shape.
    fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.shape.iter().enumerate().flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &v)| v != 0)
                .map(move |(j, _)| (i, j))
        })
    }
}

/// Playfield: BOARD_HEIGHT rows of BOARD_WIDTH cells, rows[0] is top.
/// Always exactly that size after every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: Vec<Vec<Cell>>,
}

impl Board {
    pub fn empty() -> Self {
        Self {
            rows: vec![vec![Cell::Empty; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if !Self::in_bounds(x, y) {
            return None;
        }
        Some(self.rows[y as usize][x as usize])
    }

    #[inline]
    fn in_bounds(x: i32, y: i32) -> bool {
        x >= 0 && x < BOARD_WIDTH as i32 && y >= 0 && y < BOARD_HEIGHT as i32
    }

    #[cfg(test)]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.rows[y][x] = cell;
    }

    /// True if any occupied sub-cell of the piece, projected at `pos`,
    /// lands out of bounds (any of the four edges) or on a filled cell.
    /// Bounds are checked explicitly before indexing.
    pub fn collides(&self, piece: &Piece, pos: Position) -> bool {
        piece.occupied().any(|(i, j)| {
            let x = pos.x + j as i32;
            let y = pos.y + i as i32;
            match self.get(x, y) {
                Some(cell) => cell.is_filled(),
                None => true,
            }
        })
    }

    /// New board with the piece merged in at `pos`. Occupied sub-cells whose
    /// projection falls outside the board are silently dropped. Pure: the
    /// input board is untouched.
    pub fn with_piece(&self, piece: &Piece, pos: Position) -> Self {
        let mut next = self.clone();
        for (i, j) in piece.occupied() {
            let x = pos.x + j as i32;
            let y = pos.y + i as i32;
            if Self::in_bounds(x, y) {
                next.rows[y as usize][x as usize] = Cell::Block(piece.color_index);
            }
        }
        next
    }

    /// Remove every full row (no empty cells), keeping the remaining rows in
    /// order and prepending empty rows at the top to restore the height.
    /// Returns the new board and the number of rows removed.
    pub fn clear_full_rows(&self) -> (Self, u32) {
        let kept: Vec<Vec<Cell>> = self
            .rows
            .iter()
            .filter(|row| row.iter().any(|c| !c.is_filled()))
            .cloned()
            .collect();
        let cleared = (BOARD_HEIGHT - kept.len()) as u32;
        let mut rows = vec![vec![Cell::Empty; BOARD_WIDTH]; cleared as usize];
        rows.extend(kept);
        (Self { rows }, cleared)
    }
}

/// Uniform random piece supplier backed by a small LCG, seedable for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceSource {
    rng: u32,
}

impl PieceSource {
    pub fn new(seed: u32) -> Self {
        Self { rng: seed | 1 }
    }

    fn next_rand(&mut self) -> u32 {
        self.rng = self.rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        self.rng >> 16
    }

    pub fn next_piece(&mut self) -> Piece {
        let kinds = TetrominoKind::ALL;
        let kind = kinds[(self.next_rand() as usize) % kinds.len()];
        Piece::from_kind(kind)
    }
}

/// What a drop step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Piece descended one row.
    Moved,
    /// Piece merged into the board; rows may have cleared.
    Locked { lines_cleared: u32 },
    /// Newly spawned piece collided at the spawn cell. The state has been
    /// reset to initial values; these are the stats at the moment of defeat.
    GameOver {
        final_score: u32,
        final_level: u32,
        final_lines: u32,
    },
}

/// Complete game state. A single immutable snapshot: every transition
/// returns a new state, leaving the old one intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub piece: Piece,
    pub position: Position,
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
    source: PieceSource,
}

impl GameState {
    /// Fresh game: empty board, random piece at the spawn anchor,
    /// score 0, level 1, no lines cleared.
    pub fn new(seed: u32) -> Self {
        let mut source = PieceSource::new(seed);
        let piece = source.next_piece();
        Self {
            board: Board::empty(),
            piece,
            position: SPAWN_POSITION,
            score: 0,
            level: 1,
            lines_cleared: 0,
            source,
        }
    }

    /// Advance the piece one row, or lock it if it cannot descend.
    /// Used by both the gravity tick and the soft-drop command.
    pub fn step_down(&self) -> (Self, StepOutcome) {
        let below = self.position.offset(0, 1);
        if !self.board.collides(&self.piece, below) {
            let mut next = self.clone();
            next.position = below;
            return (next, StepOutcome::Moved);
        }
        self.lock_and_spawn()
    }

    /// Shift the piece by (dx, dy) if the target is free; otherwise the
    /// state is returned unchanged. Callers detect rejection by comparing
    /// positions.
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        let target = self.position.offset(dx, dy);
        if self.board.collides(&self.piece, target) {
            return self.clone();
        }
        let mut next = self.clone();
        next.position = target;
        next
    }

    /// Rotate the piece clockwise if the rotated shape fits at the current
    /// position. No wall kicks: a blocked rotation is a silent no-op.
    pub fn rotated(&self) -> Self {
        let rotated = self.piece.rotated();
        if self.board.collides(&rotated, self.position) {
            return self.clone();
        }
        let mut next = self.clone();
        next.piece = rotated;
        next
    }

    /// Board with the active piece merged in, for rendering.
    pub fn display_grid(&self) -> Board {
        self.board.with_piece(&self.piece, self.position)
    }

    fn lock_and_spawn(&self) -> (Self, StepOutcome) {
        let merged = self.board.with_piece(&self.piece, self.position);
        let (board, lines) = merged.clear_full_rows();
        let (score, level, lines_cleared) =
            apply_line_score(self.score, self.level, self.lines_cleared, lines);

        let mut source = self.source.clone();
        let piece = source.next_piece();

        if board.collides(&piece, SPAWN_POSITION) {
            // Spawn blocked: game over. Reset to initial values but keep the
            // just-spawned piece; the caller surfaces the final stats.
            let next = Self {
                board: Board::empty(),
                piece,
                position: SPAWN_POSITION,
                score: 0,
                level: 1,
                lines_cleared: 0,
                source,
            };
            return (
                next,
                StepOutcome::GameOver {
                    final_score: score,
                    final_level: level,
                    final_lines: lines_cleared,
                },
            );
        }

        let next = Self {
            board,
            piece,
            position: SPAWN_POSITION,
            score,
            level,
            lines_cleared,
            source,
        };
        (next, StepOutcome::Locked { lines_cleared: lines })
    }
}

/// Scoring rule: `score += lines * 10 * level` (level before increment),
/// then the level advances by at most one per placement event once the
/// total reaches `level * 10` lines. No-op when no lines cleared.
fn apply_line_score(score: u32, level: u32, total_lines: u32, lines: u32) -> (u32, u32, u32) {
    if lines == 0 {
        return (score, level, total_lines);
    }
    let score = score + lines * POINTS_PER_LINE * level;
    let total_lines = total_lines + lines;
    let level = if total_lines >= level * LINES_PER_LEVEL {
        level + 1
    } else {
        level
    };
    (score, level, total_lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_piece() -> Piece {
        Piece::from_kind(TetrominoKind::O)
    }

    fn full_row() -> Vec<Cell> {
        vec![Cell::Block(0); BOARD_WIDTH]
    }

    #[test]
    fn empty_board_dimensions() {
        let board = Board::empty();
        assert_eq!(board.rows().len(), BOARD_HEIGHT);
        for row in board.rows() {
            assert_eq!(row.len(), BOARD_WIDTH);
            assert!(row.iter().all(|&c| c == Cell::Empty));
        }
    }

    #[test]
    fn clear_full_rows_noop_without_full_rows() {
        let mut board = Board::empty();
        board.set(3, BOARD_HEIGHT - 1, Cell::Block(2));
        let (cleared, n) = board.clear_full_rows();
        assert_eq!(n, 0);
        assert_eq!(cleared, board);
    }

    #[test]
    fn clear_full_rows_removes_and_restores_height() {
        let mut board = Board::empty();
        // Two full rows at the bottom, one marker row above them.
        board.rows[BOARD_HEIGHT - 1] = full_row();
        board.rows[BOARD_HEIGHT - 2] = full_row();
        board.set(0, BOARD_HEIGHT - 3, Cell::Block(5));

        let (cleared, n) = board.clear_full_rows();
        assert_eq!(n, 2);
        assert_eq!(cleared.rows().len(), BOARD_HEIGHT);
        // Marker row slid to the bottom, original order preserved.
        assert_eq!(cleared.get(0, BOARD_HEIGHT as i32 - 1), Some(Cell::Block(5)));
        // Top rows are fresh and empty.
        for y in 0..2 {
            assert!(cleared.rows()[y].iter().all(|&c| c == Cell::Empty));
        }
    }

    #[test]
    fn clear_full_rows_preserves_row_order() {
        let mut board = Board::empty();
        board.set(0, BOARD_HEIGHT - 1, Cell::Block(1));
        board.rows[BOARD_HEIGHT - 2] = full_row();
        board.set(0, BOARD_HEIGHT - 3, Cell::Block(3));

        let (cleared, n) = board.clear_full_rows();
        assert_eq!(n, 1);
        assert_eq!(cleared.get(0, BOARD_HEIGHT as i32 - 1), Some(Cell::Block(1)));
        assert_eq!(cleared.get(0, BOARD_HEIGHT as i32 - 2), Some(Cell::Block(3)));
    }

    #[test]
    fn with_piece_is_pure() {
        let board = Board::empty();
        let piece = square_piece();
        let pos = Position { x: 4, y: 4 };
        let once = board.with_piece(&piece, pos);
        let twice = board.with_piece(&piece, pos);
        assert_eq!(once, twice);
        assert_eq!(board, Board::empty());
        assert_eq!(once.get(4, 4), Some(Cell::Block(piece.color_index)));
    }

    #[test]
    fn with_piece_drops_out_of_bounds_cells() {
        let board = Board::empty();
        let piece = square_piece();
        // Anchor shifted up-left past the corner: only the in-bounds quarter
        // of the 2x2 lands.
        let merged = board.with_piece(&piece, Position { x: -1, y: -1 });
        assert_eq!(merged.get(0, 0), Some(Cell::Block(piece.color_index)));
        let filled = merged.rows().iter().flatten().filter(|c| c.is_filled()).count();
        assert_eq!(filled, 1);
    }

    #[test]
    fn collision_false_in_free_space() {
        let board = Board::empty();
        assert!(!board.collides(&square_piece(), Position { x: 4, y: 4 }));
    }

    #[test]
    fn collision_true_on_filled_cell() {
        let mut board = Board::empty();
        board.set(4, 5, Cell::Block(0));
        assert!(board.collides(&square_piece(), Position { x: 4, y: 4 }));
    }

    #[test]
    fn collision_true_past_walls_and_floor() {
        let board = Board::empty();
        let piece = square_piece();
        // Left wall.
        assert!(board.collides(&piece, Position { x: -1, y: 4 }));
        // Right wall: a 2-wide shape at x = width - 1 overhangs.
        assert!(board.collides(&piece, Position { x: BOARD_WIDTH as i32 - 1, y: 4 }));
        // Floor.
        assert!(board.collides(&piece, Position { x: 4, y: BOARD_HEIGHT as i32 - 1 }));
        // Above the top.
        assert!(board.collides(&piece, Position { x: 4, y: -1 }));
    }

    #[test]
    fn rotation_reference_vector() {
        let piece = Piece {
            shape: vec![vec![1, 1], vec![1, 0]],
            color_index: 0,
        };
        assert_eq!(piece.rotated().shape, vec![vec![1, 1], vec![0, 1]]);
    }

    #[test]
    fn rotation_handles_rectangular_shapes() {
        let bar = Piece::from_kind(TetrominoKind::I);
        let upright = bar.rotated();
        assert_eq!(upright.shape, vec![vec![1], vec![1], vec![1], vec![1]]);
        // Four rotations return to the spawn orientation.
        let back = upright.rotated().rotated().rotated();
        assert_eq!(back.shape, bar.shape);
    }

    #[test]
    fn blocked_rotation_is_a_noop() {
        // Upright bar pinned in the rightmost column cannot swing back to 1x4.
        let mut state = GameState::new(7);
        state.piece = Piece::from_kind(TetrominoKind::I).rotated();
        state.position = Position {
            x: BOARD_WIDTH as i32 - 1,
            y: 4,
        };
        let after = state.rotated();
        assert_eq!(after.piece.shape, state.piece.shape);
    }

    #[test]
    fn shifted_moves_when_free_and_rejects_when_blocked() {
        let state = {
            let mut s = GameState::new(3);
            s.piece = square_piece();
            s.position = Position { x: 0, y: 4 };
            s
        };
        let right = state.shifted(1, 0);
        assert_eq!(right.position, Position { x: 1, y: 4 });
        // Blocked by the left wall: unchanged.
        let left = state.shifted(-1, 0);
        assert_eq!(left.position, state.position);
        assert_eq!(left, state);
    }

    #[test]
    fn step_down_descends_then_locks() {
        let mut state = GameState::new(11);
        state.piece = square_piece();
        state.position = Position {
            x: 4,
            y: BOARD_HEIGHT as i32 - 3,
        };
        let (fallen, outcome) = state.step_down();
        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(fallen.position.y, BOARD_HEIGHT as i32 - 2);

        let (locked, outcome) = fallen.step_down();
        assert_eq!(outcome, StepOutcome::Locked { lines_cleared: 0 });
        // Piece merged at the bottom, fresh piece at spawn.
        assert_eq!(locked.position, SPAWN_POSITION);
        assert!(locked.board.get(4, BOARD_HEIGHT as i32 - 1).unwrap().is_filled());
    }

    #[test]
    fn score_two_lines_at_level_one() {
        let (score, level, lines) = apply_line_score(0, 1, 0, 2);
        assert_eq!(score, 20);
        assert_eq!(lines, 2);
        assert_eq!(level, 1);
    }

    #[test]
    fn score_zero_lines_is_noop() {
        assert_eq!(apply_line_score(50, 2, 11, 0), (50, 2, 11));
    }

    #[test]
    fn level_advances_at_ten_lines() {
        let mut score = 0;
        let mut level = 1;
        let mut total = 0;
        for _ in 0..5 {
            (score, level, total) = apply_line_score(score, level, total, 2);
        }
        assert_eq!(total, 10);
        assert_eq!(level, 2);
        assert_eq!(score, 100);
    }

    #[test]
    fn level_advances_one_step_per_placement() {
        // 9 lines banked, then a (hypothetical) 12-line clear crosses two
        // thresholds; the level still only advances once.
        let (_, level, total) = apply_line_score(0, 1, 9, 12);
        assert_eq!(total, 21);
        assert_eq!(level, 2);
    }

    #[test]
    fn locking_a_full_row_clears_and_scores() {
        let mut state = GameState::new(5);
        state.piece = square_piece();
        // Fill the bottom two rows except the two columns under the piece.
        for y in [BOARD_HEIGHT - 2, BOARD_HEIGHT - 1] {
            for x in 0..BOARD_WIDTH {
                if x != 4 && x != 5 {
                    state.board.set(x, y, Cell::Block(0));
                }
            }
        }
        state.position = Position {
            x: 4,
            y: BOARD_HEIGHT as i32 - 2,
        };
        let (next, outcome) = state.step_down();
        assert_eq!(outcome, StepOutcome::Locked { lines_cleared: 2 });
        assert_eq!(next.score, 20);
        assert_eq!(next.lines_cleared, 2);
        assert!(next.board.rows().iter().flatten().all(|c| !c.is_filled()));
    }

    #[test]
    fn blocked_spawn_resets_the_game() {
        let mut state = GameState::new(9);
        state.piece = square_piece();
        state.score = 120;
        state.level = 2;
        state.lines_cleared = 13;
        // Fill the spawn rows (leaving a gap so nothing clears) and block
        // descent so the next step locks in place.
        for y in 0..2 {
            for x in 0..BOARD_WIDTH - 1 {
                state.board.set(x, y, Cell::Block(0));
            }
        }
        for x in 0..BOARD_WIDTH - 1 {
            state.board.set(x, 4, Cell::Block(0));
        }
        state.position = Position { x: 4, y: 2 };

        let (next, outcome) = state.step_down();
        match outcome {
            StepOutcome::GameOver {
                final_score,
                final_level,
                final_lines,
            } => {
                assert_eq!(final_score, 120);
                assert_eq!(final_level, 2);
                assert_eq!(final_lines, 13);
            }
            other => panic!("expected game over, got {other:?}"),
        }
        assert_eq!(next.score, 0);
        assert_eq!(next.level, 1);
        assert_eq!(next.lines_cleared, 0);
        assert_eq!(next.position, SPAWN_POSITION);
        assert!(next.board.rows().iter().flatten().all(|c| !c.is_filled()));
    }

    #[test]
    fn display_grid_merges_active_piece() {
        let state = GameState::new(42);
        let grid = state.display_grid();
        let filled = grid.rows().iter().flatten().filter(|c| c.is_filled()).count();
        assert_eq!(filled, 4, "every tetromino occupies four cells");
        // The underlying board stays empty.
        assert!(state.board.rows().iter().flatten().all(|c| !c.is_filled()));
    }

    #[test]
    fn piece_source_is_deterministic_per_seed() {
        let mut a = PieceSource::new(77);
        let mut b = PieceSource::new(77);
        for _ in 0..20 {
            assert_eq!(a.next_piece(), b.next_piece());
        }
    }

    #[test]
    fn piece_source_covers_the_catalog() {
        let mut source = PieceSource::new(1);
        let mut seen = [false; 7];
        for _ in 0..200 {
            seen[source.next_piece().color_index as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
