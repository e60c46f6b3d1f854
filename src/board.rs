use serde::{Deserialize, Serialize};
use std::fmt;

/// The board is always 10x10, so every coordinate fits in a single digit.
pub const BOARD_SIZE: usize = 10;

/// Number of soldiers each side starts with.
pub const PIECES_PER_SIDE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    /// Player 1. Starts on rows 6-9, moves first, advances toward row 0.
    Red,
    /// Player 2. Starts on rows 0-3, advances toward row 9.
    Black,
}

impl Color {
    pub fn opponent(&self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// Row delta of a forward step.
    pub fn forward(&self) -> i32 {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Color::Red => "Red",
            Color::Black => "Black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Soldier,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub rank: Rank,
}

impl Piece {
    pub fn new(color: Color, rank: Rank) -> Self {
        Piece { color, rank }
    }

    pub fn soldier(color: Color) -> Self {
        Piece::new(color, Rank::Soldier)
    }

    pub fn king(color: Color) -> Self {
        Piece::new(color, Rank::King)
    }

    pub fn is_king(&self) -> bool {
        self.rank == Rank::King
    }

    fn symbol(&self) -> char {
        match (self.color, self.rank) {
            (Color::Red, Rank::Soldier) => 'r',
            (Color::Red, Rank::King) => 'R',
            (Color::Black, Rank::Soldier) => 'b',
            (Color::Black, Rank::King) => 'B',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    pub fn in_bounds(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Dark squares are the only playable ones.
    pub fn is_dark(&self) -> bool {
        (self.row + self.col) % 2 == 1
    }

    /// Step by `(dr, dc)`, returning `None` when the result leaves the board.
    pub fn offset(&self, dr: i32, dc: i32) -> Option<Position> {
        let r = self.row as i32 + dr;
        let c = self.col as i32 + dc;
        if r < 0 || r >= BOARD_SIZE as i32 || c < 0 || c >= BOARD_SIZE as i32 {
            return None;
        }
        Some(Position::new(r as usize, c as usize))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The four diagonal directions as `(row, col)` deltas.
pub const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// A 10x10 grid of optional pieces. Identity of a piece is its cell.
///
/// The board performs no legality checks; the game layer validates a move
/// before any of the mutating methods here are called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Board {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Opening layout: Black soldiers on the dark squares of rows 0-3, Red
    /// soldiers on the dark squares of rows 6-9.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let pos = Position::new(row, col);
                if !pos.is_dark() {
                    continue;
                }
                if row < 4 {
                    board.cells[row][col] = Some(Piece::soldier(Color::Black));
                } else if row > 5 {
                    board.cells[row][col] = Some(Piece::soldier(Color::Red));
                }
            }
        }
        board
    }

    pub fn get(&self, pos: Position) -> Option<Piece> {
        if pos.in_bounds() {
            self.cells[pos.row][pos.col]
        } else {
            None
        }
    }

    pub fn is_empty_at(&self, pos: Position) -> bool {
        pos.in_bounds() && self.cells[pos.row][pos.col].is_none()
    }

    /// Put `piece` on `pos`, returning whatever was there before.
    /// Returns `None` without touching the board for light or off-board squares.
    pub fn place(&mut self, pos: Position, piece: Piece) -> Option<Option<Piece>> {
        if !pos.in_bounds() || !pos.is_dark() {
            return None;
        }
        Some(self.cells[pos.row][pos.col].replace(piece))
    }

    pub fn remove(&mut self, pos: Position) -> Option<Piece> {
        if !pos.in_bounds() {
            return None;
        }
        self.cells[pos.row][pos.col].take()
    }

    /// Move the piece on `from` to `to`, clearing the source cell.
    pub fn relocate(&mut self, from: Position, to: Position) -> Option<Piece> {
        let piece = self.remove(from)?;
        self.cells[to.row][to.col] = Some(piece);
        Some(piece)
    }

    /// Crown the piece on `pos`. Returns true if a soldier became a king.
    pub fn promote(&mut self, pos: Position) -> bool {
        match self.cells[pos.row][pos.col].as_mut() {
            Some(piece) if piece.rank == Rank::Soldier => {
                piece.rank = Rank::King;
                true
            }
            _ => false,
        }
    }

    pub fn count(&self, color: Color) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| matches!(cell, Some(p) if p.color == color))
            .count()
    }

    /// Positions of every piece of `color`, in row-major order.
    pub fn pieces_of(&self, color: Color) -> Vec<Position> {
        let mut out = Vec::new();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if let Some(piece) = self.cells[row][col] {
                    if piece.color == color {
                        out.push(Position::new(row, col));
                    }
                }
            }
        }
        out
    }

    /// Get a string representation of the board
    pub fn render(&self) -> String {
        let mut result = String::new();
        result.push_str("   ");
        for col in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", col));
        }
        result.push('\n');

        for row in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", row));
            for col in 0..BOARD_SIZE {
                let c = match self.cells[row][col] {
                    Some(piece) => piece.symbol(),
                    None if Position::new(row, col).is_dark() => '.',
                    None => ' ',
                };
                result.push_str(&format!(" {} ", c));
            }
            result.push('\n');
        }

        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}
