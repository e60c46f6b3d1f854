//! Move generation for 10x10 draughts.
//!
//! Everything here is a pure function of a [`Board`] snapshot:
//!
//! - Soldiers step one square diagonally forward, but capture in all four
//!   diagonal directions by jumping an adjacent opponent onto the empty cell
//!   directly behind it.
//! - Kings fly. A quiet king move slides any distance along a diagonal until
//!   blocked. A king capture takes the first piece met on a diagonal, provided
//!   it is an opponent, and may land on any empty cell beyond it up to the
//!   next piece or the edge.
//!
//! Captures are reported as [`Jump`]s keyed by board coordinates, so a piece
//! keeps its identity across promotion and cloning.

use crate::board::{BOARD_SIZE, Board, Color, DIAGONALS, Position, Rank};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Move { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// One capture option: the piece on `from` takes the piece on `captured`
/// and lands on `landing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Jump {
    pub from: Position,
    pub captured: Position,
    pub landing: Position,
}

impl Jump {
    pub fn new(from: Position, captured: Position, landing: Position) -> Self {
        Jump {
            from,
            captured,
            landing,
        }
    }

    pub fn as_move(&self) -> Move {
        Move::new(self.from, self.landing)
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} -> {}", self.from, self.captured, self.landing)
    }
}

/// The far rank on which a soldier of `color` is crowned.
pub fn promotion_row(color: Color) -> usize {
    match color {
        Color::Red => 0,
        Color::Black => BOARD_SIZE - 1,
    }
}

/// Empty cells the piece on `from` can reach without capturing.
pub fn quiet_moves(board: &Board, from: Position) -> Vec<Position> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };

    let mut moves = Vec::new();
    match piece.rank {
        Rank::Soldier => {
            let dr = piece.color.forward();
            for dc in [-1, 1] {
                if let Some(to) = from.offset(dr, dc) {
                    if board.is_empty_at(to) {
                        moves.push(to);
                    }
                }
            }
        }
        Rank::King => {
            for &(dr, dc) in &DIAGONALS {
                let mut cursor = from;
                while let Some(next) = cursor.offset(dr, dc) {
                    if !board.is_empty_at(next) {
                        break;
                    }
                    moves.push(next);
                    cursor = next;
                }
            }
        }
    }

    moves
}

/// Captures available to the piece on `from` in the current board.
pub fn jumps(board: &Board, from: Position) -> BTreeSet<Jump> {
    let Some(piece) = board.get(from) else {
        return BTreeSet::new();
    };
    let opponent = piece.color.opponent();

    let mut out = BTreeSet::new();
    for &(dr, dc) in &DIAGONALS {
        match piece.rank {
            Rank::Soldier => {
                let Some(over) = from.offset(dr, dc) else {
                    continue;
                };
                if !matches!(board.get(over), Some(p) if p.color == opponent) {
                    continue;
                }
                if let Some(landing) = over.offset(dr, dc) {
                    if board.is_empty_at(landing) {
                        out.insert(Jump::new(from, over, landing));
                    }
                }
            }
            Rank::King => {
                // Skip the empty run up to the first occupied cell.
                let mut cursor = from;
                let target = loop {
                    match cursor.offset(dr, dc) {
                        Some(next) if board.is_empty_at(next) => cursor = next,
                        other => break other,
                    }
                };
                let Some(over) = target else {
                    continue;
                };
                if !matches!(board.get(over), Some(p) if p.color == opponent) {
                    continue;
                }

                let mut landing = over;
                while let Some(next) = landing.offset(dr, dc) {
                    if !board.is_empty_at(next) {
                        break;
                    }
                    out.insert(Jump::new(from, over, next));
                    landing = next;
                }
            }
        }
    }

    out
}

/// Every capture available to `color`, across all of its pieces.
pub fn jumps_for(board: &Board, color: Color) -> BTreeSet<Jump> {
    board
        .pieces_of(color)
        .into_iter()
        .flat_map(|pos| jumps(board, pos))
        .collect()
}

/// Every quiet move available to `color`, ignoring the mandatory-capture rule.
pub fn quiet_moves_for(board: &Board, color: Color) -> Vec<Move> {
    board
        .pieces_of(color)
        .into_iter()
        .flat_map(|from| {
            quiet_moves(board, from)
                .into_iter()
                .map(move |to| Move::new(from, to))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;

    fn board_with(pieces: &[(usize, usize, Piece)]) -> Board {
        let mut board = Board::empty();
        for &(row, col, piece) in pieces {
            board.place(Position::new(row, col), piece);
        }
        board
    }

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_soldier_moves_forward_only() {
        let board = board_with(&[
            (6, 1, Piece::soldier(Color::Red)),
            (3, 6, Piece::soldier(Color::Black)),
        ]);

        let red = quiet_moves(&board, pos(6, 1));
        assert_eq!(red, vec![pos(5, 0), pos(5, 2)]);

        let black = quiet_moves(&board, pos(3, 6));
        assert_eq!(black, vec![pos(4, 5), pos(4, 7)]);
    }

    #[test]
    fn test_soldier_blocked_by_edge_and_pieces() {
        let board = board_with(&[
            (5, 0, Piece::soldier(Color::Red)),
            (4, 1, Piece::soldier(Color::Red)),
        ]);

        assert!(quiet_moves(&board, pos(5, 0)).is_empty());
    }

    #[test]
    fn test_soldier_captures_backwards() {
        let board = board_with(&[
            (4, 3, Piece::soldier(Color::Red)),
            (5, 4, Piece::soldier(Color::Black)),
        ]);

        let found = jumps(&board, pos(4, 3));
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec![Jump::new(pos(4, 3), pos(5, 4), pos(6, 5))]
        );
    }

    #[test]
    fn test_soldier_capture_needs_empty_landing() {
        let board = board_with(&[
            (4, 3, Piece::soldier(Color::Red)),
            (3, 4, Piece::soldier(Color::Black)),
            (2, 5, Piece::soldier(Color::Black)),
        ]);

        assert!(jumps(&board, pos(4, 3)).is_empty());
    }

    #[test]
    fn test_soldier_cannot_capture_off_board() {
        let board = board_with(&[
            (1, 2, Piece::soldier(Color::Red)),
            (0, 1, Piece::soldier(Color::Black)),
        ]);

        assert!(jumps(&board, pos(1, 2)).is_empty());
    }

    #[test]
    fn test_soldier_does_not_capture_own_color() {
        let board = board_with(&[
            (4, 3, Piece::soldier(Color::Red)),
            (3, 4, Piece::soldier(Color::Red)),
        ]);

        assert!(jumps(&board, pos(4, 3)).is_empty());
    }

    #[test]
    fn test_king_slides_until_blocked() {
        let board = board_with(&[
            (4, 3, Piece::king(Color::Red)),
            (2, 1, Piece::soldier(Color::Red)),
        ]);

        let moves = quiet_moves(&board, pos(4, 3));

        assert!(moves.contains(&pos(3, 2)));
        assert!(!moves.contains(&pos(2, 1)));
        assert!(!moves.contains(&pos(1, 0)));
        assert!(moves.contains(&pos(0, 7)));
        assert!(moves.contains(&pos(9, 8)));
        assert!(moves.contains(&pos(7, 0)));
        // 1 up-left, 4 up-right, 3 down-left, 5 down-right
        assert_eq!(moves.len(), 13);
    }

    #[test]
    fn test_king_captures_from_distance_with_choice_of_landing() {
        let board = board_with(&[
            (8, 1, Piece::king(Color::Red)),
            (5, 4, Piece::soldier(Color::Black)),
            (2, 7, Piece::soldier(Color::Black)),
        ]);

        let found: Vec<_> = jumps(&board, pos(8, 1)).into_iter().collect();

        assert_eq!(
            found,
            vec![
                Jump::new(pos(8, 1), pos(5, 4), pos(3, 6)),
                Jump::new(pos(8, 1), pos(5, 4), pos(4, 5)),
            ]
        );
    }

    #[test]
    fn test_king_blocked_by_own_piece_first() {
        let board = board_with(&[
            (8, 1, Piece::king(Color::Red)),
            (6, 3, Piece::soldier(Color::Red)),
            (5, 4, Piece::soldier(Color::Black)),
        ]);

        assert!(jumps(&board, pos(8, 1)).is_empty());
    }

    #[test]
    fn test_king_cannot_capture_two_in_a_row() {
        let board = board_with(&[
            (8, 1, Piece::king(Color::Red)),
            (6, 3, Piece::soldier(Color::Black)),
            (5, 4, Piece::soldier(Color::Black)),
        ]);

        assert!(jumps(&board, pos(8, 1)).is_empty());
    }

    #[test]
    fn test_side_wide_generation() {
        let board = Board::standard();

        assert!(jumps_for(&board, Color::Red).is_empty());
        // Row 6 has five soldiers; the one on column 9 has only one step.
        assert_eq!(quiet_moves_for(&board, Color::Red).len(), 9);
        assert_eq!(quiet_moves_for(&board, Color::Black).len(), 9);
    }

    #[test]
    fn test_promotion_rows() {
        assert_eq!(promotion_row(Color::Red), 0);
        assert_eq!(promotion_row(Color::Black), 9);
    }
}
