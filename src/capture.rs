use crate::board::{Board, Color, Position};
use crate::movegen::{self, Jump};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Mandatory-capture bookkeeping for the turn in progress.
///
/// `Idle` means no obligation is known yet. The game scans the side to move
/// before validating a request and moves into `MustCapture` if any of its
/// pieces can capture. After a capture, if the same piece can keep capturing,
/// the chain narrows to `Continuing` for that piece alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureChain {
    #[default]
    Idle,
    MustCapture(BTreeSet<Jump>),
    Continuing {
        piece: Position,
        jumps: BTreeSet<Jump>,
    },
}

impl CaptureChain {
    /// Compute the obligation for `color` from scratch.
    pub fn scan(board: &Board, color: Color) -> Self {
        let jumps = movegen::jumps_for(board, color);
        if jumps.is_empty() {
            CaptureChain::Idle
        } else {
            CaptureChain::MustCapture(jumps)
        }
    }

    /// Recompute the options of the piece that just captured and landed on
    /// `piece`. Returns `None` when the chain is over.
    pub fn continue_from(board: &Board, piece: Position) -> Option<Self> {
        let jumps = movegen::jumps(board, piece);
        if jumps.is_empty() {
            None
        } else {
            Some(CaptureChain::Continuing { piece, jumps })
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CaptureChain::Idle)
    }

    /// True when a capture must be made before the turn may pass.
    pub fn is_active(&self) -> bool {
        !self.jumps().is_empty()
    }

    pub fn is_continuing(&self) -> bool {
        matches!(self, CaptureChain::Continuing { .. })
    }

    /// The piece that must keep capturing, if a chain is in flight.
    pub fn continuing_piece(&self) -> Option<Position> {
        match self {
            CaptureChain::Continuing { piece, .. } => Some(*piece),
            _ => None,
        }
    }

    pub fn jumps(&self) -> &BTreeSet<Jump> {
        static NONE: BTreeSet<Jump> = BTreeSet::new();
        match self {
            CaptureChain::Idle => &NONE,
            CaptureChain::MustCapture(jumps) => jumps,
            CaptureChain::Continuing { jumps, .. } => jumps,
        }
    }

    /// The sanctioned capture that moves `from` onto `landing`, if any.
    /// The captured piece is determined by the pair, so callers never name it.
    pub fn find(&self, from: Position, landing: Position) -> Option<Jump> {
        self.jumps()
            .iter()
            .find(|jump| jump.from == from && jump.landing == landing)
            .copied()
    }

    /// Landing squares of every sanctioned capture.
    pub fn landings(&self) -> BTreeSet<Position> {
        self.jumps().iter().map(|jump| jump.landing).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_scan_is_idle_without_captures() {
        let board = Board::standard();

        assert_eq!(CaptureChain::scan(&board, Color::Red), CaptureChain::Idle);
        assert!(!CaptureChain::Idle.is_active());
        assert!(CaptureChain::Idle.landings().is_empty());
    }

    #[test]
    fn test_scan_unions_all_capturing_pieces() {
        let mut board = Board::empty();
        board.place(pos(6, 1), Piece::soldier(Color::Red));
        board.place(pos(5, 2), Piece::soldier(Color::Black));
        board.place(pos(6, 7), Piece::soldier(Color::Red));
        board.place(pos(5, 6), Piece::soldier(Color::Black));

        let chain = CaptureChain::scan(&board, Color::Red);

        assert!(chain.is_active());
        assert!(!chain.is_continuing());
        assert_eq!(chain.landings(), BTreeSet::from([pos(4, 3), pos(4, 5)]));
        assert_eq!(
            chain.find(pos(6, 1), pos(4, 3)),
            Some(Jump::new(pos(6, 1), pos(5, 2), pos(4, 3)))
        );
        assert_eq!(chain.find(pos(6, 1), pos(4, 5)), None);
    }

    #[test]
    fn test_continue_from_narrows_to_one_piece() {
        let mut board = Board::empty();
        board.place(pos(4, 3), Piece::soldier(Color::Red));
        board.place(pos(3, 4), Piece::soldier(Color::Black));
        board.place(pos(6, 7), Piece::soldier(Color::Red));
        board.place(pos(5, 6), Piece::soldier(Color::Black));

        let chain = CaptureChain::continue_from(&board, pos(4, 3)).unwrap();

        assert_eq!(chain.continuing_piece(), Some(pos(4, 3)));
        assert_eq!(chain.landings(), BTreeSet::from([pos(2, 5)]));
        assert_eq!(chain.find(pos(6, 7), pos(4, 5)), None);
    }

    #[test]
    fn test_continue_from_ends_chain() {
        let mut board = Board::empty();
        board.place(pos(4, 3), Piece::soldier(Color::Red));

        assert_eq!(CaptureChain::continue_from(&board, pos(4, 3)), None);
    }
}
