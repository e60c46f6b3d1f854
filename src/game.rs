use crate::board::{Board, Color, Piece, Position};
use crate::capture::CaptureChain;
use crate::history::{History, Snapshot};
use crate::movegen::{self, Jump, Move};
use crate::persistence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Game already over")]
    GameOver,
    #[error("Nothing to undo")]
    NoHistory,
    #[error("{0} is not a playable square")]
    InvalidSquare(Position),
    #[error("Saved game unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed saved game at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// A piece taken off the board, with the cell it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPiece {
    pub position: Position,
    pub piece: Piece,
}

/// What an accepted move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub captured: Option<Position>,
    pub promoted: bool,
    /// False while the same piece still has to keep capturing.
    pub turn_passed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) live_red: usize,
    pub(crate) live_black: usize,
    pub(crate) to_move: Color,
    pub(crate) chain: CaptureChain,
    /// Every piece removed so far, oldest first.
    pub(crate) captured: Vec<CapturedPiece>,
    pub(crate) history: History,
}

impl GameState {
    /// Create a new game with the standard opening layout. Red moves first.
    pub fn new() -> Self {
        Self::from_board(Board::standard(), Color::Red)
    }

    /// Start from an arbitrary position. Live counts are taken from the board
    /// and the position becomes the base of the undo history.
    pub fn from_board(board: Board, to_move: Color) -> Self {
        let base = Snapshot {
            board: board.clone(),
            to_move,
            live_red: board.count(Color::Red),
            live_black: board.count(Color::Black),
            captured_len: 0,
            chain: CaptureChain::scan(&board, to_move),
        };
        GameState {
            live_red: base.live_red,
            live_black: base.live_black,
            chain: base.chain.clone(),
            board,
            to_move,
            captured: Vec::new(),
            history: History::new(base),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn chain(&self) -> &CaptureChain {
        &self.chain
    }

    pub fn captured_pieces(&self) -> &[CapturedPiece] {
        &self.captured
    }

    /// Completed plies since the game started or was loaded.
    pub fn ply_count(&self) -> usize {
        self.history.len().saturating_sub(1)
    }

    pub fn live_count(&self, color: Color) -> usize {
        match color {
            Color::Red => self.live_red,
            Color::Black => self.live_black,
        }
    }

    pub fn get_piece(&self, pos: Position) -> Option<Piece> {
        self.board.get(pos)
    }

    pub fn piece_at(&self, row: usize, col: usize) -> Option<Piece> {
        self.board.get(Position::new(row, col))
    }

    /// Put a piece on the board outside of play, e.g. to set up a position.
    /// Setup edits are not recorded in the undo history.
    pub fn place(&mut self, pos: Position, piece: Piece) -> Result<(), GameError> {
        let previous = self
            .board
            .place(pos, piece)
            .ok_or(GameError::InvalidSquare(pos))?;
        if let Some(old) = previous {
            *self.live_mut(old.color) -= 1;
        }
        *self.live_mut(piece.color) += 1;
        self.chain = CaptureChain::Idle;
        Ok(())
    }

    /// Take the piece on `pos` off the board, logging it as captured.
    pub fn remove_piece(&mut self, pos: Position) -> Option<Piece> {
        let piece = self.take_piece(pos)?;
        self.chain = CaptureChain::Idle;
        Some(piece)
    }

    pub fn winner(&self) -> Option<Color> {
        if self.live_red == 0 {
            Some(Color::Black)
        } else if self.live_black == 0 {
            Some(Color::Red)
        } else {
            None
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }

    /// True when the side to move still has pieces but nothing to play.
    pub fn is_blocked(&self) -> bool {
        !self.is_game_over() && self.legal_moves().is_empty()
    }

    /// Captures the side to move is obliged to choose from. Empty when a
    /// quiet move is allowed.
    pub fn mandatory_jumps(&self) -> BTreeSet<Jump> {
        if self.chain.is_idle() {
            movegen::jumps_for(&self.board, self.to_move)
        } else {
            self.chain.jumps().clone()
        }
    }

    pub fn must_capture(&self) -> bool {
        !self.mandatory_jumps().is_empty()
    }

    /// Squares a forced capture may land on, for highlighting.
    pub fn legal_capture_landings(&self) -> BTreeSet<Position> {
        self.mandatory_jumps()
            .into_iter()
            .map(|jump| jump.landing)
            .collect()
    }

    /// Get all moves `make_move` would accept right now
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_game_over() {
            return Vec::new();
        }

        let jumps = self.mandatory_jumps();
        if !jumps.is_empty() {
            let mut moves: Vec<Move> = jumps.iter().map(Jump::as_move).collect();
            moves.dedup();
            return moves;
        }

        movegen::quiet_moves_for(&self.board, self.to_move)
    }

    /// Boolean form of [`GameState::make_move`]: true if the move was applied.
    pub fn attempt_move(&mut self, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> bool {
        let mv = Move::new(
            Position::new(from_row, from_col),
            Position::new(to_row, to_col),
        );
        self.make_move(mv).is_ok()
    }

    /// Validate and apply a move. A rejected move leaves the position untouched.
    pub fn make_move(&mut self, mv: Move) -> Result<MoveOutcome, GameError> {
        let result = self.apply_move(mv);
        if let Err(e) = &result {
            debug!(%mv, error = %e, "move rejected");
        }
        result
    }

    fn apply_move(&mut self, mv: Move) -> Result<MoveOutcome, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }

        let piece = self
            .board
            .get(mv.from)
            .ok_or_else(|| GameError::IllegalMove(format!("no piece on {}", mv.from)))?;
        if piece.color != self.to_move {
            return Err(GameError::NotYourTurn);
        }
        if !self.board.is_empty_at(mv.to) {
            return Err(GameError::IllegalMove(format!(
                "destination {} is not an empty square",
                mv.to
            )));
        }

        // Scanned locally so a rejected move leaves the stored chain alone.
        let scanned;
        let chain = if self.chain.is_idle() {
            scanned = CaptureChain::scan(&self.board, self.to_move);
            &scanned
        } else {
            &self.chain
        };

        if chain.is_active() {
            let jump = chain.find(mv.from, mv.to).ok_or_else(|| {
                GameError::IllegalMove(match chain.continuing_piece() {
                    Some(piece) if piece != mv.from => {
                        format!("the piece on {} must keep capturing", piece)
                    }
                    _ => format!("{} is not a legal capture and capturing is mandatory", mv),
                })
            })?;
            return Ok(self.apply_jump(jump));
        }

        if !movegen::quiet_moves(&self.board, mv.from).contains(&mv.to) {
            return Err(GameError::IllegalMove(format!("{} is not a legal move", mv)));
        }

        self.board.relocate(mv.from, mv.to);
        let promoted = self.promote_if_due(mv.to);
        self.finish_turn();

        Ok(MoveOutcome {
            captured: None,
            promoted,
            turn_passed: true,
        })
    }

    fn apply_jump(&mut self, jump: Jump) -> MoveOutcome {
        self.take_piece(jump.captured);
        self.board.relocate(jump.from, jump.landing);
        let promoted = self.promote_if_due(jump.landing);

        // A freshly crowned piece keeps capturing under king rules.
        let turn_passed = match CaptureChain::continue_from(&self.board, jump.landing) {
            Some(chain) => {
                debug!(piece = %jump.landing, "capture chain continues");
                self.chain = chain;
                false
            }
            None => {
                self.finish_turn();
                true
            }
        };

        MoveOutcome {
            captured: Some(jump.captured),
            promoted,
            turn_passed,
        }
    }

    fn take_piece(&mut self, pos: Position) -> Option<Piece> {
        let piece = self.board.remove(pos)?;
        *self.live_mut(piece.color) -= 1;
        self.captured.push(CapturedPiece {
            position: pos,
            piece,
        });
        Some(piece)
    }

    fn promote_if_due(&mut self, pos: Position) -> bool {
        match self.board.get(pos) {
            Some(piece) if pos.row == movegen::promotion_row(piece.color) => {
                self.board.promote(pos)
            }
            _ => false,
        }
    }

    fn finish_turn(&mut self) {
        self.to_move = self.to_move.opponent();
        self.chain = CaptureChain::scan(&self.board, self.to_move);
        self.history.push(self.snapshot());
        debug!(to_move = %self.to_move, ply = self.ply_count(), "turn passed");
    }

    fn live_mut(&mut self, color: Color) -> &mut usize {
        match color {
            Color::Red => &mut self.live_red,
            Color::Black => &mut self.live_black,
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            to_move: self.to_move,
            live_red: self.live_red,
            live_black: self.live_black,
            captured_len: self.captured.len(),
            chain: self.chain.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.board = snapshot.board;
        self.to_move = snapshot.to_move;
        self.live_red = snapshot.live_red;
        self.live_black = snapshot.live_black;
        self.captured.truncate(snapshot.captured_len);
        self.chain = snapshot.chain;
    }

    /// Take back the last completed ply. In the middle of a capture chain
    /// this instead returns to the start of the current turn, or to the
    /// loaded position when the game was loaded mid-chain.
    pub fn undo(&mut self) -> Result<(), GameError> {
        let snapshot = if self.chain.is_continuing() {
            self.history
                .top()
                .filter(|start| start.board != self.board)
                .cloned()
        } else {
            self.history.undo().cloned()
        };
        let snapshot = snapshot.ok_or(GameError::NoHistory)?;
        self.restore(snapshot);
        debug!(to_move = %self.to_move, ply = self.ply_count(), "undo");
        Ok(())
    }

    /// Undo until `side` is to move again, so that a player's undo also takes
    /// back the automated reply that followed it. Returns the number of steps.
    pub fn undo_for(&mut self, side: Color) -> Result<usize, GameError> {
        self.undo()?;
        let mut steps = 1;
        while self.to_move != side && self.undo().is_ok() {
            steps += 1;
        }
        Ok(steps)
    }

    /// Write the whole state, including an unfinished capture chain, to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GameError> {
        persistence::save(self, path)
    }

    /// Replace this state with the one stored at `path`. On failure the
    /// current state is left as it was.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), GameError> {
        *self = persistence::load(path)?;
        Ok(())
    }

    /// Get a string representation of the board
    pub fn display_board(&self) -> String {
        let mut result = String::new();
        result.push_str(&format!(
            "[{} to move | Red {} - Black {}]\n",
            self.to_move, self.live_red, self.live_black
        ));
        result.push_str(&self.board.render());
        result
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
