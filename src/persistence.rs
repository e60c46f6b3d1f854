//! Line-oriented save format.
//!
//! The file starts with one line per cell in row-major order, blank for an
//! empty cell and `row,col,color,rank` otherwise (color `1` = Red, `2` =
//! Black; rank `1` = soldier, `2` = king). Labelled sections follow:
//!
//! ```text
//! numPlayer1      Red live count
//! numPlayer2      Black live count
//! player1         true when Red is to move
//! deletedPieces   count, then one piece line per captured piece
//! possibleJumps   count, then one jump line per mandatory capture
//! nextJump        count, then one jump line per forced continuation
//! ```
//!
//! A jump line is `capturer piece,captured piece,LL` where `LL` is the landing
//! square as two digits, row then column. That encoding only works because
//! the board is 10x10.

use crate::board::{BOARD_SIZE, Board, Color, Piece, Position, Rank};
use crate::capture::CaptureChain;
use crate::game::{CapturedPiece, GameError, GameState};
use crate::movegen::{self, Jump};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Default file name used by the host when no path is configured.
pub const DEFAULT_SAVE_FILE: &str = "game_state.txt";

fn color_code(color: Color) -> u8 {
    match color {
        Color::Red => 1,
        Color::Black => 2,
    }
}

fn rank_code(rank: Rank) -> u8 {
    match rank {
        Rank::Soldier => 1,
        Rank::King => 2,
    }
}

fn piece_record(pos: Position, piece: Piece) -> String {
    format!(
        "{},{},{},{}",
        pos.row,
        pos.col,
        color_code(piece.color),
        rank_code(piece.rank)
    )
}

fn jump_record(board: &Board, jump: &Jump) -> Option<String> {
    let capturer = board.get(jump.from)?;
    let captured = board.get(jump.captured)?;
    Some(format!(
        "{},{},{}{}",
        piece_record(jump.from, capturer),
        piece_record(jump.captured, captured),
        jump.landing.row,
        jump.landing.col
    ))
}

fn push_section(out: &mut String, label: &str, records: &[String]) {
    out.push_str(&format!("{}\n{}\n", label, records.len()));
    for record in records {
        out.push_str(record);
        out.push('\n');
    }
}

/// Serialize the whole state, including any capture chain in progress.
pub fn encode(state: &GameState) -> String {
    let mut out = String::new();

    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let pos = Position::new(row, col);
            if let Some(piece) = state.board.get(pos) {
                out.push_str(&piece_record(pos, piece));
            }
            out.push('\n');
        }
    }

    out.push_str(&format!("numPlayer1\n{}\n", state.live_red));
    out.push_str(&format!("numPlayer2\n{}\n", state.live_black));
    out.push_str(&format!("player1\n{}\n", state.to_move == Color::Red));

    let deleted: Vec<String> = state
        .captured
        .iter()
        .map(|c| piece_record(c.position, c.piece))
        .collect();
    push_section(&mut out, "deletedPieces", &deleted);

    let records = |jumps: &BTreeSet<Jump>| -> Vec<String> {
        jumps
            .iter()
            .filter_map(|jump| jump_record(&state.board, jump))
            .collect()
    };
    let (possible, next) = match &state.chain {
        CaptureChain::Idle => (Vec::new(), Vec::new()),
        CaptureChain::MustCapture(jumps) => (records(jumps), Vec::new()),
        CaptureChain::Continuing { jumps, .. } => (Vec::new(), records(jumps)),
    };
    push_section(&mut out, "possibleJumps", &possible);
    push_section(&mut out, "nextJump", &next);

    out
}

/// Cursor over the input that remembers line numbers for error reports.
struct Reader<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Reader {
            lines: text.lines(),
            line: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> GameError {
        GameError::Malformed {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn next(&mut self) -> Result<&'a str, GameError> {
        self.line += 1;
        self.lines
            .next()
            .ok_or_else(|| self.error("unexpected end of file"))
    }

    fn label(&mut self, expected: &str) -> Result<(), GameError> {
        let line = self.next()?;
        if line.trim() != expected {
            return Err(self.error(format!("expected `{}`, found `{}`", expected, line)));
        }
        Ok(())
    }

    fn value<T: FromStr>(&mut self) -> Result<T, GameError> {
        let line = self.next()?;
        line.trim()
            .parse()
            .map_err(|_| self.error(format!("cannot parse `{}`", line)))
    }

    fn fields(&mut self, count: usize) -> Result<Vec<&'a str>, GameError> {
        let line = self.next()?;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != count {
            return Err(self.error(format!(
                "expected {} comma-separated fields, found {}",
                count,
                fields.len()
            )));
        }
        Ok(fields)
    }

    /// Parse `row,col,color,rank` from four fields.
    fn piece(&self, fields: &[&str]) -> Result<(Position, Piece), GameError> {
        let mut numbers = [0usize; 4];
        for (slot, field) in numbers.iter_mut().zip(fields) {
            *slot = field
                .parse()
                .map_err(|_| self.error(format!("`{}` is not a number", field)))?;
        }
        let [row, col, color, rank] = numbers;

        let pos = Position::new(row, col);
        if !pos.in_bounds() || !pos.is_dark() {
            return Err(self.error(format!("{} is not a playable square", pos)));
        }
        let color = match color {
            1 => Color::Red,
            2 => Color::Black,
            other => return Err(self.error(format!("unknown color code {}", other))),
        };
        let rank = match rank {
            1 => Rank::Soldier,
            2 => Rank::King,
            other => return Err(self.error(format!("unknown rank code {}", other))),
        };
        Ok((pos, Piece::new(color, rank)))
    }

    fn landing(&self, field: &str) -> Result<Position, GameError> {
        let digits: Vec<u32> = field.chars().filter_map(|c| c.to_digit(10)).collect();
        match digits.as_slice() {
            [row, col] if field.len() == 2 => Ok(Position::new(*row as usize, *col as usize)),
            _ => Err(self.error(format!("`{}` is not a two-digit landing square", field))),
        }
    }

    /// Read a counted section of jump lines and check each one against the board.
    fn jumps(&mut self, label: &str, board: &Board, to_move: Color) -> Result<BTreeSet<Jump>, GameError> {
        self.label(label)?;
        let count: usize = self.value()?;
        let mut jumps = BTreeSet::new();
        for _ in 0..count {
            let fields = self.fields(9)?;
            let (from, capturer) = self.piece(&fields[0..4])?;
            let (captured, victim) = self.piece(&fields[4..8])?;
            let landing = self.landing(fields[8])?;

            if board.get(from) != Some(capturer) || capturer.color != to_move {
                return Err(self.error(format!("no capturing piece of the side to move on {}", from)));
            }
            if board.get(captured) != Some(victim) {
                return Err(self.error(format!("captured piece on {} is not on the board", captured)));
            }
            let jump = Jump::new(from, captured, landing);
            if !movegen::jumps(board, from).contains(&jump) {
                return Err(self.error(format!("{} is not a capture in this position", jump)));
            }
            jumps.insert(jump);
        }
        Ok(jumps)
    }
}

/// Rebuild a state from [`encode`] output. Nothing is returned unless the
/// whole input is well formed and consistent.
pub fn decode(text: &str) -> Result<GameState, GameError> {
    let mut reader = Reader::new(text);

    let mut board = Board::empty();
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let line = reader.next()?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != 4 {
                return Err(reader.error("expected an empty line or `row,col,color,rank`"));
            }
            let (pos, piece) = reader.piece(&fields)?;
            if pos != Position::new(row, col) {
                return Err(reader.error(format!(
                    "piece claims {} but is stored in cell ({}, {})",
                    pos, row, col
                )));
            }
            board.place(pos, piece);
        }
    }

    reader.label("numPlayer1")?;
    let live_red: usize = reader.value()?;
    if live_red != board.count(Color::Red) {
        return Err(reader.error("Red live count disagrees with the board"));
    }
    reader.label("numPlayer2")?;
    let live_black: usize = reader.value()?;
    if live_black != board.count(Color::Black) {
        return Err(reader.error("Black live count disagrees with the board"));
    }
    reader.label("player1")?;
    let to_move = match reader.next()?.trim() {
        "true" => Color::Red,
        "false" => Color::Black,
        other => return Err(reader.error(format!("expected true or false, found `{}`", other))),
    };

    reader.label("deletedPieces")?;
    let deleted: usize = reader.value()?;
    // The count is untrusted; let the records themselves bound the log.
    let mut captured = Vec::new();
    for _ in 0..deleted {
        let fields = reader.fields(4)?;
        let (position, piece) = reader.piece(&fields)?;
        captured.push(CapturedPiece { position, piece });
    }

    let possible = reader.jumps("possibleJumps", &board, to_move)?;
    let next = reader.jumps("nextJump", &board, to_move)?;

    let chain = match (possible.is_empty(), next.is_empty()) {
        (true, true) => CaptureChain::Idle,
        (false, true) => {
            if possible != movegen::jumps_for(&board, to_move) {
                return Err(reader.error("possibleJumps is not the full set of captures"));
            }
            CaptureChain::MustCapture(possible)
        }
        (true, false) => {
            let pieces: BTreeSet<Position> = next.iter().map(|jump| jump.from).collect();
            let mut pieces = pieces.into_iter();
            match (pieces.next(), pieces.next()) {
                (Some(piece), None) if next == movegen::jumps(&board, piece) => {
                    CaptureChain::Continuing { piece, jumps: next }
                }
                (Some(_), None) => {
                    return Err(reader.error("nextJump is not the full set of continuations"));
                }
                _ => {
                    return Err(
                        reader.error("a continuing capture chain must belong to one piece")
                    );
                }
            }
        }
        (false, false) => {
            return Err(reader.error("mandatory and continuing captures are both present"));
        }
    };

    while let Some(line) = reader.lines.next() {
        reader.line += 1;
        if !line.trim().is_empty() {
            return Err(reader.error("unexpected data after the nextJump section"));
        }
    }

    let mut state = GameState::from_board(board, to_move);
    state.captured = captured;
    state.chain = chain;
    state.history.reset(state.snapshot());
    Ok(state)
}

/// Write the state to `path` in one go.
pub fn save<P: AsRef<Path>>(state: &GameState, path: P) -> Result<(), GameError> {
    let path = path.as_ref();
    fs::write(path, encode(state))?;
    info!(path = %path.display(), ply = state.ply_count(), "game saved");
    Ok(())
}

/// Read and decode the state stored at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<GameState, GameError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let state = decode(&text)?;
    info!(path = %path.display(), to_move = %state.to_move(), "game loaded");
    Ok(state)
}
