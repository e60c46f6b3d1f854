use crate::board::{Board, Color};
use crate::capture::CaptureChain;
use serde::{Deserialize, Serialize};

/// A full copy of the turn state at the end of a ply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: Board,
    pub to_move: Color,
    pub live_red: usize,
    pub live_black: usize,
    /// Length of the captured-piece log at this point, so undo can trim it.
    pub captured_len: usize,
    /// Capture obligation in force for `to_move`.
    pub chain: CaptureChain,
}

/// Append-only stack of snapshots. The bottom entry is the state the game
/// started from and is never popped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    entries: Vec<Snapshot>,
}

impl History {
    pub fn new(initial: Snapshot) -> Self {
        History {
            entries: vec![initial],
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.entries.push(snapshot);
    }

    /// Discard the latest entry and return the one beneath it.
    /// Returns `None` when only the initial entry is left.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.pop();
        self.entries.last()
    }

    pub fn top(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Forget everything and start again from `base`.
    pub fn reset(&mut self, base: Snapshot) {
        self.entries.clear();
        self.entries.push(base);
    }
}
