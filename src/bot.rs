use crate::board::Color;
use crate::game::GameState;
use crate::movegen::Move;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Trait that all automated players must implement
pub trait Bot: Send {
    /// Get the name of the bot
    fn name(&self) -> &str;

    /// Pick the next move for the side to move. During a capture chain this
    /// is called again for every further jump.
    fn choose_move(&mut self, state: &GameState) -> Option<Move>;

    /// Notified when the game starts
    fn game_start(&mut self, _color: Color) {}

    /// Notified when a move is made (by either player)
    fn notify_move(&mut self, _mv: Move) {}
}

/// Plays a uniformly random legal move.
pub struct RandomBot {
    name: String,
    rng: StdRng,
}

impl RandomBot {
    pub fn new(name: String) -> Self {
        RandomBot {
            name,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible bot for tests and replays.
    pub fn seeded(name: String, seed: u64) -> Self {
        RandomBot {
            name,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        state.legal_moves().choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bot_picks_legal_moves() {
        let mut bot = RandomBot::seeded("Random".to_string(), 7);
        let state = GameState::new();

        for _ in 0..20 {
            let mv = bot.choose_move(&state).unwrap();
            assert!(state.legal_moves().contains(&mv));
        }
    }

    #[test]
    fn test_random_bot_respects_forced_capture() {
        let mut state = GameState::new();
        for (fr, fc, tr, tc) in [(6, 1, 5, 2), (3, 6, 4, 5), (5, 2, 4, 3)] {
            assert!(state.attempt_move(fr, fc, tr, tc));
        }
        let mut bot = RandomBot::seeded("Random".to_string(), 1);

        let mv = bot.choose_move(&state).unwrap();
        assert!(state.legal_capture_landings().contains(&mv.to));
    }

    #[test]
    fn test_random_bot_without_moves() {
        let mut state = GameState::new();
        let black = state.board().pieces_of(Color::Black);
        for position in black {
            state.remove_piece(position);
        }
        let mut bot = RandomBot::new("Random".to_string());

        assert_eq!(bot.choose_move(&state), None);
    }
}
