use crate::board::Color;
use crate::bot::Bot;
use crate::game::{GameError, GameState};
use crate::movegen::Move;
use tracing::{debug, info, warn};

pub struct MatchConfig {
    /// Completed plies after which the match is declared drawn.
    pub max_plies: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig { max_plies: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    RedWins { winner_name: String, plies: usize },
    BlackWins { winner_name: String, plies: usize },
    Draw { plies: usize },
    IllegalMove { violator: String, winner: String },
}

impl MatchResult {
    pub fn winner(&self) -> Option<&str> {
        match self {
            MatchResult::RedWins { winner_name, .. } => Some(winner_name),
            MatchResult::BlackWins { winner_name, .. } => Some(winner_name),
            MatchResult::IllegalMove { winner, .. } => Some(winner),
            MatchResult::Draw { .. } => None,
        }
    }
}

/// Let `bot` play every move of `side` until the turn passes to the other
/// side or the game ends. Returns the number of moves applied; zero if it is
/// not `side`'s turn.
pub fn drive_opponent(
    state: &mut GameState,
    bot: &mut dyn Bot,
    side: Color,
) -> Result<usize, GameError> {
    let mut moves = 0;
    while state.to_move() == side && !state.is_game_over() {
        let Some(mv) = bot.choose_move(state) else {
            debug!(bot = bot.name(), "opponent has no move");
            break;
        };
        state.make_move(mv)?;
        bot.notify_move(mv);
        moves += 1;
    }
    Ok(moves)
}

pub struct Match {
    config: MatchConfig,
    state: GameState,
    red_bot: Box<dyn Bot>,
    black_bot: Box<dyn Bot>,
    verbose: bool,
}

impl Match {
    pub fn new(
        red_bot: Box<dyn Bot>,
        black_bot: Box<dyn Bot>,
        config: MatchConfig,
        verbose: bool,
    ) -> Self {
        Self::from_state(red_bot, black_bot, config, verbose, GameState::new())
    }

    /// Play on from an existing position, e.g. a loaded save.
    pub fn from_state(
        red_bot: Box<dyn Bot>,
        black_bot: Box<dyn Bot>,
        config: MatchConfig,
        verbose: bool,
        state: GameState,
    ) -> Self {
        Match {
            config,
            state,
            red_bot,
            black_bot,
            verbose,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn play(&mut self) -> MatchResult {
        self.red_bot.game_start(Color::Red);
        self.black_bot.game_start(Color::Black);

        if self.verbose {
            println!("Match starting:");
            println!("  Red:   {}", self.red_bot.name());
            println!("  Black: {}", self.black_bot.name());
            println!("\nInitial board:");
            println!("{}", self.state.display_board());
        }

        let result = loop {
            if let Some(winner) = self.state.winner() {
                break self.win_for(winner);
            }
            if self.state.ply_count() >= self.config.max_plies {
                if self.verbose {
                    println!("\nMax plies ({}) reached - Draw!", self.config.max_plies);
                }
                break MatchResult::Draw {
                    plies: self.state.ply_count(),
                };
            }

            let mover = self.state.to_move();
            if self.state.is_blocked() {
                if self.verbose {
                    println!("\n{} has no legal move", mover);
                }
                break self.win_for(mover.opponent());
            }

            if let Some(result) = self.play_move(mover) {
                break result;
            }
        };

        info!(?result, plies = self.state.ply_count(), "match finished");
        result
    }

    fn bot_name(&self, color: Color) -> String {
        match color {
            Color::Red => self.red_bot.name().to_string(),
            Color::Black => self.black_bot.name().to_string(),
        }
    }

    fn win_for(&self, winner: Color) -> MatchResult {
        let winner_name = self.bot_name(winner);
        let plies = self.state.ply_count();
        if self.verbose {
            println!("\n{} wins as {}!", winner_name, winner);
        }
        match winner {
            Color::Red => MatchResult::RedWins { winner_name, plies },
            Color::Black => MatchResult::BlackWins { winner_name, plies },
        }
    }

    fn play_move(&mut self, mover: Color) -> Option<MatchResult> {
        let bot = match mover {
            Color::Red => &mut self.red_bot,
            Color::Black => &mut self.black_bot,
        };

        if self.verbose {
            println!(
                "\nPly {}: {} to play ({} legal moves)",
                self.state.ply_count() + 1,
                bot.name(),
                self.state.legal_moves().len()
            );
        }

        let mv = bot.choose_move(&self.state);
        self.handle_move_result(mv, mover)
    }

    fn handle_move_result(&mut self, mv: Option<Move>, mover: Color) -> Option<MatchResult> {
        let forfeit = |this: &Self, reason: String| {
            let violator = this.bot_name(mover);
            warn!(%violator, %reason, "forfeit");
            if this.verbose {
                println!("ILLEGAL MOVE: {} - {}", violator, reason);
            }
            MatchResult::IllegalMove {
                violator,
                winner: this.bot_name(mover.opponent()),
            }
        };

        // The side still had legal moves, so returning none is a forfeit.
        let Some(mv) = mv else {
            return Some(forfeit(self, "returned no move".to_string()));
        };

        match self.state.make_move(mv) {
            Ok(outcome) => {
                if self.verbose {
                    let note = match (outcome.captured, outcome.turn_passed) {
                        (Some(taken), false) => format!(" takes {} and must continue", taken),
                        (Some(taken), true) => format!(" takes {}", taken),
                        (None, _) => String::new(),
                    };
                    println!("{} plays: {}{}", self.bot_name(mover), mv, note);
                    println!("{}", self.state.display_board());
                }
                self.red_bot.notify_move(mv);
                self.black_bot.notify_move(mv);
                None
            }
            Err(e) => Some(forfeit(self, e.to_string())),
        }
    }
}
