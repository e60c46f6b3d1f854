use draughts_arena::web::{ServerConfig, run_server};
use draughts_arena::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    if std::env::args().nth(1).as_deref() == Some("serve") {
        let config = ServerConfig::from_env();
        println!("Starting draughts server on http://{}", config.addr);
        return run_server(config).await;
    }

    println!("Draughts Arena - 10x10 Bot Match");
    println!("================================\n");

    let red = Box::new(RandomBot::new("RandomBot1".to_string()));
    let black = Box::new(RandomBot::new("RandomBot2".to_string()));

    let mut match_game = Match::new(red, black, MatchConfig::default(), true);
    let result = match_game.play();

    println!("\n================================");
    println!("Match Result:");
    match result {
        MatchResult::RedWins { winner_name, plies } => {
            println!("  {} wins as Red in {} plies!", winner_name, plies);
        }
        MatchResult::BlackWins { winner_name, plies } => {
            println!("  {} wins as Black in {} plies!", winner_name, plies);
        }
        MatchResult::Draw { plies } => {
            println!("  Draw after {} plies", plies);
        }
        MatchResult::IllegalMove { violator, winner } => {
            println!("  {} wins by illegal move (opponent: {})", winner, violator);
        }
    }
    println!("================================");
    Ok(())
}
