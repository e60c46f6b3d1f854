use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::arena::drive_opponent;
use crate::board::{BOARD_SIZE, Color, Piece, Position, Rank};
use crate::bot::{Bot, RandomBot};
use crate::game::{GameError, GameState};
use crate::movegen::Move;
use crate::persistence::DEFAULT_SAVE_FILE;

/// Where the server listens and keeps its save file.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub save_path: PathBuf,
    /// Side played through the API; the other side is automated.
    pub human: Color,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: "127.0.0.1:3000".to_string(),
            save_path: PathBuf::from(DEFAULT_SAVE_FILE),
            human: Color::Red,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `DRAUGHTS_ADDR` and `DRAUGHTS_SAVE_PATH`.
    pub fn from_env() -> Self {
        let mut config = ServerConfig::default();
        if let Ok(addr) = std::env::var("DRAUGHTS_ADDR") {
            config.addr = addr;
        }
        if let Ok(path) = std::env::var("DRAUGHTS_SAVE_PATH") {
            config.save_path = PathBuf::from(path);
        }
        config
    }
}

#[derive(Clone)]
pub struct AppState {
    game: Arc<Mutex<WebGame>>,
    save_path: Arc<PathBuf>,
}

struct WebGame {
    state: GameState,
    human: Color,
    opponent: Box<dyn Bot>,
}

impl WebGame {
    /// Let the automated side move until it is the human's turn again.
    fn reply(&mut self) -> Result<usize, GameError> {
        let side = self.human.opponent();
        drive_opponent(&mut self.state, self.opponent.as_mut(), side)
    }
}

#[derive(Serialize, Deserialize, Default)]
pub struct NewGameRequest {
    #[serde(default)]
    human_side: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct MoveRequest {
    from_row: usize,
    from_col: usize,
    to_row: usize,
    to_col: usize,
}

#[derive(Serialize, Clone)]
pub struct MoveResponse {
    from_row: usize,
    from_col: usize,
    to_row: usize,
    to_col: usize,
}

#[derive(Serialize, Clone)]
pub struct SquareResponse {
    row: usize,
    col: usize,
}

#[derive(Serialize)]
pub struct GameResponse {
    board: Vec<Vec<String>>,
    to_move: String,
    human_side: String,
    must_capture: bool,
    capture_landings: Vec<SquareResponse>,
    legal_moves: Vec<MoveResponse>,
    red_pieces: usize,
    black_pieces: usize,
    winner: Option<String>,
    blocked: bool,
    message: String,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_opponent(config, Box::new(RandomBot::new("Random Bot".to_string())))
    }

    pub fn with_opponent(config: &ServerConfig, opponent: Box<dyn Bot>) -> Self {
        let game = WebGame {
            state: GameState::new(),
            human: config.human,
            opponent,
        };
        AppState {
            game: Arc::new(Mutex::new(game)),
            save_path: Arc::new(config.save_path.clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WebGame> {
        self.game.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn piece_to_string(piece: Option<Piece>) -> String {
    match piece {
        None => ".".to_string(),
        Some(Piece { color: Color::Red, rank: Rank::Soldier }) => "r".to_string(),
        Some(Piece { color: Color::Red, rank: Rank::King }) => "R".to_string(),
        Some(Piece { color: Color::Black, rank: Rank::Soldier }) => "b".to_string(),
        Some(Piece { color: Color::Black, rank: Rank::King }) => "B".to_string(),
    }
}

fn string_to_color(s: &str) -> Color {
    match s.to_lowercase().as_str() {
        "black" => Color::Black,
        _ => Color::Red,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn game_error_response(e: GameError) -> Response {
    let status = match e {
        GameError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, e.to_string())
}

fn game_response(game: &WebGame, message: String) -> GameResponse {
    let state = &game.state;

    let mut board = vec![vec![String::new(); BOARD_SIZE]; BOARD_SIZE];
    for (row, cells) in board.iter_mut().enumerate() {
        for (col, cell) in cells.iter_mut().enumerate() {
            *cell = piece_to_string(state.get_piece(Position::new(row, col)));
        }
    }

    // Only offer moves while it is the human's turn
    let legal_moves = if state.to_move() == game.human {
        state
            .legal_moves()
            .iter()
            .map(|m| MoveResponse {
                from_row: m.from.row,
                from_col: m.from.col,
                to_row: m.to.row,
                to_col: m.to.col,
            })
            .collect()
    } else {
        Vec::new()
    };

    GameResponse {
        board,
        to_move: state.to_move().to_string(),
        human_side: game.human.to_string(),
        must_capture: state.must_capture(),
        capture_landings: state
            .legal_capture_landings()
            .into_iter()
            .map(|p| SquareResponse { row: p.row, col: p.col })
            .collect(),
        legal_moves,
        red_pieces: state.live_count(Color::Red),
        black_pieces: state.live_count(Color::Black),
        winner: state.winner().map(|c| c.to_string()),
        blocked: state.is_blocked(),
        message,
    }
}

fn reply_message(game: &mut WebGame) -> Result<String, Response> {
    match game.reply() {
        Ok(0) => Ok("Your turn!".to_string()),
        Ok(n) => Ok(format!("{} replied with {} move(s)", game.opponent.name(), n)),
        Err(e) => {
            warn!(error = %e, "opponent move failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Opponent failed: {}", e),
            ))
        }
    }
}

#[axum::debug_handler]
async fn new_game(
    State(app_state): State<AppState>,
    Json(req): Json<NewGameRequest>,
) -> Response {
    let mut game = app_state.lock();
    if let Some(side) = req.human_side.as_deref() {
        game.human = string_to_color(side);
    }
    game.state = GameState::new();
    let human = game.human;
    game.opponent.game_start(human.opponent());

    match reply_message(&mut game) {
        Ok(message) => Json(game_response(&game, message)).into_response(),
        Err(response) => response,
    }
}

#[axum::debug_handler]
async fn make_move(State(app_state): State<AppState>, Json(req): Json<MoveRequest>) -> Response {
    let mut game = app_state.lock();

    if game.state.is_game_over() {
        return error_response(StatusCode::BAD_REQUEST, "Game is over".to_string());
    }
    if game.state.to_move() != game.human {
        return error_response(StatusCode::BAD_REQUEST, "Not your turn".to_string());
    }

    let player_move = Move::new(
        Position::new(req.from_row, req.from_col),
        Position::new(req.to_row, req.to_col),
    );
    let outcome = match game.state.make_move(player_move) {
        Ok(outcome) => outcome,
        Err(e) => return game_error_response(e),
    };
    game.opponent.notify_move(player_move);

    let message = if !outcome.turn_passed {
        "Keep capturing with the same piece".to_string()
    } else if let Some(winner) = game.state.winner() {
        format!("{} wins!", winner)
    } else {
        match reply_message(&mut game) {
            Ok(message) => message,
            Err(response) => return response,
        }
    };

    Json(game_response(&game, message)).into_response()
}

async fn undo(State(app_state): State<AppState>) -> Response {
    let mut game = app_state.lock();
    let human = game.human;
    let steps = match game.state.undo_for(human) {
        Ok(steps) => steps,
        Err(e) => return game_error_response(e),
    };
    // Undoing back to the opening hands the first move to the opponent again.
    if let Err(response) = reply_message(&mut game) {
        return response;
    }
    Json(game_response(&game, format!("Took back {} ply(s)", steps))).into_response()
}

async fn save(State(app_state): State<AppState>) -> Response {
    let game = app_state.lock();
    match game.state.save(app_state.save_path.as_path()) {
        Ok(()) => Json(game_response(&game, "Game saved".to_string())).into_response(),
        Err(e) => game_error_response(e),
    }
}

async fn load(State(app_state): State<AppState>) -> Response {
    let mut game = app_state.lock();
    if let Err(e) = game.state.load(app_state.save_path.as_path()) {
        return game_error_response(e);
    }
    match reply_message(&mut game) {
        Ok(_) => Json(game_response(&game, "Game loaded".to_string())).into_response(),
        Err(response) => response,
    }
}

async fn get_game_state(State(app_state): State<AppState>) -> Json<GameResponse> {
    let game = app_state.lock();
    Json(game_response(&game, String::new()))
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/new-game", post(new_game))
        .route("/api/move", post(make_move))
        .route("/api/undo", post(undo))
        .route("/api/save", post(save))
        .route("/api/load", post(load))
        .route("/api/game-state", get(get_game_state))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!(
        addr = %config.addr,
        save_path = %config.save_path.display(),
        human = %config.human,
        "web server running"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_config(name: &str) -> ServerConfig {
        ServerConfig {
            save_path: std::env::temp_dir().join(format!(
                "draughts-arena-web-{}-{}.txt",
                name,
                std::process::id()
            )),
            ..ServerConfig::default()
        }
    }

    fn test_app(config: &ServerConfig) -> Router {
        let opponent = Box::new(RandomBot::seeded("Opponent".to_string(), 5));
        router(AppState::with_opponent(config, opponent))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn move_body(from: (usize, usize), to: (usize, usize)) -> Value {
        json!({ "from_row": from.0, "from_col": from.1, "to_row": to.0, "to_col": to.1 })
    }

    #[tokio::test]
    async fn test_initial_game_state() {
        let app = test_app(&test_config("initial"));

        let request = Request::builder()
            .uri("/api/game-state")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["to_move"], "Red");
        assert_eq!(value["board"][0][1], "b");
        assert_eq!(value["board"][6][1], "r");
        assert_eq!(value["legal_moves"].as_array().unwrap().len(), 9);
        assert_eq!(value["must_capture"], false);
    }

    #[tokio::test]
    async fn test_move_gets_a_reply() {
        let app = test_app(&test_config("reply"));

        let (status, value) = send(&app, "POST", "/api/move", move_body((6, 1), (5, 2))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["to_move"], "Red");
        assert_eq!(value["board"][5][2], "r");
        assert_eq!(value["board"][6][1], ".");
    }

    #[tokio::test]
    async fn test_illegal_move_is_rejected() {
        let app = test_app(&test_config("illegal"));

        let (status, value) = send(&app, "POST", "/api/move", move_body((6, 1), (4, 1))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().starts_with("Illegal move"));
    }

    #[tokio::test]
    async fn test_undo_takes_back_move_and_reply() {
        let app = test_app(&test_config("undo"));

        let (status, _) = send(&app, "POST", "/api/undo", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(&app, "POST", "/api/move", move_body((6, 1), (5, 2))).await;
        let (status, value) = send(&app, "POST", "/api/undo", json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["to_move"], "Red");
        assert_eq!(value["board"][6][1], "r");
        assert_eq!(value["board"][5][2], ".");
    }

    #[tokio::test]
    async fn test_undo_as_black_keeps_the_game_playable() {
        let app = test_app(&test_config("undo-black"));
        send(&app, "POST", "/api/new-game", json!({ "human_side": "black" })).await;

        let (status, value) = send(&app, "POST", "/api/undo", json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["to_move"], "Black");
        assert_eq!(value["legal_moves"].as_array().unwrap().len(), 9);

        let (status, value) = send(&app, "POST", "/api/move", move_body((3, 0), (4, 1))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["to_move"], "Black");
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let config = test_config("save");
        let app = test_app(&config);

        send(&app, "POST", "/api/move", move_body((6, 1), (5, 2))).await;
        let (status, saved) = send(&app, "POST", "/api/save", json!({})).await;
        assert_eq!(status, StatusCode::OK);

        send(&app, "POST", "/api/new-game", json!({})).await;
        let (status, loaded) = send(&app, "POST", "/api/load", json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["board"], saved["board"]);
        assert_eq!(loaded["to_move"], saved["to_move"]);

        std::fs::remove_file(&config.save_path).unwrap();
    }

    #[tokio::test]
    async fn test_new_game_as_black_lets_opponent_open() {
        let app = test_app(&test_config("black"));

        let (status, value) = send(
            &app,
            "POST",
            "/api/new-game",
            json!({ "human_side": "black" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["human_side"], "Black");
        assert_eq!(value["to_move"], "Black");
        assert_eq!(value["legal_moves"].as_array().unwrap().len(), 9);
    }
}
