pub mod arena;
pub mod board;
pub mod bot;
pub mod capture;
pub mod game;
pub mod history;
pub mod movegen;
pub mod persistence;
pub mod web;

pub use arena::*;
pub use board::*;
pub use bot::*;
pub use capture::CaptureChain;
pub use game::*;
pub use movegen::{Jump, Move};
