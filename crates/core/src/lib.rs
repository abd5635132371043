//! Core game rules. Keep this crate free of IO and platform concerns.

pub mod board;
pub mod cards;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod game;
pub mod player;
pub mod rng;
pub mod store;

pub use board::*;
pub use cards::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use game::*;
pub use player::*;
pub use rng::*;
pub use store::*;
