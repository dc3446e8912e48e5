//! # riverrun-engine: Poker Hand Engine Core
//!
//! A deterministic, synchronous engine that runs one poker hand at a time
//! for a single table: deal, betting, showdown and side pots, across
//! Texas Hold'em, Omaha (high and hi-lo), Seven-Card Stud (high and hi-lo)
//! and Five-Card Stud, in no-limit or pot-limit. All-in confrontations can
//! be settled over several independent boards ("run it twice").
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation and the `"Ah"` / `"10c"` text codec
//! - [`deck`] - Shuffling, dealing and rabbit-hunt previews
//! - [`hand`] - High and eight-or-better low hand evaluation
//! - [`variant`] - Per-variant staging, dealing and hand selection
//! - [`betting`] - No-limit / pot-limit betting arithmetic
//! - [`pot`] - Side-pot construction and deterministic distribution
//! - [`game`] - Stage sequencing, turn order and button rotation
//! - [`run_it_twice`] - Multi-board settlement
//! - [`engine`] - The orchestrator owning the table state
//! - [`history`] - In-memory hand records
//! - [`config`] - Table configuration and TOML loading
//! - [`errors`] - Error types for engine operations
//!
//! ## Quick Start
//!
//! ```rust
//! use riverrun_engine::config::TableConfig;
//! use riverrun_engine::engine::PokerEngine;
//! use riverrun_engine::player::{PlayerAction, SeatedPlayer};
//!
//! let config = TableConfig::new("t1", 5, 10).with_seed(42);
//! let seats = vec![
//!     SeatedPlayer::new("a", "A", 500, 0),
//!     SeatedPlayer::new("b", "B", 500, 1),
//!     SeatedPlayer::new("c", "C", 500, 2),
//! ];
//! let mut engine = PokerEngine::new(config, seats).unwrap();
//! engine.start_new_hand().unwrap();
//!
//! while let Some(actor) = engine.get_state().active_player.clone() {
//!     let legal = engine.legal_actions(&actor).unwrap();
//!     let action = if legal.can_check {
//!         PlayerAction::check(actor)
//!     } else {
//!         PlayerAction::call(actor)
//!     };
//!     engine.handle_action(action).unwrap();
//! }
//! assert_eq!(engine.get_state().total_chips(), 1500);
//! ```
//!
//! ## Card Text
//!
//! ```rust
//! use riverrun_engine::cards::parse_cards;
//! use riverrun_engine::hand::evaluate_hand;
//!
//! let cards = parse_cards("Ah Kh Qh Jh 10h 2c 3d").unwrap();
//! assert_eq!(evaluate_hand(&cards).describe(), "Royal Flush");
//! ```

pub mod betting;
pub mod cards;
pub mod config;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod game;
pub mod hand;
pub mod history;
pub mod player;
pub mod pot;
pub mod run_it_twice;
pub mod table;
pub mod variant;

pub use engine::PokerEngine;
pub use errors::{EngineFault, GameError, GameResult};
