//! Bot module providing automatic Yatzy players with difficulty presets.
//!
//! Bots hold no state between decisions beyond their difficulty tier and
//! random source. The session asks the [`BotDecisionMaker`] for a short move
//! plan and feeds each move through the same validation a human's action
//! takes.
//!
//! ## Difficulty Presets
//!
//! ### Easy
//! - Strategic adjustments at half weight
//! - Swaps the best keep or category for another one 40% of the time
//!
//! ### Medium
//! - Full heuristic weight
//! - Swaps 10% of the time
//!
//! ### Hard
//! - Always takes the best candidate
//!
//! ## Example
//!
//! ```
//! use yatzy::bot::BotDecisionMaker;
//! use yatzy::game::entities::{Category, ScoreCard};
//! use yatzy::table::BotDifficulty;
//!
//! let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
//! let card = ScoreCard::default();
//! assert_eq!(
//!     bot.choose_category(&[6, 6, 6, 6, 6], &card, 0),
//!     Some(Category::Yatzy)
//! );
//! ```

pub mod decision;
pub mod models;

pub use decision::{BotDecisionConfig, BotDecisionMaker, BotView};
pub use models::DifficultyParams;
