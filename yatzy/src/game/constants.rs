//! Fixed rules of the game and configuration defaults.

/// Dice thrown per roll.
pub const NUM_DICE: usize = 5;

/// Highest face on a die.
pub const MAX_FACE: u8 = 6;

/// Rolls available at the start of every turn.
pub const MAX_ROLLS: u8 = 3;

/// Scorable categories per participant.
pub const NUM_CATEGORIES: usize = 13;

/// Upper-section running total that unlocks the upper bonus.
pub const UPPER_BONUS_THRESHOLD: u32 = 63;

/// Points awarded once the upper threshold is reached.
pub const UPPER_BONUS: u32 = 35;

pub const FULL_HOUSE_SCORE: u32 = 25;
pub const SMALL_STRAIGHT_SCORE: u32 = 30;
pub const LARGE_STRAIGHT_SCORE: u32 = 40;
pub const YATZY_SCORE: u32 = 50;

/// Added to the Yatzy bonus slot for every repeat Yatzy.
pub const YATZY_REPEAT_BONUS: u32 = 100;

/// Prefix marking synthesized bot participant identifiers.
pub const BOT_PREFIX: &str = "bot_";

pub const DEFAULT_ROUNDS_PER_PARTICIPANT: u32 = 13;
pub const DEFAULT_TURN_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TABLE_CAPACITY: usize = 2;
pub const DEFAULT_BOT_ROUND_DELAY_MS: u64 = 750;

/// Upper bound on internal steps a bot may take in one round: three rolls,
/// a lock before each re-roll, one score and one joker resolution.
pub const MAX_BOT_STEPS_PER_ROUND: usize = 8;
