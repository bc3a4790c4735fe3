use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use super::constants::{
    BOT_PREFIX, MAX_FACE, MAX_ROLLS, NUM_DICE, UPPER_BONUS, UPPER_BONUS_THRESHOLD,
    YATZY_REPEAT_BONUS,
};

/// Face values of the five dice, each in `1..=6`.
pub type Dice = [u8; NUM_DICE];

/// Bitmask over [`Category::ALL`]; bit `i` set means category `i` is open.
pub type CategoryMask = u16;

/// Identifier of a seated participant, resolved by the transport before
/// anything reaches the core.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_string())
    }

    /// Synthesized opponent for a table that only one human joined.
    pub fn bot_for_table(table_id: u64) -> Self {
        Self(format!("{BOT_PREFIX}{table_id}"))
    }

    /// Bots are recognized purely by their identifier tag.
    pub fn is_bot(&self) -> bool {
        self.0.starts_with(BOT_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for ParticipantId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// The thirteen scorable categories.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Category {
    Ones,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    ThreeOfAKind,
    FourOfAKind,
    FullHouse,
    SmallStraight,
    LargeStraight,
    Chance,
    Yatzy,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Self::Ones,
        Self::Twos,
        Self::Threes,
        Self::Fours,
        Self::Fives,
        Self::Sixes,
        Self::ThreeOfAKind,
        Self::FourOfAKind,
        Self::FullHouse,
        Self::SmallStraight,
        Self::LargeStraight,
        Self::Chance,
        Self::Yatzy,
    ];

    pub const UPPER: [Category; 6] = [
        Self::Ones,
        Self::Twos,
        Self::Threes,
        Self::Fours,
        Self::Fives,
        Self::Sixes,
    ];

    pub const LOWER: [Category; 7] = [
        Self::ThreeOfAKind,
        Self::FourOfAKind,
        Self::FullHouse,
        Self::SmallStraight,
        Self::LargeStraight,
        Self::Chance,
        Self::Yatzy,
    ];

    /// Position in [`Category::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bit(self) -> CategoryMask {
        1 << self.index()
    }

    pub fn is_upper(self) -> bool {
        self.face().is_some()
    }

    /// The die face an upper-section category counts.
    pub fn face(self) -> Option<u8> {
        match self {
            Self::Ones => Some(1),
            Self::Twos => Some(2),
            Self::Threes => Some(3),
            Self::Fours => Some(4),
            Self::Fives => Some(5),
            Self::Sixes => Some(6),
            _ => None,
        }
    }

    pub fn upper_for_face(face: u8) -> Option<Self> {
        match face {
            1..=MAX_FACE => Some(Self::UPPER[usize::from(face) - 1]),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.to_string() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A move a participant can make during their turn.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Move {
    Roll,
    /// Toggle the lock flag at each index.
    Lock(Vec<usize>),
    Score(Category),
    /// Resolve a pending joker with one of the offered categories.
    Joker(Category),
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Roll => "rolls".to_string(),
            Self::Lock(indices) => format!("toggles locks {indices:?}"),
            Self::Score(category) => format!("scores {category}"),
            Self::Joker(category) => format!("plays joker into {category}"),
        };
        write!(f, "{repr}")
    }
}

/// Offer made to a participant who rolled a repeat Yatzy whose natural
/// upper-section slot is already taken.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JokerPrompt {
    pub options: Vec<Category>,
    pub dice_value: u8,
}

/// Per-participant dice state.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayState {
    pub dice: Dice,
    pub locked_dice: [bool; NUM_DICE],
    pub rolls_left: u8,
    pub has_rolled_this_turn: bool,
    pub pending_joker: Option<JokerPrompt>,
}

impl Default for PlayState {
    fn default() -> Self {
        Self {
            dice: [1; NUM_DICE],
            locked_dice: [false; NUM_DICE],
            rolls_left: MAX_ROLLS,
            has_rolled_this_turn: false,
            pending_joker: None,
        }
    }
}

impl PlayState {
    /// Bookkeeping after any scoring action.
    pub fn end_turn(&mut self) {
        self.dice = [1; NUM_DICE];
        self.rolls_left = MAX_ROLLS;
        self.locked_dice = [false; NUM_DICE];
        self.has_rolled_this_turn = false;
        self.pending_joker = None;
    }
}

/// One participant's column on the scoreboard.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScoreCard {
    #[serde(flatten)]
    categories: BTreeMap<Category, Option<u32>>,
    #[serde(rename = "UpperBonus")]
    pub upper_bonus: Option<u32>,
    #[serde(rename = "YatzyBonus")]
    pub yatzy_bonus: Option<u32>,
}

impl Default for ScoreCard {
    fn default() -> Self {
        Self {
            categories: Category::ALL.into_iter().map(|c| (c, None)).collect(),
            upper_bonus: None,
            yatzy_bonus: None,
        }
    }
}

impl ScoreCard {
    pub fn get(&self, category: Category) -> Option<u32> {
        self.categories.get(&category).copied().flatten()
    }

    pub fn is_filled(&self, category: Category) -> bool {
        self.get(category).is_some()
    }

    /// Records a score. Returns `false` and leaves the card untouched if the
    /// category already holds a value.
    pub fn fill(&mut self, category: Category, points: u32) -> bool {
        let slot = self.categories.entry(category).or_insert(None);
        if slot.is_some() {
            return false;
        }
        *slot = Some(points);
        true
    }

    pub fn open_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| !self.is_filled(*c))
            .collect()
    }

    pub fn open_mask(&self) -> CategoryMask {
        self.open_categories()
            .into_iter()
            .fold(0, |mask, c| mask | c.bit())
    }

    pub fn is_complete(&self) -> bool {
        Category::ALL.into_iter().all(|c| self.is_filled(c))
    }

    pub fn upper_total(&self) -> u32 {
        Category::UPPER.into_iter().filter_map(|c| self.get(c)).sum()
    }

    pub fn upper_complete(&self) -> bool {
        Category::UPPER.into_iter().all(|c| self.is_filled(c))
    }

    /// Settles the upper bonus the first time the running upper total
    /// reaches the threshold, or to zero once the section is full without
    /// reaching it. A settled slot is never touched again.
    pub fn settle_upper_bonus(&mut self) -> bool {
        if self.upper_bonus.is_some() {
            return false;
        }
        if self.upper_total() >= UPPER_BONUS_THRESHOLD {
            self.upper_bonus = Some(UPPER_BONUS);
            true
        } else if self.upper_complete() {
            self.upper_bonus = Some(0);
            true
        } else {
            false
        }
    }

    pub fn add_yatzy_bonus(&mut self) {
        self.yatzy_bonus = Some(self.yatzy_bonus.unwrap_or(0) + YATZY_REPEAT_BONUS);
    }

    /// Sum of filled categories plus both bonus slots; unfilled counts as zero.
    pub fn total(&self) -> u32 {
        self.categories.values().flatten().sum::<u32>()
            + self.upper_bonus.unwrap_or(0)
            + self.yatzy_bonus.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_labels() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
        assert!("Bonus".parse::<Category>().is_err());
    }

    #[test]
    fn test_upper_for_face() {
        assert_eq!(Category::upper_for_face(5), Some(Category::Fives));
        assert_eq!(Category::upper_for_face(0), None);
        assert_eq!(Category::upper_for_face(7), None);
        assert!(Category::Sixes.is_upper());
        assert!(!Category::Chance.is_upper());
    }

    #[test]
    fn test_bot_ids_are_tagged() {
        assert!(ParticipantId::bot_for_table(3).is_bot());
        assert_eq!(ParticipantId::bot_for_table(3).as_str(), "bot_3");
        assert!(!ParticipantId::new("alice").is_bot());
    }

    #[test]
    fn test_filled_category_is_immutable() {
        let mut card = ScoreCard::default();
        assert!(card.fill(Category::Chance, 20));
        assert!(!card.fill(Category::Chance, 30));
        assert_eq!(card.get(Category::Chance), Some(20));
    }

    #[test]
    fn test_upper_bonus_settles_once() {
        let mut card = ScoreCard::default();
        card.fill(Category::Sixes, 30);
        card.fill(Category::Fives, 25);
        assert!(!card.settle_upper_bonus());
        card.fill(Category::Fours, 8);
        assert!(card.settle_upper_bonus());
        assert_eq!(card.upper_bonus, Some(UPPER_BONUS));
        card.fill(Category::Threes, 9);
        assert!(!card.settle_upper_bonus());
        assert_eq!(card.upper_bonus, Some(UPPER_BONUS));
    }

    #[test]
    fn test_upper_bonus_settles_to_zero_when_section_full() {
        let mut card = ScoreCard::default();
        for category in Category::UPPER {
            card.fill(category, 1);
        }
        assert!(card.settle_upper_bonus());
        assert_eq!(card.upper_bonus, Some(0));
    }

    #[test]
    fn test_total_includes_bonuses() {
        let mut card = ScoreCard::default();
        card.fill(Category::Yatzy, 50);
        card.add_yatzy_bonus();
        card.add_yatzy_bonus();
        card.upper_bonus = Some(35);
        assert_eq!(card.total(), 50 + 200 + 35);
    }

    #[test]
    fn test_open_mask_tracks_fills() {
        let mut card = ScoreCard::default();
        assert_eq!(card.open_mask().count_ones(), 13);
        card.fill(Category::Ones, 3);
        assert_eq!(card.open_mask() & Category::Ones.bit(), 0);
        assert_eq!(card.open_categories().len(), 12);
    }

    #[test]
    fn test_score_card_serializes_with_bonus_slots() {
        let card = ScoreCard::default();
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("Ones").unwrap().is_null());
        assert!(json.get("UpperBonus").unwrap().is_null());
        assert!(json.get("YatzyBonus").unwrap().is_null());
    }
}
