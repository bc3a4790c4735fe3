//! Bot decision-making logic with difficulty-based behavior.

use super::models::DifficultyParams;
use crate::game::{
    constants::{NUM_DICE, UPPER_BONUS, UPPER_BONUS_THRESHOLD, YATZY_SCORE},
    entities::{Category, CategoryMask, Dice, JokerPrompt, Move, ScoreCard},
    scoring::{face_counts, score, yatzy_face},
};
use crate::table::config::BotDifficulty;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

/// Configuration for the bot's heuristic weights.
///
/// # Examples
///
/// ```
/// use yatzy::bot::decision::BotDecisionConfig;
///
/// let config = BotDecisionConfig::default();
/// assert_eq!(config.straight_keep_bonus, 15.0);
/// ```
#[derive(Debug, Clone)]
pub struct BotDecisionConfig {
    /// Value of keeping all five dice; scaled by the fraction kept.
    pub kept_fraction_weight: f32,

    /// Bonus for keeping distinct values when three or more are distinct.
    pub straight_keep_bonus: f32,

    /// Penalty for re-rolling everything.
    pub reroll_all_penalty: f32,

    /// Reward per remaining roll for holding three or more of a kind
    /// and re-rolling the rest.
    pub yatzy_chase_per_roll: f32,

    /// Divisor applied to the remaining upper bonus gap.
    pub upper_gap_divisor: f32,

    /// Extra value for scoring a Yatzy into the Yatzy category.
    pub yatzy_category_bonus: f32,

    /// Penalty keeping Chance as a fallback.
    pub chance_penalty: f32,
}

impl Default for BotDecisionConfig {
    fn default() -> Self {
        Self {
            kept_fraction_weight: 10.0,
            straight_keep_bonus: 15.0,
            reroll_all_penalty: 5.0,
            yatzy_chase_per_roll: 20.0,
            upper_gap_divisor: 10.0,
            yatzy_category_bonus: 50.0,
            chance_penalty: 5.0,
        }
    }
}

/// Everything a bot may look at when deciding its next move.
#[derive(Debug, Clone)]
pub struct BotView<'a> {
    pub dice: Dice,
    pub locked_dice: [bool; NUM_DICE],
    pub rolls_left: u8,
    pub has_rolled_this_turn: bool,
    pub card: &'a ScoreCard,
    pub pending_joker: Option<&'a JokerPrompt>,
}

/// Bot decision maker
#[derive(Debug)]
pub struct BotDecisionMaker {
    /// Random number generator
    rng: StdRng,
    difficulty: BotDifficulty,
    params: DifficultyParams,
    config: BotDecisionConfig,
}

impl BotDecisionMaker {
    /// Create a new decision maker with default config
    pub fn new(difficulty: BotDifficulty) -> Self {
        Self::with_rng(difficulty, BotDecisionConfig::default(), StdRng::from_os_rng())
    }

    /// Create a decision maker whose choices are reproducible
    pub fn seeded(difficulty: BotDifficulty, seed: u64) -> Self {
        Self::with_rng(
            difficulty,
            BotDecisionConfig::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn with_rng(difficulty: BotDifficulty, config: BotDecisionConfig, rng: StdRng) -> Self {
        Self {
            rng,
            difficulty,
            params: DifficultyParams::from_difficulty(difficulty),
            config,
        }
    }

    pub fn difficulty(&self) -> BotDifficulty {
        self.difficulty
    }

    /// Plan the bot's next moves for its current dice.
    ///
    /// A plan is either a single move or a lock toggle immediately followed
    /// by the re-roll it prepares, so the keep decision is made once per roll.
    pub fn plan(&mut self, view: &BotView) -> Vec<Move> {
        let upper = view.card.upper_total();

        if let Some(prompt) = view.pending_joker {
            return self
                .choose_from(&view.dice, &prompt.options, upper)
                .map(Move::Joker)
                .into_iter()
                .collect();
        }

        if !view.has_rolled_this_turn {
            return vec![Move::Roll];
        }

        if view.rolls_left > 0 {
            let keep = self.decide_keepers(&view.dice, view.rolls_left, view.card.open_mask(), upper);
            if keep.len() < NUM_DICE {
                let wanted = lock_mask_for(&view.dice, &keep);
                let toggles: Vec<usize> = (0..NUM_DICE)
                    .filter(|&i| wanted[i] != view.locked_dice[i])
                    .collect();
                return if toggles.is_empty() {
                    vec![Move::Roll]
                } else {
                    vec![Move::Lock(toggles), Move::Roll]
                };
            }
        }

        self.choose_category(&view.dice, view.card, upper)
            .map(Move::Score)
            .into_iter()
            .collect()
    }

    /// Decide which dice values to hold before the next roll.
    ///
    /// # Arguments
    ///
    /// * `dice` - Current dice
    /// * `rolls_left` - Rolls remaining this turn
    /// * `open` - Open categories of the bot's score card
    /// * `upper_score` - Running upper-section total
    ///
    /// # Returns
    ///
    /// * `Vec<u8>` - Values to keep; empty when no rolls are left
    pub fn decide_keepers(
        &mut self,
        dice: &Dice,
        rolls_left: u8,
        open: CategoryMask,
        upper_score: u32,
    ) -> Vec<u8> {
        if rolls_left == 0 {
            return Vec::new();
        }

        let counts = face_counts(dice);
        let mut candidates: Vec<(Vec<u8>, f32)> = Vec::with_capacity(4);

        let all = dice.to_vec();
        let ev = self.estimate_keep(&all, rolls_left, open, upper_score)
            + self.made_hand_value(dice, open);
        candidates.push((all, ev));

        // Highest count wins, ties go to the higher face.
        let (group_face, _) = (1..counts.len())
            .map(|face| (face as u8, counts[face]))
            .max_by_key(|&(face, count)| (count, face))
            .unwrap_or((1, 0));
        let group: Vec<u8> = dice.iter().copied().filter(|&d| d == group_face).collect();
        let ev = self.estimate_keep(&group, rolls_left, open, upper_score);
        candidates.push((group, ev));

        let distinct: Vec<u8> = (1..counts.len())
            .filter(|&face| counts[face] > 0)
            .map(|face| face as u8)
            .collect();
        if distinct.len() >= 3 {
            let ev = self.estimate_keep(&distinct, rolls_left, open, upper_score)
                + self.config.straight_keep_bonus;
            candidates.push((distinct, ev));
        }

        let ev = self.estimate_keep(&[], rolls_left, open, upper_score)
            - self.config.reroll_all_penalty;
        candidates.push((Vec::new(), ev));

        let best = best_index(candidates.iter().map(|(_, ev)| *ev));
        let pick = self.maybe_substitute(best, candidates.len());
        candidates.swap_remove(pick).0
    }

    /// Choose the open category to score the current dice in.
    pub fn choose_category(
        &mut self,
        dice: &Dice,
        card: &ScoreCard,
        upper_score: u32,
    ) -> Option<Category> {
        self.choose_from(dice, &card.open_categories(), upper_score)
    }

    /// Choose among an explicit set of categories.
    pub fn choose_from(
        &mut self,
        dice: &Dice,
        options: &[Category],
        upper_score: u32,
    ) -> Option<Category> {
        if options.is_empty() {
            return None;
        }
        let best = best_index(
            options
                .iter()
                .map(|&category| self.category_value(dice, category, upper_score)),
        );
        let pick = self.maybe_substitute(best, options.len());
        Some(options[pick])
    }

    /// Heuristic value of holding `keep` for the next roll.
    fn estimate_keep(&self, keep: &[u8], rolls_left: u8, open: CategoryMask, upper_score: u32) -> f32 {
        let weight = self.params.heuristic_weight;
        let mut ev = keep.len() as f32 / NUM_DICE as f32 * self.config.kept_fraction_weight;

        let counts = face_counts(keep);
        let (face, count) = (1..counts.len())
            .map(|face| (face as u8, counts[face]))
            .max_by_key(|&(face, count)| (count, face))
            .unwrap_or((1, 0));

        let face_open = Category::upper_for_face(face).is_some_and(|c| open & c.bit() != 0);
        if count > 0 && face_open && upper_score < UPPER_BONUS_THRESHOLD {
            let gap = (UPPER_BONUS_THRESHOLD - upper_score) as f32;
            ev += weight * gap / self.config.upper_gap_divisor * (f32::from(count) / NUM_DICE as f32);
        }

        // Only a pure group with dice left to re-roll is a Yatzy chase.
        let pure_group = keep.len() == usize::from(count);
        if count >= 3 && usize::from(count) < NUM_DICE && pure_group {
            ev += weight * self.config.yatzy_chase_per_roll * f32::from(rolls_left);
        }

        ev
    }

    /// Points already locked in by the full set of dice.
    fn made_hand_value(&self, dice: &Dice, open: CategoryMask) -> f32 {
        if yatzy_face(dice).is_some() {
            return YATZY_SCORE as f32 + self.config.yatzy_category_bonus;
        }
        [
            Category::FullHouse,
            Category::SmallStraight,
            Category::LargeStraight,
        ]
        .into_iter()
        .filter(|c| open & c.bit() != 0)
        .map(|c| score(dice, c))
        .max()
        .unwrap_or(0) as f32
    }

    /// Immediate points plus strategic adjustments for one category.
    fn category_value(&self, dice: &Dice, category: Category, upper_score: u32) -> f32 {
        let weight = self.params.heuristic_weight;
        let points = score(dice, category);
        let mut value = points as f32;

        if category.is_upper() {
            let new_upper = upper_score + points;
            if new_upper >= UPPER_BONUS_THRESHOLD && upper_score < UPPER_BONUS_THRESHOLD {
                value += weight * UPPER_BONUS as f32;
            } else if new_upper < UPPER_BONUS_THRESHOLD {
                value += weight * (UPPER_BONUS_THRESHOLD - new_upper) as f32
                    / self.config.upper_gap_divisor;
            }
        } else if category == Category::Yatzy && points > 0 {
            value += weight * self.config.yatzy_category_bonus;
        } else if category == Category::Chance {
            value -= weight * self.config.chance_penalty;
        }

        value
    }

    /// Swap the best index for a random other one at the difficulty's rate.
    fn maybe_substitute(&mut self, best: usize, len: usize) -> usize {
        if len < 2 || self.params.substitution_rate <= 0.0 {
            return best;
        }
        if !self.rng.random_bool(self.params.substitution_rate) {
            return best;
        }
        let others: Vec<usize> = (0..len).filter(|&i| i != best).collect();
        others.choose(&mut self.rng).copied().unwrap_or(best)
    }
}

/// First index holding the maximum value.
fn best_index(values: impl Iterator<Item = f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, value) in values.enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

/// Lock flags that hold exactly the values in `keep`.
fn lock_mask_for(dice: &Dice, keep: &[u8]) -> [bool; NUM_DICE] {
    let mut mask = [false; NUM_DICE];
    for &value in keep {
        if let Some(i) = (0..NUM_DICE).find(|&i| !mask[i] && dice[i] == value) {
            mask[i] = true;
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_with(filled: &[(Category, u32)]) -> ScoreCard {
        let mut card = ScoreCard::default();
        for &(category, points) in filled {
            card.fill(category, points);
        }
        card
    }

    #[test]
    fn test_no_keepers_without_rolls() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let keep = bot.decide_keepers(&[6, 6, 6, 2, 1], 0, 0x1fff, 0);
        assert!(keep.is_empty());
    }

    #[test]
    fn test_hard_bot_holds_three_of_a_kind() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let keep = bot.decide_keepers(&[6, 6, 6, 2, 1], 2, 0x1fff, 0);
        assert_eq!(keep, vec![6, 6, 6]);
    }

    #[test]
    fn test_made_straight_is_kept() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let keep = bot.decide_keepers(&[2, 3, 4, 5, 6], 2, 0x1fff, 0);
        assert_eq!(keep, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_hard_bot_scores_sixes_yatzy_in_yatzy() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let card = ScoreCard::default();
        let choice = bot.choose_category(&[6, 6, 6, 6, 6], &card, 0);
        assert_eq!(choice, Some(Category::Yatzy));
    }

    #[test]
    fn test_hard_bot_prefers_closing_upper_bonus() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        // 60 already in the upper section; Fives closes the gap.
        let card = card_with(&[
            (Category::Sixes, 24),
            (Category::Fours, 16),
            (Category::Threes, 12),
            (Category::Twos, 8),
        ]);
        let choice = bot.choose_category(&[5, 5, 1, 2, 3], &card, 60);
        assert_eq!(choice, Some(Category::Fives));
    }

    #[test]
    fn test_chance_is_a_fallback() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let card = card_with(&[]);
        let choice = bot.choose_from(&[2, 2, 3, 3, 3], &[Category::Chance, Category::FullHouse], 0);
        assert_eq!(choice, Some(Category::FullHouse));
        assert!(bot.choose_category(&[1, 1, 1, 1, 1], &card, 0).is_some());
    }

    #[test]
    fn test_hard_bot_is_deterministic() {
        let card = ScoreCard::default();
        for seed in 0..50 {
            let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, seed);
            assert_eq!(
                bot.choose_from(&[6, 6, 6, 6, 6], &[Category::Sixes, Category::Ones], 0),
                Some(Category::Sixes)
            );
            assert_eq!(bot.choose_category(&[6, 6, 6, 6, 6], &card, 0), Some(Category::Yatzy));
        }
    }

    #[test]
    fn test_easy_bot_substitutes_about_forty_percent() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Easy, 42);
        let options = [Category::Sixes, Category::Ones];

        let trials = 1000;
        let mut non_optimal = 0;
        for _ in 0..trials {
            if bot.choose_from(&[6, 6, 6, 6, 6], &options, 0) == Some(Category::Ones) {
                non_optimal += 1;
            }
        }

        assert!(
            (300..=500).contains(&non_optimal),
            "Easy bot picked the worse option {} times out of {} (expected ~400)",
            non_optimal,
            trials
        );
    }

    #[test]
    fn test_medium_bot_rarely_substitutes() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Medium, 42);
        let options = [Category::Sixes, Category::Ones];

        let mut non_optimal = 0;
        for _ in 0..1000 {
            if bot.choose_from(&[6, 6, 6, 6, 6], &options, 0) == Some(Category::Ones) {
                non_optimal += 1;
            }
        }

        assert!(
            (40..=170).contains(&non_optimal),
            "Medium bot picked the worse option {} times (expected ~100)",
            non_optimal
        );
    }

    #[test]
    fn test_plan_rolls_first() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let card = ScoreCard::default();
        let view = BotView {
            dice: [1; NUM_DICE],
            locked_dice: [false; NUM_DICE],
            rolls_left: 3,
            has_rolled_this_turn: false,
            card: &card,
            pending_joker: None,
        };
        assert_eq!(bot.plan(&view), vec![Move::Roll]);
    }

    #[test]
    fn test_plan_locks_then_rolls() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let card = ScoreCard::default();
        let view = BotView {
            dice: [2, 6, 1, 6, 6],
            locked_dice: [false; NUM_DICE],
            rolls_left: 2,
            has_rolled_this_turn: true,
            card: &card,
            pending_joker: None,
        };
        assert_eq!(bot.plan(&view), vec![Move::Lock(vec![1, 3, 4]), Move::Roll]);
    }

    #[test]
    fn test_plan_scores_when_out_of_rolls() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let card = ScoreCard::default();
        let view = BotView {
            dice: [2, 3, 4, 5, 6],
            locked_dice: [true; NUM_DICE],
            rolls_left: 0,
            has_rolled_this_turn: true,
            card: &card,
            pending_joker: None,
        };
        assert_eq!(bot.plan(&view), vec![Move::Score(Category::LargeStraight)]);
    }

    #[test]
    fn test_plan_resolves_pending_joker() {
        let mut bot = BotDecisionMaker::seeded(BotDifficulty::Hard, 1);
        let card = ScoreCard::default();
        let prompt = JokerPrompt {
            options: vec![Category::Chance, Category::FourOfAKind],
            dice_value: 4,
        };
        let view = BotView {
            dice: [4; NUM_DICE],
            locked_dice: [false; NUM_DICE],
            rolls_left: 2,
            has_rolled_this_turn: true,
            card: &card,
            pending_joker: Some(&prompt),
        };
        assert_eq!(bot.plan(&view), vec![Move::Joker(Category::FourOfAKind)]);
    }

    #[test]
    fn test_lock_mask_handles_duplicates() {
        assert_eq!(
            lock_mask_for(&[3, 1, 3, 3, 2], &[3, 3]),
            [true, false, true, false, false]
        );
    }
}
