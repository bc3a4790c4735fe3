//! Pure scoring functions: dice and a category in, points out.

use super::{
    constants::{
        FULL_HOUSE_SCORE, LARGE_STRAIGHT_SCORE, MAX_FACE, SMALL_STRAIGHT_SCORE, YATZY_SCORE,
    },
    entities::{Category, Dice},
};

/// Count of each face, indexed by face value (index 0 unused).
#[must_use]
pub fn face_counts(dice: &[u8]) -> [u8; MAX_FACE as usize + 1] {
    let mut counts = [0; MAX_FACE as usize + 1];
    for &die in dice {
        if let Some(count) = counts.get_mut(usize::from(die)) {
            *count += 1;
        }
    }
    counts
}

#[must_use]
pub fn sum(dice: &[u8]) -> u32 {
    dice.iter().map(|&d| u32::from(d)).sum()
}

/// The face shown by all five dice, if they match.
#[must_use]
pub fn yatzy_face(dice: &Dice) -> Option<u8> {
    let first = dice[0];
    dice.iter().all(|&d| d == first).then_some(first)
}

fn has_run(counts: &[u8], len: usize) -> bool {
    counts[1..]
        .windows(len)
        .any(|window| window.iter().all(|&c| c > 0))
}

/// Points `dice` would earn in `category`.
#[must_use]
pub fn score(dice: &Dice, category: Category) -> u32 {
    let counts = face_counts(dice);
    let max_count = counts.iter().copied().max().unwrap_or(0);
    match category {
        Category::Ones
        | Category::Twos
        | Category::Threes
        | Category::Fours
        | Category::Fives
        | Category::Sixes => {
            let face = category.face().unwrap_or(0);
            u32::from(counts[usize::from(face)]) * u32::from(face)
        }
        Category::ThreeOfAKind if max_count >= 3 => sum(dice),
        Category::FourOfAKind if max_count >= 4 => sum(dice),
        Category::FullHouse if counts.contains(&3) && counts.contains(&2) => FULL_HOUSE_SCORE,
        Category::SmallStraight if has_run(&counts, 4) => SMALL_STRAIGHT_SCORE,
        Category::LargeStraight if has_run(&counts, 5) => LARGE_STRAIGHT_SCORE,
        Category::Chance => sum(dice),
        Category::Yatzy if max_count == 5 => YATZY_SCORE,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sixes() {
        let dice = [6, 6, 6, 6, 6];
        assert_eq!(score(&dice, Category::Sixes), 30);
        assert_eq!(score(&dice, Category::Yatzy), 50);
        assert_eq!(score(&dice, Category::Chance), 30);
        assert_eq!(score(&dice, Category::ThreeOfAKind), 30);
        assert_eq!(score(&dice, Category::FourOfAKind), 30);
        assert_eq!(score(&dice, Category::FullHouse), 0);
        assert_eq!(score(&dice, Category::Ones), 0);
    }

    #[test]
    fn test_upper_section_counts_matching_faces() {
        let dice = [5, 5, 1, 2, 3];
        assert_eq!(score(&dice, Category::Fives), 10);
        assert_eq!(score(&dice, Category::Ones), 1);
        assert_eq!(score(&dice, Category::Fours), 0);
    }

    #[test]
    fn test_of_a_kind() {
        assert_eq!(score(&[3, 3, 3, 4, 5], Category::ThreeOfAKind), 18);
        assert_eq!(score(&[3, 3, 3, 4, 5], Category::FourOfAKind), 0);
        assert_eq!(score(&[2, 2, 2, 2, 6], Category::FourOfAKind), 14);
    }

    #[test]
    fn test_full_house() {
        assert_eq!(score(&[2, 2, 3, 3, 3], Category::FullHouse), 25);
        assert_eq!(score(&[2, 2, 3, 3, 4], Category::FullHouse), 0);
    }

    #[test]
    fn test_straights() {
        assert_eq!(score(&[1, 2, 3, 4, 6], Category::SmallStraight), 30);
        assert_eq!(score(&[3, 4, 5, 6, 6], Category::SmallStraight), 30);
        assert_eq!(score(&[1, 2, 3, 5, 6], Category::SmallStraight), 0);
        assert_eq!(score(&[2, 3, 4, 5, 6], Category::LargeStraight), 40);
        assert_eq!(score(&[5, 4, 3, 2, 1], Category::LargeStraight), 40);
        assert_eq!(score(&[1, 2, 3, 4, 4], Category::LargeStraight), 0);
        assert_eq!(score(&[2, 3, 4, 5, 6], Category::SmallStraight), 30);
    }

    #[test]
    fn test_yatzy_face() {
        assert_eq!(yatzy_face(&[4, 4, 4, 4, 4]), Some(4));
        assert_eq!(yatzy_face(&[4, 4, 4, 4, 1]), None);
    }
}
