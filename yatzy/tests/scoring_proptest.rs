/// Property-based tests for scoring and session rules using proptest
///
/// These tests check the scoring table against its definitions for every
/// possible roll, and throw arbitrary action sequences (including malformed
/// ones) at a live session to check that its invariants always hold.
use proptest::prelude::*;
use yatzy::{
    Category, GameSession, MoveRequest, ParticipantId, SessionConfig,
    bot::BotDecisionMaker,
    entities::Dice,
    game::dice::RandomDice,
    messages::{MoveKind, PacketType},
    scoring::{face_counts, score, sum},
    table::{BotDifficulty, TurnMode},
};

// Strategy to generate five valid die faces
fn dice_strategy() -> impl Strategy<Value = Dice> {
    prop::array::uniform5(1u8..=6)
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

// Raw wire-level actions, malformed indices and labels included
fn request_strategy() -> impl Strategy<Value = MoveRequest> {
    let indices = prop::option::of(prop::collection::vec(-2i64..8, 0..6));
    let label = prop::option::of(prop_oneof![
        category_strategy().prop_map(|c| c.to_string()),
        Just("Bogus".to_string()),
    ]);
    let action = prop_oneof![
        4 => Just(MoveKind::Roll),
        2 => Just(MoveKind::Lock),
        3 => Just(MoveKind::Score),
        1 => Just(MoveKind::Joker),
        1 => Just(MoveKind::Unknown),
    ];
    (action, indices, label).prop_map(|(action, dice_indices, category)| MoveRequest {
        packet: PacketType::Move,
        action,
        dice_indices,
        category,
    })
}

fn session(mode: TurnMode, seed: u64) -> GameSession {
    let config = SessionConfig {
        turn_mode: mode,
        ..Default::default()
    };
    let mut session = GameSession::from_parts(
        vec![ParticipantId::new("alice"), ParticipantId::new("bob")],
        config,
        Box::new(RandomDice::seeded(seed)),
        BotDecisionMaker::seeded(BotDifficulty::Medium, seed),
    )
    .unwrap();
    session.start();
    session
}

proptest! {
    #[test]
    fn test_upper_categories_count_their_face(dice in dice_strategy()) {
        let counts = face_counts(&dice);
        for category in Category::UPPER {
            let face = category.face().unwrap();
            prop_assert_eq!(
                score(&dice, category),
                u32::from(counts[usize::from(face)]) * u32::from(face)
            );
        }
        let upper: u32 = Category::UPPER.iter().map(|c| score(&dice, *c)).sum();
        prop_assert_eq!(upper, sum(&dice));
    }

    #[test]
    fn test_scores_stay_in_range(dice in dice_strategy(), category in category_strategy()) {
        let points = score(&dice, category);
        prop_assert!(points <= 50);
        prop_assert_eq!(score(&dice, Category::Chance), sum(&dice));
        prop_assert!((5..=30).contains(&sum(&dice)));
    }

    #[test]
    fn test_stronger_hands_imply_weaker_ones(dice in dice_strategy()) {
        if score(&dice, Category::Yatzy) == 50 {
            prop_assert_eq!(score(&dice, Category::FourOfAKind), sum(&dice));
        }
        if score(&dice, Category::FourOfAKind) > 0 {
            prop_assert_eq!(score(&dice, Category::ThreeOfAKind), sum(&dice));
        }
        if score(&dice, Category::LargeStraight) > 0 {
            prop_assert_eq!(score(&dice, Category::SmallStraight), 30);
        }
        if score(&dice, Category::FullHouse) > 0 {
            prop_assert_eq!(score(&dice, Category::ThreeOfAKind), sum(&dice));
            prop_assert_eq!(score(&dice, Category::Yatzy), 0);
        }
    }

    #[test]
    fn test_score_ignores_dice_order(dice in dice_strategy(), category in category_strategy()) {
        let mut sorted = dice;
        sorted.sort_unstable();
        prop_assert_eq!(score(&dice, category), score(&sorted, category));
    }

    #[test]
    fn test_session_invariants_hold_under_arbitrary_actions(
        seed in any::<u64>(),
        independent in any::<bool>(),
        requests in prop::collection::vec(request_strategy(), 1..200),
    ) {
        let mode = if independent { TurnMode::Independent } else { TurnMode::Rotation };
        let mut session = session(mode, seed);
        let names = [ParticipantId::new("alice"), ParticipantId::new("bob")];

        for (step, request) in requests.iter().enumerate() {
            let actor = match session.current_turn() {
                Some(holder) => holder.clone(),
                None => names[step % 2].clone(),
            };
            let before_card = session.score_card(&actor).cloned().unwrap();
            let before_play = session.play_state(&actor).cloned();

            let accepted = session.apply_action(&actor, request);
            let after_card = session.score_card(&actor).cloned().unwrap();

            // Filled categories never change.
            for category in Category::ALL {
                if let Some(points) = before_card.get(category) {
                    prop_assert_eq!(after_card.get(category), Some(points));
                }
            }
            if !accepted {
                prop_assert_eq!(&before_card, &after_card);
                prop_assert_eq!(before_play.as_ref(), session.play_state(&actor));
            }

            if let (Some(before), Some(after)) = (before_play, session.play_state(&actor)) {
                prop_assert!(after.rolls_left <= 3);
                prop_assert!(after.dice.iter().all(|d| (1..=6).contains(d)));
                if accepted && request.action == MoveKind::Roll {
                    for i in 0..5 {
                        if before.locked_dice[i] {
                            prop_assert_eq!(before.dice[i], after.dice[i]);
                        }
                    }
                }
            }

            for name in &names {
                prop_assert!(session.rounds_completed(name) <= 13);
                let card = session.score_card(name).unwrap();
                prop_assert_eq!(session.total_for(name), Some(card.total()));
            }

            if session.is_finished() {
                break;
            }
        }
    }
}
