/// Integration tests for complete game sessions
///
/// These tests drive sessions end to end through the public action
/// interface: full games, bots in both turn modes, leaves and timeouts.
use yatzy::{
    Category, Dispatch, GameSession, MoveRequest, ParticipantId, ServerMessage, SessionConfig,
    bot::BotDecisionMaker,
    game::dice::{LoadedDice, RandomDice},
    table::{BotDifficulty, TurnMode},
};

fn id(name: &str) -> ParticipantId {
    ParticipantId::new(name)
}

fn seeded_session(names: &[&str], config: SessionConfig, seed: u64) -> GameSession {
    let mut session = GameSession::from_parts(
        names.iter().map(|n| id(n)).collect(),
        config,
        Box::new(RandomDice::seeded(seed)),
        BotDecisionMaker::seeded(BotDifficulty::Hard, seed),
    )
    .unwrap();
    session.start();
    session
}

/// Roll once and score the first open category.
fn play_simple_turn(session: &mut GameSession, who: &ParticipantId) {
    assert!(session.apply_action(who, &MoveRequest::roll()));
    if let Some(prompt) = session.play_state(who).and_then(|s| s.pending_joker.clone()) {
        panic!("unexpected pending joker {prompt:?}");
    }
    let category = session.score_card(who).unwrap().open_categories()[0];
    assert!(session.apply_action(who, &MoveRequest::score(category)));
    if let Some(prompt) = session.play_state(who).and_then(|s| s.pending_joker.clone()) {
        assert!(session.apply_action(who, &MoveRequest::joker(prompt.options[0])));
    }
}

#[test]
fn test_full_rotation_game_between_humans() {
    let mut session = seeded_session(&["alice", "bob"], SessionConfig::default(), 11);
    let alice = id("alice");
    let bob = id("bob");

    let mut turns = 0;
    while !session.is_finished() {
        let holder = session.current_turn().cloned().unwrap();
        // Repeat Yatzys can auto-fill a different slot, so just play on.
        if session.score_card(&holder).unwrap().open_categories().is_empty() {
            break;
        }
        play_simple_turn(&mut session, &holder);
        turns += 1;
        assert!(turns <= 26, "game should end after 13 rounds each");
    }

    assert!(session.is_finished());
    assert_eq!(session.rounds_completed(&alice), 13);
    assert_eq!(session.rounds_completed(&bob), 13);
    assert!(session.score_card(&alice).unwrap().is_complete());

    let a = session.total_for(&alice).unwrap();
    let b = session.total_for(&bob).unwrap();
    let expected = match a.cmp(&b) {
        std::cmp::Ordering::Greater => "alice",
        std::cmp::Ordering::Less => "bob",
        std::cmp::Ordering::Equal => "",
    };
    assert_eq!(session.winner(), Some(expected));

    let outbox = session.drain_outbox();
    assert_eq!(outbox.back(), Some(&Dispatch::Finish(expected.to_string())));
    assert!(!session.apply_action(&alice, &MoveRequest::roll()));
}

#[test]
fn test_rotation_game_against_bot_runs_to_completion() {
    let mut session = seeded_session(&["alice", "bot_1"], SessionConfig::default(), 5);
    let alice = id("alice");
    let bot = id("bot_1");

    for round in 1..=13 {
        assert_eq!(session.current_turn(), Some(&alice));
        play_simple_turn(&mut session, &alice);
        assert_eq!(session.rounds_completed(&bot), round);
    }

    assert!(session.is_finished());
    assert!(session.score_card(&bot).unwrap().is_complete());
    let card = session.score_card(&bot).unwrap();
    assert!(card.upper_bonus.is_some(), "upper bonus settles once the section is full");
}

#[test]
fn test_independent_bots_play_at_their_own_pace() {
    let config = SessionConfig {
        turn_mode: TurnMode::Independent,
        rounds_per_participant: 5,
        ..Default::default()
    };
    let mut session = seeded_session(&["alice", "bot_1"], config, 3);
    let alice = id("alice");
    let bot = id("bot_1");

    for _ in 0..5 {
        assert!(session.run_bot_round(&bot));
    }
    assert_eq!(session.rounds_completed(&bot), 5);
    assert!(session.pending_bots().is_empty());
    assert!(!session.run_bot_round(&bot));
    assert!(!session.is_finished());

    for _ in 0..5 {
        play_simple_turn(&mut session, &alice);
    }
    assert!(session.is_finished());
}

#[test]
fn test_disconnect_in_two_player_game_awards_remaining() {
    let mut session = seeded_session(&["alice", "bob"], SessionConfig::default(), 9);
    let alice = id("alice");
    let bob = id("bob");
    play_simple_turn(&mut session, &alice);
    session.drain_outbox();

    assert!(session.remove_participant(&bob));
    assert_eq!(session.winner(), Some("alice"));
    let outbox: Vec<Dispatch> = session.drain_outbox().into();
    assert_eq!(
        outbox,
        vec![
            Dispatch::Broadcast(ServerMessage::GameOver {
                winner: "alice".to_string()
            }),
            Dispatch::Finish("alice".to_string()),
        ]
    );
    assert!(!session.apply_action(&alice, &MoveRequest::roll()));
}

#[test]
fn test_timeout_forfeits_turn_holder() {
    let config = SessionConfig {
        capacity: 3,
        ..Default::default()
    };
    let mut session = GameSession::from_parts(
        vec![id("alice"), id("bob"), id("carol")],
        config,
        Box::new(LoadedDice::new([6, 6, 6, 6, 5])),
        BotDecisionMaker::seeded(BotDifficulty::Hard, 0),
    )
    .unwrap();
    session.start();
    let alice = id("alice");

    assert!(session.apply_action(&alice, &MoveRequest::roll()));
    assert!(session.apply_action(&alice, &MoveRequest::score(Category::Sixes)));
    assert_eq!(session.current_turn(), Some(&id("bob")));

    // A timer armed for an earlier turn does nothing.
    assert!(!session.forfeit_turn(session.turn_epoch() - 1));
    assert!(!session.is_finished());

    // Bob forfeits; alice leads carol 24 to 0.
    assert!(session.forfeit_turn(session.turn_epoch()));
    assert_eq!(session.winner(), Some("alice"));
}

#[test]
fn test_locked_dice_survive_rerolls() {
    let mut session = GameSession::from_parts(
        vec![id("alice"), id("bob")],
        SessionConfig::default(),
        Box::new(LoadedDice::new([6, 2, 6, 3, 6, 1, 1, 4, 4, 5])),
        BotDecisionMaker::seeded(BotDifficulty::Hard, 0),
    )
    .unwrap();
    session.start();
    let alice = id("alice");

    session.apply_action(&alice, &MoveRequest::roll());
    session.apply_action(&alice, &MoveRequest::lock(&[0, 2, 4]));
    session.apply_action(&alice, &MoveRequest::roll());
    assert_eq!(session.play_state(&alice).unwrap().dice, [6, 1, 6, 1, 6]);
    session.apply_action(&alice, &MoveRequest::roll());
    assert_eq!(session.play_state(&alice).unwrap().dice, [6, 4, 6, 4, 6]);

    assert!(session.apply_action(&alice, &MoveRequest::score(Category::FullHouse)));
    assert_eq!(
        session.score_card(&alice).unwrap().get(Category::FullHouse),
        Some(25)
    );
}

#[test]
fn test_easy_bot_picks_worse_category_about_forty_percent() {
    let mut bot = BotDecisionMaker::seeded(BotDifficulty::Easy, 2024);
    let options = [Category::Sixes, Category::Ones];
    let trials = 1000;

    let worse = (0..trials)
        .filter(|_| bot.choose_from(&[6, 6, 6, 6, 6], &options, 0) == Some(Category::Ones))
        .count();

    assert!(
        (300..=500).contains(&worse),
        "expected ~400 non-optimal picks, got {worse}"
    );
}
