//! Authoritative per-table game session.
//!
//! A [`GameSession`] owns the dice, score cards and turn pointer of one
//! table. Every mutation goes through [`GameSession::apply_action`] (or the
//! bot driver, which feeds the same validation path). Invalid actions are
//! no-ops; accepted ones queue [`Dispatch`] items for the owner to deliver.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    fmt,
};
use thiserror::Error;

use super::{
    constants::{MAX_BOT_STEPS_PER_ROUND, NUM_DICE, YATZY_SCORE},
    dice::{DiceRoller, RandomDice},
    entities::{Category, Dice, JokerPrompt, Move, ParticipantId, PlayState, ScoreCard},
    scoring::{score, yatzy_face},
    turns::{TurnOrder, TurnProgression},
};
use crate::{
    bot::decision::{BotDecisionMaker, BotView},
    net::messages::{MoveRequest, ServerMessage, Snapshot},
    table::config::{ConfigError, SessionConfig, TurnMode},
};

/// Reasons an action was not applied. None of these are fatal; the public
/// entry points turn them into silent no-ops.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("game is already over")]
    GameFinished,
    #[error("unrecognized packet type")]
    UnrecognizedPacket,
    #[error("unknown action")]
    UnknownAction,
    #[error("lock needs dice indices")]
    MissingDiceIndices,
    #[error("no valid die index given")]
    InvalidDieIndex,
    #[error("score needs a category")]
    MissingCategory,
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("participant is not seated")]
    UnknownParticipant,
    #[error("not your turn")]
    OutOfTurnAction,
    #[error("must roll first")]
    NotRolled,
    #[error("no rolls left")]
    NoRollsLeft,
    #[error("{0} already filled")]
    CategoryFilled(Category),
    #[error("all rounds played")]
    RoundsExhausted,
    #[error("a joker choice is pending")]
    JokerPending,
    #[error("no joker choice is pending")]
    NoJokerPending,
    #[error("{0} is not a joker option")]
    InvalidJokerOption(Category),
}

/// Events that occur during gameplay
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameEvent {
    Started {
        participants: Vec<ParticipantId>,
        mode: TurnMode,
    },
    Rolled(ParticipantId, Dice),
    Locked(ParticipantId, [bool; NUM_DICE]),
    Scored {
        participant: ParticipantId,
        category: Category,
        points: u32,
    },
    UpperBonus(ParticipantId, u32),
    YatzyBonus(ParticipantId, u32),
    JokerOffered(ParticipantId, Vec<Category>),
    TurnTimedOut(ParticipantId),
    Left(ParticipantId),
    Finished {
        winner: String,
    },
}

impl GameEvent {
    /// Participant the event is about, if any.
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Self::Rolled(p, _)
            | Self::Locked(p, _)
            | Self::UpperBonus(p, _)
            | Self::YatzyBonus(p, _)
            | Self::JokerOffered(p, _)
            | Self::TurnTimedOut(p)
            | Self::Left(p) => Some(p),
            Self::Scored { participant, .. } => Some(participant),
            Self::Started { .. } | Self::Finished { .. } => None,
        }
    }

    /// Short machine-friendly label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Rolled(..) => "rolled",
            Self::Locked(..) => "locked",
            Self::Scored { .. } => "scored",
            Self::UpperBonus(..) => "upper_bonus",
            Self::YatzyBonus(..) => "yatzy_bonus",
            Self::JokerOffered(..) => "joker_offered",
            Self::TurnTimedOut(_) => "turn_timed_out",
            Self::Left(_) => "left",
            Self::Finished { .. } => "finished",
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Started { participants, mode } => {
                let names: Vec<&str> = participants.iter().map(ParticipantId::as_str).collect();
                format!("{mode} game started with {}", names.join(", "))
            }
            Self::Rolled(p, dice) => format!("{p} rolled {dice:?}"),
            Self::Locked(p, locked) => format!("{p} locked {locked:?}"),
            Self::Scored {
                participant,
                category,
                points,
            } => format!("{participant} scored {points} in {category}"),
            Self::UpperBonus(p, points) => format!("{p} settled the upper bonus at {points}"),
            Self::YatzyBonus(p, total) => format!("{p} rolled another Yatzy (bonus now {total})"),
            Self::JokerOffered(p, options) => format!("{p} must choose a joker from {options:?}"),
            Self::TurnTimedOut(p) => format!("{p} ran out of time"),
            Self::Left(p) => format!("{p} left the game"),
            Self::Finished { winner } if winner.is_empty() => "game ended in a draw".to_string(),
            Self::Finished { winner } => format!("{winner} won the game"),
        };
        write!(f, "{repr}")
    }
}

/// Coarse lifecycle of a session. A pending joker is tracked per
/// participant in their [`PlayState`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    AwaitingFirstAction,
    InProgress,
    /// Terminal. An empty winner is a draw.
    Finished { winner: String },
}

/// Output of the session, drained and delivered by its owner in order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Dispatch {
    /// Send to every participant still seated.
    Broadcast(ServerMessage),
    /// Send to one participant only.
    Direct(ParticipantId, ServerMessage),
    /// The game is over; the owner should tear the table down.
    Finish(String),
}

/// One running game bound to a table.
#[derive(Debug)]
pub struct GameSession {
    /// Seated participants in join order.
    participants: Vec<ParticipantId>,
    config: SessionConfig,
    turns: TurnOrder,
    play: HashMap<ParticipantId, PlayState>,
    /// Every card dealt at start, including those of departed participants.
    scores: BTreeMap<ParticipantId, ScoreCard>,
    rounds: HashMap<ParticipantId, u32>,
    phase: Phase,
    started: bool,
    /// Bumped whenever the rotation turn pointer moves, so a timer armed
    /// for an earlier turn can be recognized as stale.
    turn_epoch: u64,
    roller: Box<dyn DiceRoller>,
    bot: BotDecisionMaker,
    outbox: VecDeque<Dispatch>,
    events: VecDeque<GameEvent>,
}

impl GameSession {
    /// Creates a session with random dice and a bot of the configured tier.
    pub fn new(participants: Vec<ParticipantId>, config: SessionConfig) -> Result<Self, ConfigError> {
        let bot = BotDecisionMaker::new(config.bot_difficulty);
        Self::from_parts(participants, config, Box::new(RandomDice::new()), bot)
    }

    /// Creates a session with explicit sources of randomness.
    pub fn from_parts(
        participants: Vec<ParticipantId>,
        config: SessionConfig,
        roller: Box<dyn DiceRoller>,
        bot: BotDecisionMaker,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if participants.is_empty() {
            return Err(ConfigError::NoParticipants);
        }
        if participants.len() > config.capacity {
            return Err(ConfigError::TooManyParticipants {
                count: participants.len(),
                capacity: config.capacity,
            });
        }
        let mut seen = HashSet::with_capacity(participants.len());
        for participant in &participants {
            if !seen.insert(participant) {
                return Err(ConfigError::DuplicateParticipant(participant.to_string()));
            }
        }

        let turns = TurnOrder::new(config.turn_mode, &participants);
        let play = participants
            .iter()
            .map(|p| (p.clone(), PlayState::default()))
            .collect();
        let scores = participants
            .iter()
            .map(|p| (p.clone(), ScoreCard::default()))
            .collect();
        let rounds = participants.iter().map(|p| (p.clone(), 0)).collect();

        Ok(Self {
            participants,
            config,
            turns,
            play,
            scores,
            rounds,
            phase: Phase::AwaitingFirstAction,
            started: false,
            turn_epoch: 0,
            roller,
            bot,
            outbox: VecDeque::new(),
            events: VecDeque::new(),
        })
    }

    /// Marks the session live. In rotation mode a bot holding the first
    /// turn plays it immediately.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(
            "{} session started with {} participants",
            self.turns.mode(),
            self.participants.len()
        );
        self.events.push_back(GameEvent::Started {
            participants: self.participants.clone(),
            mode: self.turns.mode(),
        });
        self.drive_rotation_bots();
    }

    /// Single entry point for participant actions.
    ///
    /// Returns whether the action was accepted. Rejected actions change
    /// nothing and queue nothing.
    pub fn apply_action(&mut self, participant: &ParticipantId, request: &MoveRequest) -> bool {
        match Move::try_from(request).and_then(|action| self.apply(participant, &action)) {
            Ok(()) => {
                self.drive_rotation_bots();
                true
            }
            Err(error) => {
                debug!("ignored action from {participant}: {error}");
                false
            }
        }
    }

    /// Plays one full round (rolls through scoring) for `bot`.
    ///
    /// Every move is encoded as a wire request and sent through the same
    /// validation as a human's. Returns whether the bot completed a round.
    pub fn run_bot_round(&mut self, bot: &ParticipantId) -> bool {
        if !bot.is_bot() || self.is_finished() || !self.turns.may_act(bot) || !self.owes_rounds(bot)
        {
            return false;
        }

        let start_round = self.rounds_completed(bot);
        let mut steps = 0;
        while steps < MAX_BOT_STEPS_PER_ROUND
            && !self.is_finished()
            && self.rounds_completed(bot) == start_round
        {
            let (Some(state), Some(card)) = (self.play.get(bot), self.scores.get(bot)) else {
                return false;
            };
            let view = BotView {
                dice: state.dice,
                locked_dice: state.locked_dice,
                rolls_left: state.rolls_left,
                has_rolled_this_turn: state.has_rolled_this_turn,
                card,
                pending_joker: state.pending_joker.as_ref(),
            };
            let plan = self.bot.plan(&view);
            if plan.is_empty() {
                break;
            }

            for action in plan {
                steps += 1;
                let request = MoveRequest::from(&action);
                match Move::try_from(&request).and_then(|action| self.apply(bot, &action)) {
                    Ok(()) => debug!("{bot} {action}"),
                    Err(error) => {
                        warn!("{bot} planned an invalid move ({action}): {error}");
                        return false;
                    }
                }
            }
        }

        self.is_finished() || self.rounds_completed(bot) > start_round
    }

    /// Bots still seated that have rounds left to play.
    pub fn pending_bots(&self) -> Vec<ParticipantId> {
        if self.is_finished() {
            return Vec::new();
        }
        self.participants
            .iter()
            .filter(|p| p.is_bot() && self.owes_rounds(p))
            .cloned()
            .collect()
    }

    /// Removes a participant mid-game. Returns whether they were seated.
    pub fn remove_participant(&mut self, participant: &ParticipantId) -> bool {
        if self.is_finished() {
            return false;
        }
        let Some(index) = self.participants.iter().position(|p| p == participant) else {
            return false;
        };

        self.participants.remove(index);
        self.play.remove(participant);
        info!("{participant} left the session");
        self.events.push_back(GameEvent::Left(participant.clone()));

        if self.participants.len() <= 1 {
            let winner = self
                .participants
                .first()
                .map(ToString::to_string)
                .unwrap_or_default();
            self.finish(winner);
            return true;
        }

        if self
            .turns
            .after_leave(&self.participants, participant, index)
        {
            self.turn_epoch += 1;
            if let Some(holder) = self.turns.current_turn().cloned() {
                self.broadcast_state(&holder);
            }
            self.drive_rotation_bots();
        }
        self.check_termination();
        true
    }

    /// Rules the rotation turn holder out after a timeout.
    ///
    /// `epoch` is the turn epoch the timer was armed for; a stale timer is
    /// ignored. Returns whether the game ended.
    pub fn forfeit_turn(&mut self, epoch: u64) -> bool {
        if self.is_finished() || epoch != self.turn_epoch {
            return false;
        }
        let Some(holder) = self.turns.current_turn().cloned() else {
            return false;
        };

        warn!("{holder} timed out and forfeits");
        self.events.push_back(GameEvent::TurnTimedOut(holder.clone()));
        let remaining: Vec<ParticipantId> = self
            .participants
            .iter()
            .filter(|p| **p != holder)
            .cloned()
            .collect();
        let winner = match remaining.as_slice() {
            [only] => only.to_string(),
            _ => self.leader(&remaining),
        };
        self.finish(winner);
        true
    }

    /// Current state as `viewer` should see it.
    pub fn snapshot_for(&self, viewer: &ParticipantId) -> Snapshot {
        let perspective = self.turns.current_turn().unwrap_or(viewer);
        self.snapshot(perspective)
    }

    /// Sum of filled categories plus both bonus slots.
    pub fn total_for(&self, participant: &ParticipantId) -> Option<u32> {
        self.scores.get(participant).map(ScoreCard::total)
    }

    /// Totals of every participant dealt in, including those who left.
    pub fn totals(&self) -> BTreeMap<ParticipantId, u32> {
        self.scores
            .iter()
            .map(|(p, card)| (p.clone(), card.total()))
            .collect()
    }

    pub fn drain_outbox(&mut self) -> VecDeque<Dispatch> {
        std::mem::take(&mut self.outbox)
    }

    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> TurnMode {
        self.turns.mode()
    }

    pub fn current_turn(&self) -> Option<&ParticipantId> {
        self.turns.current_turn()
    }

    pub fn turn_epoch(&self) -> u64 {
        self.turn_epoch
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    pub fn winner(&self) -> Option<&str> {
        match &self.phase {
            Phase::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn play_state(&self, participant: &ParticipantId) -> Option<&PlayState> {
        self.play.get(participant)
    }

    pub fn score_card(&self, participant: &ParticipantId) -> Option<&ScoreCard> {
        self.scores.get(participant)
    }

    pub fn rounds_completed(&self, participant: &ParticipantId) -> u32 {
        self.rounds.get(participant).copied().unwrap_or(0)
    }

    fn owes_rounds(&self, participant: &ParticipantId) -> bool {
        self.rounds_completed(participant) < self.config.rounds_per_participant
    }

    /// Validates and applies one move. Nothing is mutated on `Err`.
    fn apply(&mut self, participant: &ParticipantId, action: &Move) -> Result<(), UserError> {
        if self.is_finished() {
            return Err(UserError::GameFinished);
        }
        if !self.play.contains_key(participant) {
            return Err(UserError::UnknownParticipant);
        }
        if !self.turns.may_act(participant) {
            return Err(UserError::OutOfTurnAction);
        }
        if !self.owes_rounds(participant) {
            return Err(UserError::RoundsExhausted);
        }

        match action {
            Move::Roll => self.roll(participant)?,
            Move::Lock(indices) => self.toggle_locks(participant, indices)?,
            Move::Score(category) => self.score_category(participant, *category)?,
            Move::Joker(category) => self.resolve_joker(participant, *category)?,
        }

        if self.phase == Phase::AwaitingFirstAction {
            self.phase = Phase::InProgress;
        }
        Ok(())
    }

    fn roll(&mut self, participant: &ParticipantId) -> Result<(), UserError> {
        let state = self
            .play
            .get_mut(participant)
            .ok_or(UserError::UnknownParticipant)?;
        if state.pending_joker.is_some() {
            return Err(UserError::JokerPending);
        }
        if state.rolls_left == 0 {
            return Err(UserError::NoRollsLeft);
        }

        for (die, locked) in state.dice.iter_mut().zip(state.locked_dice) {
            if !locked {
                *die = self.roller.roll_die();
            }
        }
        state.rolls_left -= 1;
        state.has_rolled_this_turn = true;
        let dice = state.dice;

        self.events
            .push_back(GameEvent::Rolled(participant.clone(), dice));
        self.broadcast_state(participant);
        Ok(())
    }

    fn toggle_locks(&mut self, participant: &ParticipantId, indices: &[usize]) -> Result<(), UserError> {
        let state = self
            .play
            .get_mut(participant)
            .ok_or(UserError::UnknownParticipant)?;
        if state.pending_joker.is_some() {
            return Err(UserError::JokerPending);
        }
        if !state.has_rolled_this_turn {
            return Err(UserError::NotRolled);
        }
        if indices.is_empty() || indices.iter().any(|&i| i >= NUM_DICE) {
            return Err(UserError::InvalidDieIndex);
        }

        for &i in indices {
            state.locked_dice[i] = !state.locked_dice[i];
        }
        let locked = state.locked_dice;

        self.events
            .push_back(GameEvent::Locked(participant.clone(), locked));
        self.broadcast_state(participant);
        Ok(())
    }

    fn score_category(&mut self, participant: &ParticipantId, category: Category) -> Result<(), UserError> {
        let (Some(state), Some(card)) = (self.play.get(participant), self.scores.get_mut(participant))
        else {
            return Err(UserError::UnknownParticipant);
        };
        if state.pending_joker.is_some() {
            return Err(UserError::JokerPending);
        }
        if !state.has_rolled_this_turn {
            return Err(UserError::NotRolled);
        }
        if card.is_filled(category) {
            return Err(UserError::CategoryFilled(category));
        }

        let dice = state.dice;
        let repeat_face = yatzy_face(&dice).filter(|_| card.get(Category::Yatzy) == Some(YATZY_SCORE));
        let Some(face) = repeat_face else {
            let points = score(&dice, category);
            self.finish_scoring(participant, category, points);
            return Ok(());
        };

        card.add_yatzy_bonus();
        let bonus = card.yatzy_bonus.unwrap_or(0);
        self.events
            .push_back(GameEvent::YatzyBonus(participant.clone(), bonus));

        let natural = Category::upper_for_face(face);
        if let Some(upper) = natural.filter(|c| !card.is_filled(*c)) {
            self.finish_scoring(participant, upper, u32::from(face) * NUM_DICE as u32);
            return Ok(());
        }

        let lower: Vec<Category> = Category::LOWER
            .into_iter()
            .filter(|c| !card.is_filled(*c))
            .collect();
        let options = if lower.is_empty() {
            Category::UPPER
                .into_iter()
                .filter(|c| !card.is_filled(*c))
                .collect()
        } else {
            lower
        };
        let prompt = JokerPrompt {
            options: options.clone(),
            dice_value: face,
        };
        if let Some(state) = self.play.get_mut(participant) {
            state.pending_joker = Some(prompt.clone());
        }

        self.events
            .push_back(GameEvent::JokerOffered(participant.clone(), options));
        self.outbox.push_back(Dispatch::Direct(
            participant.clone(),
            ServerMessage::JokerChoice(prompt),
        ));
        Ok(())
    }

    fn resolve_joker(&mut self, participant: &ParticipantId, category: Category) -> Result<(), UserError> {
        let state = self
            .play
            .get(participant)
            .ok_or(UserError::UnknownParticipant)?;
        let prompt = state
            .pending_joker
            .as_ref()
            .ok_or(UserError::NoJokerPending)?;
        if !prompt.options.contains(&category) {
            return Err(UserError::InvalidJokerOption(category));
        }

        // Upper categories are only offered once the lower section is full,
        // and then score nothing.
        let points = if category.is_upper() {
            0
        } else {
            score(&state.dice, category)
        };
        self.finish_scoring(participant, category, points);
        Ok(())
    }

    /// Post-scoring bookkeeping shared by plain scores and jokers.
    fn finish_scoring(&mut self, participant: &ParticipantId, category: Category, points: u32) {
        if let Some(card) = self.scores.get_mut(participant) {
            card.fill(category, points);
            if card.settle_upper_bonus() {
                let bonus = card.upper_bonus.unwrap_or(0);
                self.events
                    .push_back(GameEvent::UpperBonus(participant.clone(), bonus));
            }
        }
        *self.rounds.entry(participant.clone()).or_insert(0) += 1;
        if let Some(state) = self.play.get_mut(participant) {
            state.end_turn();
        }

        self.turns.after_score(&self.participants, participant);
        if self.turns.mode() == TurnMode::Rotation {
            self.turn_epoch += 1;
        }

        self.events.push_back(GameEvent::Scored {
            participant: participant.clone(),
            category,
            points,
        });
        self.broadcast_state(participant);
        self.check_termination();
    }

    fn check_termination(&mut self) {
        if self.is_finished() {
            return;
        }
        let limit = self.config.rounds_per_participant;
        let rounds_done = self
            .participants
            .iter()
            .all(|p| self.rounds_completed(p) >= limit);
        let cards_full = self
            .participants
            .iter()
            .all(|p| self.scores.get(p).is_some_and(ScoreCard::is_complete));

        if rounds_done || cards_full {
            let winner = self.leader(&self.participants);
            self.finish(winner);
        }
    }

    /// Unique participant with the strictly highest total, or empty on a tie.
    fn leader(&self, candidates: &[ParticipantId]) -> String {
        let totals: Vec<(&ParticipantId, u32)> = candidates
            .iter()
            .map(|p| (p, self.total_for(p).unwrap_or(0)))
            .collect();
        let Some(best) = totals.iter().map(|(_, total)| *total).max() else {
            return String::new();
        };
        let mut leaders = totals.iter().filter(|(_, total)| *total == best);
        match (leaders.next(), leaders.next()) {
            (Some((p, _)), None) => p.to_string(),
            _ => String::new(),
        }
    }

    fn finish(&mut self, winner: String) {
        if winner.is_empty() {
            info!("session finished in a draw");
        } else {
            info!("session finished, {winner} wins");
        }
        self.phase = Phase::Finished {
            winner: winner.clone(),
        };
        self.events.push_back(GameEvent::Finished {
            winner: winner.clone(),
        });
        self.outbox.push_back(Dispatch::Broadcast(ServerMessage::GameOver {
            winner: winner.clone(),
        }));
        self.outbox.push_back(Dispatch::Finish(winner));
    }

    /// Queues a `CHANGE_TURN` snapshot following an accepted action by `actor`.
    fn broadcast_state(&mut self, actor: &ParticipantId) {
        let snapshot = self.snapshot_for(actor);
        self.outbox
            .push_back(Dispatch::Broadcast(ServerMessage::ChangeTurn(snapshot)));
    }

    fn snapshot(&self, perspective: &ParticipantId) -> Snapshot {
        let play = self.play.get(perspective).cloned().unwrap_or_default();
        let has_rolled_this_turn = match self.turns.mode() {
            TurnMode::Rotation => None,
            TurnMode::Independent => Some(play.has_rolled_this_turn),
        };
        Snapshot {
            participant: perspective.clone(),
            dice: play.dice,
            rolls_left: play.rolls_left,
            locked_dice: play.locked_dice,
            scores: self.scores.clone(),
            current_turn: self.turns.current_turn().cloned(),
            has_rolled_this_turn,
            pending_joker: play.pending_joker.is_some(),
            game_over: self.is_finished(),
        }
    }

    /// In rotation mode, plays out consecutive bot turns until a human
    /// holds the pointer or the game ends. Each iteration completes one
    /// round or stops, so the loop is bounded by the rounds limit.
    fn drive_rotation_bots(&mut self) {
        if self.turns.mode() != TurnMode::Rotation {
            return;
        }
        while let Some(holder) = self.turns.current_turn().filter(|p| p.is_bot()).cloned() {
            if !self.run_bot_round(&holder) || self.is_finished() {
                break;
            }
        }
    }
}
