//! Turn-progression policies.
//!
//! A session holds one [`TurnOrder`]; the variant decides who may act and
//! how the turn moves after scoring or after someone leaves.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use super::entities::ParticipantId;
use crate::table::config::TurnMode;

#[enum_dispatch]
pub trait TurnProgression {
    /// Whether `participant` is allowed to act right now.
    fn may_act(&self, participant: &ParticipantId) -> bool;

    /// Holder of the shared turn pointer, if the policy has one.
    fn current_turn(&self) -> Option<&ParticipantId>;

    /// Called after `scorer` completed a scoring action.
    fn after_score(&mut self, participants: &[ParticipantId], scorer: &ParticipantId);

    /// Called after the participant formerly at `departed_index` was
    /// removed from `remaining`. Returns `true` if the turn moved.
    fn after_leave(
        &mut self,
        remaining: &[ParticipantId],
        departed: &ParticipantId,
        departed_index: usize,
    ) -> bool;
}

/// One shared pointer advanced in join order on every scoring action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Rotation {
    current: ParticipantId,
}

impl Rotation {
    pub fn new(first: ParticipantId) -> Self {
        Self { current: first }
    }
}

impl TurnProgression for Rotation {
    fn may_act(&self, participant: &ParticipantId) -> bool {
        &self.current == participant
    }

    fn current_turn(&self) -> Option<&ParticipantId> {
        Some(&self.current)
    }

    fn after_score(&mut self, participants: &[ParticipantId], scorer: &ParticipantId) {
        if let Some(idx) = participants.iter().position(|p| p == scorer) {
            self.current = participants[(idx + 1) % participants.len()].clone();
        }
    }

    fn after_leave(
        &mut self,
        remaining: &[ParticipantId],
        departed: &ParticipantId,
        departed_index: usize,
    ) -> bool {
        if &self.current != departed || remaining.is_empty() {
            return false;
        }
        self.current = remaining[departed_index % remaining.len()].clone();
        true
    }
}

/// Every participant runs their own roll/lock/score cycle.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Independent;

impl TurnProgression for Independent {
    fn may_act(&self, _participant: &ParticipantId) -> bool {
        true
    }

    fn current_turn(&self) -> Option<&ParticipantId> {
        None
    }

    fn after_score(&mut self, _participants: &[ParticipantId], _scorer: &ParticipantId) {}

    fn after_leave(
        &mut self,
        _remaining: &[ParticipantId],
        _departed: &ParticipantId,
        _departed_index: usize,
    ) -> bool {
        false
    }
}

#[enum_dispatch(TurnProgression)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TurnOrder {
    Rotation,
    Independent,
}

impl TurnOrder {
    pub fn new(mode: TurnMode, participants: &[ParticipantId]) -> Self {
        match (mode, participants.first()) {
            (TurnMode::Rotation, Some(first)) => Rotation::new(first.clone()).into(),
            _ => Independent.into(),
        }
    }

    pub fn mode(&self) -> TurnMode {
        match self {
            Self::Rotation(_) => TurnMode::Rotation,
            Self::Independent(_) => TurnMode::Independent,
        }
    }
}
