//! Matching of participant identifiers into fixed-size tables.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::config::{BotDifficulty, OpponentPreference};
use crate::game::entities::ParticipantId;

/// Table key. Keys are handed out in increasing order and never reused.
pub type TableId = u64;

/// Registry error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("participant identifier is empty")]
    EmptyIdentifier,

    #[error("identifier {0} is reserved for bots")]
    ReservedIdentifier(String),
}

/// Read-only view of one table's membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub table_id: TableId,
    /// Participants in join order.
    pub participants: Vec<ParticipantId>,
    pub capacity: usize,
    pub is_full: bool,
    /// Bot tier requested by whoever created the table.
    pub bot_difficulty: Option<BotDifficulty>,
}

/// Result of a join attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub table: TableInfo,
    /// `false` when the participant was already seated (a reconnect).
    pub was_newly_added: bool,
}

#[derive(Debug)]
struct Table {
    participants: Vec<ParticipantId>,
    /// Set once the table first fills. A sealed table never takes newcomers,
    /// even after someone leaves, because its game has already begun.
    sealed: bool,
    bot_difficulty: Option<BotDifficulty>,
}

impl Table {
    fn info(&self, table_id: TableId, capacity: usize) -> TableInfo {
        TableInfo {
            table_id,
            participants: self.participants.clone(),
            capacity,
            is_full: self.sealed,
            bot_difficulty: self.bot_difficulty,
        }
    }
}

/// All tables of one process and who sits where.
///
/// The registry is plain data; callers serialize access to it.
#[derive(Debug)]
pub struct TableRegistry {
    capacity: usize,
    tables: BTreeMap<TableId, Table>,
    members: HashMap<ParticipantId, TableId>,
    next_id: TableId,
}

impl TableRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tables: BTreeMap::new(),
            members: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Seat `participant`, or return their current table if already seated.
    ///
    /// A lone participant at a two-seat table is paired with a bot right
    /// away unless they asked for a human opponent.
    pub fn join(
        &mut self,
        participant: &ParticipantId,
        preference: OpponentPreference,
        bot_difficulty: Option<BotDifficulty>,
    ) -> Result<JoinOutcome, RegistryError> {
        if participant.as_str().is_empty() {
            return Err(RegistryError::EmptyIdentifier);
        }
        if participant.is_bot() {
            return Err(RegistryError::ReservedIdentifier(participant.to_string()));
        }

        if let Some(table) = self.find(participant) {
            return Ok(JoinOutcome {
                table,
                was_newly_added: false,
            });
        }

        let capacity = self.capacity;
        let open = self
            .tables
            .iter()
            .find(|(_, t)| !t.sealed && t.participants.len() < capacity)
            .map(|(id, _)| *id);
        let table_id = open.unwrap_or_else(|| {
            let id = self.next_id;
            self.next_id += 1;
            log::info!("Created table {id}");
            id
        });
        let table = self.tables.entry(table_id).or_insert_with(|| Table {
            participants: Vec::with_capacity(capacity),
            sealed: false,
            bot_difficulty,
        });
        table.participants.push(participant.clone());
        self.members.insert(participant.clone(), table_id);

        if table.participants.len() == 1
            && capacity == 2
            && preference != OpponentPreference::Human
        {
            let bot = ParticipantId::bot_for_table(table_id);
            log::info!("Table {table_id}: seating {bot} opposite {participant}");
            table.participants.push(bot.clone());
            self.members.insert(bot, table_id);
        }

        if table.participants.len() >= capacity {
            table.sealed = true;
        }

        Ok(JoinOutcome {
            table: table.info(table_id, capacity),
            was_newly_added: true,
        })
    }

    /// Table `participant` currently sits at.
    pub fn find(&self, participant: &ParticipantId) -> Option<TableInfo> {
        self.members
            .get(participant)
            .and_then(|id| self.info(*id))
    }

    pub fn info(&self, table_id: TableId) -> Option<TableInfo> {
        self.tables
            .get(&table_id)
            .map(|table| table.info(table_id, self.capacity))
    }

    /// Unseat `participant`. An emptied table is discarded.
    /// Returns whether the participant was seated at `table_id`.
    pub fn leave(&mut self, table_id: TableId, participant: &ParticipantId) -> bool {
        let Some(table) = self.tables.get_mut(&table_id) else {
            return false;
        };
        let Some(index) = table.participants.iter().position(|p| p == participant) else {
            return false;
        };

        table.participants.remove(index);
        self.members.remove(participant);
        if table.participants.is_empty() {
            self.tables.remove(&table_id);
            log::info!("Discarded empty table {table_id}");
        }
        true
    }

    /// Drop a table and unseat everyone at it.
    pub fn remove_table(&mut self, table_id: TableId) -> Option<TableInfo> {
        let info = self.info(table_id)?;
        self.tables.remove(&table_id);
        for participant in &info.participants {
            self.members.remove(participant);
        }
        Some(info)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn participant_count(&self) -> usize {
        self.members.len()
    }
}
