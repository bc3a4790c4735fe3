//! Table manager routing participants to table actors.

use super::{
    actor::{TableActor, TableHandle},
    config::{BotDifficulty, ConfigError, OpponentPreference, SessionConfig},
    messages::{TableMessage, TableStateResponse},
    registry::{JoinOutcome, RegistryError, TableId, TableInfo, TableRegistry},
};
use crate::{
    game::{GameSession, entities::ParticipantId},
    net::{
        Transport,
        messages::{MoveRequest, Snapshot},
    },
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Membership and running actors, each behind its own lock.
///
/// Neither lock is ever held across a send to a table actor, so a join or
/// leave never waits on a session. When both are needed the registry lock is
/// taken first.
#[derive(Debug)]
pub struct TableDirectory {
    registry: RwLock<TableRegistry>,
    handles: RwLock<HashMap<TableId, TableHandle>>,
}

impl TableDirectory {
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: RwLock::new(TableRegistry::new(capacity)),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Tear a table down once its game is over.
    pub async fn finish_game(&self, table_id: TableId, winner: &str) {
        self.handles.write().await.remove(&table_id);
        let removed = self.registry.write().await.remove_table(table_id);
        if winner.is_empty() {
            log::info!("Table {table_id} finished in a draw");
        } else {
            log::info!("Table {table_id} finished, winner {winner}");
        }
        if removed.is_none() {
            log::debug!("Table {table_id} was already gone from the registry");
        }
    }

    pub async fn find(&self, participant: &ParticipantId) -> Option<TableInfo> {
        self.registry.read().await.find(participant)
    }

    pub async fn handle(&self, table_id: TableId) -> Option<TableHandle> {
        self.handles.read().await.get(&table_id).cloned()
    }
}

/// Session dispatcher: seats connections, starts tables when they fill and
/// routes inbound actions to the right actor.
pub struct TableManager {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    directory: Arc<TableDirectory>,
}

impl TableManager {
    /// Create a new table manager
    ///
    /// # Arguments
    ///
    /// * `config` - Session configuration applied to every table
    /// * `transport` - Outbound delivery shared by all tables
    ///
    /// # Returns
    ///
    /// * `Result<TableManager, ConfigError>` - Manager, or the reason the
    ///   configuration cannot run a game
    pub fn new(config: SessionConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            directory: Arc::new(TableDirectory::new(config.capacity)),
            config,
            transport,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Seat a connecting participant.
    ///
    /// Starts the table's game when this join fills it. A participant who is
    /// already seated at a running table is sent the current state instead.
    pub async fn connect(
        &self,
        participant: &ParticipantId,
        preference: OpponentPreference,
        bot_difficulty: Option<BotDifficulty>,
    ) -> Result<JoinOutcome, RegistryError> {
        let mut registry = self.directory.registry.write().await;
        let outcome = registry.join(participant, preference, bot_difficulty)?;

        let table = &outcome.table;
        if !table.is_full {
            drop(registry);
            log::info!(
                "{} waiting at table {} ({}/{})",
                participant,
                table.table_id,
                table.participants.len(),
                table.capacity
            );
        } else if outcome.was_newly_added {
            // The handle is published while membership is still locked, so a
            // leave that sees the full table always reaches its actor.
            self.start_table(&mut registry, table).await;
        } else {
            drop(registry);
            if let Some(handle) = self.directory.handle(table.table_id).await {
                let resync = TableMessage::Resync {
                    participant: participant.clone(),
                };
                if let Err(e) = handle.send(resync).await {
                    log::debug!("Reconnect of {participant} missed the table: {e}");
                }
            }
        }

        Ok(outcome)
    }

    async fn start_table(&self, registry: &mut TableRegistry, table: &TableInfo) {
        let config = SessionConfig {
            bot_difficulty: table.bot_difficulty.unwrap_or(self.config.bot_difficulty),
            ..self.config.clone()
        };

        let session = match GameSession::new(table.participants.clone(), config) {
            Ok(session) => session,
            Err(e) => {
                log::error!("Table {} cannot start: {}", table.table_id, e);
                registry.remove_table(table.table_id);
                return;
            }
        };

        let (actor, handle) = TableActor::new(
            table.table_id,
            session,
            self.transport.clone(),
            self.directory.clone(),
        );
        self.directory
            .handles
            .write()
            .await
            .insert(table.table_id, handle);

        tokio::spawn(async move {
            actor.run().await;
        });
    }

    /// Route an inbound action to the participant's table.
    ///
    /// Returns whether it was handed to a running table; unseated
    /// participants and tables still waiting for players are ignored.
    pub async fn dispatch(&self, participant: &ParticipantId, request: MoveRequest) -> bool {
        let Some(table) = self.directory.find(participant).await else {
            log::debug!("Action from unseated {participant} ignored");
            return false;
        };
        if !table.is_full {
            log::debug!("Table {}: waiting for players to join", table.table_id);
            return false;
        }
        let Some(handle) = self.directory.handle(table.table_id).await else {
            return false;
        };

        handle
            .send(TableMessage::TakeAction {
                participant: participant.clone(),
                request,
            })
            .await
            .is_ok()
    }

    /// Unseat a participant who left or disconnected.
    pub async fn leave(&self, participant: &ParticipantId) -> bool {
        let Some(table) = self.directory.find(participant).await else {
            return false;
        };
        let left = self
            .directory
            .registry
            .write()
            .await
            .leave(table.table_id, participant);
        if !left {
            return false;
        }
        log::info!("{participant} left table {}", table.table_id);

        if let Some(handle) = self.directory.handle(table.table_id).await {
            let message = TableMessage::Leave {
                participant: participant.clone(),
            };
            if let Err(e) = handle.send(message).await {
                log::debug!("Leave of {participant} missed the table: {e}");
            }
        }
        true
    }

    pub async fn snapshot(&self, participant: &ParticipantId) -> Option<Snapshot> {
        let table = self.directory.find(participant).await?;
        let handle = self.directory.handle(table.table_id).await?;
        handle.snapshot(participant).await
    }

    pub async fn table_state(&self, table_id: TableId) -> Option<TableStateResponse> {
        let handle = self.directory.handle(table_id).await?;
        handle.state().await
    }

    pub async fn find(&self, participant: &ParticipantId) -> Option<TableInfo> {
        self.directory.find(participant).await
    }

    /// Tables with a running game.
    pub async fn active_table_count(&self) -> usize {
        self.directory.handles.read().await.len()
    }

    /// All tables, including those still waiting for players.
    pub async fn table_count(&self) -> usize {
        self.directory.registry.read().await.table_count()
    }

    /// Stop every running table without declaring results.
    pub async fn shutdown(&self) {
        let handles: Vec<TableHandle> = self
            .directory
            .handles
            .write()
            .await
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in handles {
            let _ = handle.send(TableMessage::Close).await;
        }
    }
}
