//! Table actor implementation with async message handling.

use super::{
    manager::TableDirectory,
    messages::{TableError, TableMessage, TableStateResponse},
    registry::TableId,
    timer::TurnTimer,
};
use crate::{
    game::{Dispatch, GameSession, entities::ParticipantId},
    net::{
        EventRecord, Transport,
        messages::{ServerMessage, Snapshot},
    },
    table::config::TurnMode,
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), TableError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::Closed(self.table_id))
    }

    /// Current snapshot as `participant` would see it.
    pub async fn snapshot(&self, participant: &ParticipantId) -> Option<Snapshot> {
        let (response, rx) = oneshot::channel();
        self.send(TableMessage::GetSnapshot {
            participant: participant.clone(),
            response,
        })
        .await
        .ok()?;
        rx.await.ok().flatten()
    }

    pub async fn state(&self) -> Option<TableStateResponse> {
        let (response, rx) = oneshot::channel();
        self.send(TableMessage::GetState { response }).await.ok()?;
        rx.await.ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Table actor owning one game session.
///
/// All access to the session goes through the actor's inbox, so actions,
/// leaves and timer expiries for one table are applied strictly one at a
/// time.
pub struct TableActor {
    /// Table ID
    id: TableId,

    session: GameSession,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    transport: Arc<dyn Transport>,

    /// Owner notified when the game finishes
    directory: Arc<TableDirectory>,

    /// Rotation-mode turn deadline
    turn_timer: TurnTimer,

    /// Independent-mode deadline for the next bot round
    next_bot_round: Option<Instant>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `session` - Freshly created session for the table's participants
    /// * `transport` - Outbound delivery
    /// * `directory` - Directory to notify when the game finishes
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TableId,
        session: GameSession,
        transport: Arc<dyn Transport>,
        directory: Arc<TableDirectory>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let turn_timer = TurnTimer::new(session.config().turn_timeout());

        let actor = Self {
            id,
            session,
            inbox,
            transport,
            directory,
            turn_timer,
            next_bot_round: None,
            is_closed: false,
        };

        (actor, TableHandle::new(sender, id))
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!(
            "Table {} starting ({} mode) with {:?}",
            self.id,
            self.session.mode(),
            self.session.participants()
        );

        let participants = self.session.participants().to_vec();
        for participant in &participants {
            self.send_table_info(participant).await;
        }
        self.session.start();
        self.flush().await;
        self.schedule();

        while !self.is_closed {
            let turn_deadline = self.turn_timer.deadline();
            let bot_deadline = self.next_bot_round;

            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => break,
                },

                _ = sleep_until(turn_deadline.unwrap_or_else(Instant::now)), if turn_deadline.is_some() => {
                    self.on_turn_timeout().await;
                }

                _ = sleep_until(bot_deadline.unwrap_or_else(Instant::now)), if bot_deadline.is_some() => {
                    self.on_bot_round().await;
                }
            }
        }

        self.turn_timer.clear();
        log::info!("Table {} closed", self.id);
    }

    /// Handle a table message
    async fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::TakeAction {
                participant,
                request,
            } => {
                if self.session.apply_action(&participant, &request) {
                    self.flush().await;
                    self.schedule();
                }
            }

            TableMessage::Leave { participant } => {
                if self.session.remove_participant(&participant) {
                    self.flush().await;
                    self.schedule();
                }
            }

            TableMessage::Resync { participant } => {
                log::debug!("Table {}: resending state to {}", self.id, participant);
                self.send_table_info(&participant).await;
            }

            TableMessage::GetSnapshot {
                participant,
                response,
            } => {
                let seated = self.session.participants().contains(&participant);
                let _ = response.send(seated.then(|| self.session.snapshot_for(&participant)));
            }

            TableMessage::GetState { response } => {
                let _ = response.send(self.state());
            }

            TableMessage::Close => {
                self.is_closed = true;
            }
        }
    }

    fn state(&self) -> TableStateResponse {
        TableStateResponse {
            table_id: self.id,
            participants: self.session.participants().to_vec(),
            turn_mode: self.session.mode(),
            current_turn: self.session.current_turn().cloned(),
            totals: self.session.totals(),
            winner: self.session.winner().map(str::to_string),
        }
    }

    async fn send_table_info(&mut self, participant: &ParticipantId) {
        let message = ServerMessage::TableInfo(self.session.snapshot_for(participant));
        self.transport
            .send_to_participant(participant, &message)
            .await;
    }

    /// Deliver whatever the session queued, in order.
    async fn flush(&mut self) {
        for event in self.session.drain_events() {
            self.transport
                .log_event(&EventRecord::from_event(self.id, &event))
                .await;
        }

        for dispatch in self.session.drain_outbox() {
            match dispatch {
                Dispatch::Broadcast(message) => {
                    self.transport
                        .broadcast_to_table(self.session.participants(), &message)
                        .await;
                }
                Dispatch::Direct(participant, message) => {
                    self.transport
                        .send_to_participant(&participant, &message)
                        .await;
                }
                Dispatch::Finish(winner) => {
                    self.directory.finish_game(self.id, &winner).await;
                    self.is_closed = true;
                }
            }
        }
    }

    /// Re-arm deadlines after any state change.
    fn schedule(&mut self) {
        if self.session.is_finished() || self.is_closed {
            self.turn_timer.clear();
            self.next_bot_round = None;
            return;
        }

        match self.session.mode() {
            TurnMode::Rotation => match self.session.current_turn() {
                Some(holder) if !holder.is_bot() => {
                    if self.turn_timer.arm(self.session.turn_epoch()) {
                        log::debug!(
                            "Table {}: {} has {:?} to act",
                            self.id,
                            holder,
                            self.turn_timer.timeout()
                        );
                    }
                }
                _ => self.turn_timer.clear(),
            },
            TurnMode::Independent => {
                if self.session.pending_bots().is_empty() {
                    self.next_bot_round = None;
                } else if self.next_bot_round.is_none() {
                    self.next_bot_round =
                        Some(Instant::now() + self.session.config().bot_round_delay());
                }
            }
        }
    }

    async fn on_turn_timeout(&mut self) {
        let epoch = self.turn_timer.epoch();
        self.turn_timer.clear();
        if self.session.forfeit_turn(epoch) {
            log::info!("Table {}: turn timed out", self.id);
            self.flush().await;
        }
        self.schedule();
    }

    async fn on_bot_round(&mut self) {
        self.next_bot_round = None;
        for bot in self.session.pending_bots() {
            if !self.session.run_bot_round(&bot) {
                log::warn!("Table {}: {} could not finish a round", self.id, bot);
            }
        }
        self.flush().await;
        self.schedule();
    }
}
