//! Conversation runtime executor

use super::traits::Storage;
use crate::registry::DriverRegistry;
use crate::state_machine::{
    transition, Effect, ErrorKind, Event, Response, Session, SessionContext,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// What the caller gets back for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    pub response: Response,
    pub session: Session,
}

/// Messages accepted by a conversation runtime
#[derive(Debug)]
pub enum Command {
    Handle {
        event: Event,
        reply: oneshot::Sender<EventOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<Session>,
    },
}

/// Single owner of one conversation's session.
///
/// Commands are processed one at a time, which serializes the conversation's
/// events without any extra locking on the session.
pub struct ConversationRuntime<S>
where
    S: Storage + Clone + 'static,
{
    context: SessionContext,
    session: Session,
    registry: Arc<DriverRegistry>,
    storage: S,
    command_rx: mpsc::Receiver<Command>,
    idle_timeout: Option<Duration>,
}

impl<S> ConversationRuntime<S>
where
    S: Storage + Clone + 'static,
{
    pub fn new(
        context: SessionContext,
        session: Session,
        registry: Arc<DriverRegistry>,
        storage: S,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            context,
            session,
            registry,
            storage,
            command_rx,
            idle_timeout: None,
        }
    }

    /// Stop after this long without a command
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    async fn next_command(&mut self) -> Option<Command> {
        let Some(idle) = self.idle_timeout else {
            return self.command_rx.recv().await;
        };
        if let Ok(command) = tokio::time::timeout(idle, self.command_rx.recv()).await {
            return command;
        }

        // Refuse new commands; queued ones are still drained by recv
        tracing::info!(
            conversation_id = self.context.conversation_id,
            idle_ms = u64::try_from(idle.as_millis()).unwrap_or(u64::MAX),
            "Conversation runtime idle"
        );
        self.command_rx.close();
        self.command_rx.recv().await
    }

    pub async fn run(mut self) {
        tracing::info!(
            conversation_id = self.context.conversation_id,
            state = self.session.state.as_str(),
            "Starting conversation runtime"
        );

        while let Some(command) = self.next_command().await {
            match command {
                Command::Handle { event, reply } => {
                    let outcome = self.process_event(event).await;
                    if reply.send(outcome).is_err() {
                        tracing::debug!(
                            conversation_id = self.context.conversation_id,
                            "Caller went away before the reply"
                        );
                    }
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.session.clone());
                }
            }
        }

        tracing::info!(
            conversation_id = self.context.conversation_id,
            "Conversation runtime stopped"
        );
    }

    pub(crate) async fn process_event(&mut self, event: Event) -> EventOutcome {
        let kind = event.kind();
        let result = match transition(&self.session, &self.context, &self.registry, event) {
            Ok(r) => r,
            Err(e) => {
                // Rejected events are user-facing; the session stays as it was
                tracing::debug!(
                    conversation_id = self.context.conversation_id,
                    event = kind,
                    error = %e,
                    "Rejected event"
                );
                return EventOutcome {
                    response: Response::error(ErrorKind::UnexpectedEvent, e.to_string()),
                    session: self.session.clone(),
                };
            }
        };

        self.session = result.new_session;
        if let Some(error) = result.response.error_kind() {
            tracing::debug!(
                conversation_id = self.context.conversation_id,
                event = kind,
                error = ?error,
                "Event answered with an error"
            );
        }

        for effect in result.effects {
            if let Err(e) = self.execute_effect(effect).await {
                tracing::error!(
                    conversation_id = self.context.conversation_id,
                    error = %e,
                    "Failed to persist"
                );
            }
        }

        EventOutcome {
            response: result.response,
            session: self.session.clone(),
        }
    }

    async fn execute_effect(&self, effect: Effect) -> Result<(), String> {
        match effect {
            Effect::PersistSession => {
                self.storage
                    .save_session(self.context.conversation_id, &self.session)
                    .await
            }
            Effect::RegisterDriver { group, driver } => {
                // Stored before it is claimable, so every claim finds its row
                let stored = self.storage.insert_driver(&group, &driver).await;
                self.registry.add_driver(driver);
                stored
            }
            Effect::PersistClaim { driver_id } => {
                let conversation_id = self.context.conversation_id;
                self.storage
                    .save_session_with_claim(conversation_id, &self.session, &driver_id)
                    .await
            }
            Effect::PersistSeatRelease { driver_id, count } => {
                self.storage.release_seats(&driver_id, count).await
            }
        }
    }
}
