//! Runtime for executing conversations
//!
//! One task per conversation id owns that conversation's session and handles
//! its events in order. All tasks share the process registries, whose seat
//! claims are atomic on their own. A task that sits idle past the configured
//! timeout stops; the next event for its conversation starts a fresh one from
//! storage.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{Command, ConversationRuntime, EventOutcome};
pub use traits::*;

use crate::registry::{DriverListing, Registries, RegistryScope};
use crate::state_machine::{ConversationId, Event, Session, SessionContext};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch, RwLock};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Conversation runtime for {0} is gone")]
    RuntimeGone(ConversationId),
}

/// Behavior switches shared by every conversation
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeSettings {
    pub restore_seats_on_reset: bool,
    /// Stop a conversation task after this long without events; `None` keeps it forever
    pub idle_timeout: Option<Duration>,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    pub command_tx: mpsc::Sender<Command>,
    /// Closed once the task has finished every queued command
    stopped: watch::Receiver<()>,
}

impl ConversationHandle {
    fn accepts_commands(&self) -> bool {
        !self.command_tx.is_closed()
    }

    fn has_stopped(&self) -> bool {
        self.stopped.has_changed().is_err()
    }

    async fn wait_stopped(&mut self) {
        // Only ever errors: the sender is dropped, never written
        let _ = self.stopped.changed().await;
    }
}

/// Manager for all conversation runtimes
pub struct RuntimeManager<S>
where
    S: Storage + Clone + 'static,
{
    storage: S,
    registries: Arc<Registries>,
    settings: RuntimeSettings,
    runtimes: RwLock<HashMap<ConversationId, ConversationHandle>>,
}

impl<S> RuntimeManager<S>
where
    S: Storage + Clone + 'static,
{
    pub fn new(storage: S, registries: Arc<Registries>, settings: RuntimeSettings) -> Self {
        Self {
            storage,
            registries,
            settings,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Build a manager with every stored driver loaded into its registry
    pub async fn load(
        storage: S,
        scope: RegistryScope,
        settings: RuntimeSettings,
    ) -> Result<Self, RuntimeError> {
        let drivers = storage
            .load_drivers()
            .await
            .map_err(RuntimeError::Storage)?;
        tracing::info!(drivers = drivers.len(), scope = ?scope, "Loaded driver registry");

        let registries = Arc::new(Registries::with_drivers(scope, drivers));
        Ok(Self::new(storage, registries, settings))
    }

    /// Get or create a runtime for a conversation
    pub async fn get_or_create(
        &self,
        conversation_id: ConversationId,
    ) -> Result<ConversationHandle, RuntimeError> {
        // Check if already running
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(&conversation_id) {
                if handle.accepts_commands() {
                    return Ok(handle.clone());
                }
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another caller may have started it while we waited for the lock
        if let Some(handle) = runtimes.get(&conversation_id) {
            if handle.accepts_commands() {
                return Ok(handle.clone());
            }
        }

        // An idle task may still be draining; its last save must land first
        if let Some(mut stale) = runtimes.remove(&conversation_id) {
            stale.wait_stopped().await;
        }
        runtimes.retain(|_, handle| !handle.has_stopped());

        let session = self
            .storage
            .load_session(conversation_id)
            .await
            .map_err(RuntimeError::Storage)?
            .unwrap_or_default();

        let group = self.registries.group_for(conversation_id);
        let registry = self.registries.get_or_create(&group);
        let context = SessionContext::new(conversation_id, group)
            .with_seat_restore(self.settings.restore_seats_on_reset);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let runtime = ConversationRuntime::new(
            context,
            session,
            registry,
            self.storage.clone(),
            command_rx,
        )
        .with_idle_timeout(self.settings.idle_timeout);

        let (stopped_tx, stopped) = watch::channel(());
        tokio::spawn(async move {
            runtime.run().await;
            drop(stopped_tx);
            tracing::info!(conversation_id, "Conversation runtime finished");
        });

        let handle = ConversationHandle {
            command_tx,
            stopped,
        };
        runtimes.insert(conversation_id, handle.clone());
        Ok(handle)
    }

    /// Queue a command, restarting the conversation's task once if it just went idle
    async fn deliver(
        &self,
        conversation_id: ConversationId,
        mut command: Command,
    ) -> Result<(), RuntimeError> {
        for _ in 0..2 {
            let handle = self.get_or_create(conversation_id).await?;
            match handle.command_tx.send(command).await {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(returned)) => command = returned,
            }
        }
        Err(RuntimeError::RuntimeGone(conversation_id))
    }

    /// Deliver an event and wait for its outcome
    pub async fn send_event(
        &self,
        conversation_id: ConversationId,
        event: Event,
    ) -> Result<EventOutcome, RuntimeError> {
        let (reply, reply_rx) = oneshot::channel();
        self.deliver(conversation_id, Command::Handle { event, reply })
            .await?;
        reply_rx
            .await
            .map_err(|_| RuntimeError::RuntimeGone(conversation_id))
    }

    /// Current session, as seen after every event already delivered
    pub async fn session(&self, conversation_id: ConversationId) -> Result<Session, RuntimeError> {
        let (reply, reply_rx) = oneshot::channel();
        self.deliver(conversation_id, Command::Snapshot { reply })
            .await?;
        reply_rx
            .await
            .map_err(|_| RuntimeError::RuntimeGone(conversation_id))
    }

    /// Drivers with free seats in the registry serving this conversation
    pub fn available_drivers(&self, conversation_id: ConversationId) -> Vec<DriverListing> {
        self.registries
            .for_conversation(conversation_id)
            .list_available_drivers()
    }
}
