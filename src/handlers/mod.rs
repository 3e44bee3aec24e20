//! Action Handlers and the fixed dispatch table that routes to them.
//!
//! One handler per client→server action name (SPEC_FULL.md §6). The
//! connection handler owns translating a handler's `Result` into the
//! wire-level disposition (§7): client-input errors become an `error`
//! frame and the connection continues either way.

mod messaging;
mod rooms;
mod username;

use crate::error::ActionError;
use crate::state::Registry;
use crate::wire::{ClientFrame, ServerMessage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

/// Everything a handler needs: who's asking, and the shared state.
pub struct Context {
    pub registry: Arc<Registry>,
    pub conn_id: String,
    pub addr: SocketAddr,
}

impl Context {
    /// Best-effort reply into the sender's own outbound queue. A full queue
    /// here means the client is already drowning in its own traffic; the
    /// room dispatcher's eviction path is what handles that case generally,
    /// so a direct reply that can't be enqueued is simply dropped.
    pub fn reply(&self, message: ServerMessage) {
        if let Some(client) = self.registry.get_client(&self.conn_id) {
            let _ = client.outgoing.try_send(Arc::new(message));
        }
    }
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, ctx: &Context, frame: &ClientFrame) -> Result<(), ActionError>;
}

/// Outcome of dispatching one frame, for the connection handler to log and
/// turn into wire behavior.
pub enum DispatchOutcome {
    Handled,
    UnknownAction(String),
    ClientError(ActionError),
}

pub struct ActionRegistry {
    handlers: HashMap<&'static str, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn ActionHandler>> = HashMap::new();
        handlers.insert("set_username", Box::new(username::SetUsername));
        handlers.insert("create_room", Box::new(rooms::CreateRoom));
        handlers.insert("list_rooms", Box::new(rooms::ListRooms));
        handlers.insert("join", Box::new(rooms::Join));
        handlers.insert("leave", Box::new(rooms::Leave));
        handlers.insert("message", Box::new(messaging::SendMessage));
        handlers.insert("private_message", Box::new(messaging::PrivateMessage));
        Self { handlers }
    }

    pub async fn dispatch(&self, ctx: &Context, frame: &ClientFrame) -> DispatchOutcome {
        let Some(handler) = self.handlers.get(frame.action.as_str()) else {
            return DispatchOutcome::UnknownAction(frame.action.clone());
        };

        match handler.handle(ctx, frame).await {
            Ok(()) => DispatchOutcome::Handled,
            Err(e) => DispatchOutcome::ClientError(e),
        }
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
