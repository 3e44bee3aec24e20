use crate::wire::ServerMessage;
use dashmap::DashSet;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One created room. Never torn down once created (see SPEC_FULL.md §9).
pub struct RoomHandle {
    pub id: String,
    pub name: String,
    pub members: DashSet<String>,
    pub inbound: mpsc::UnboundedSender<Arc<ServerMessage>>,
    pub dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl RoomHandle {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}
