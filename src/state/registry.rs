//! The process-wide registry: clients, rooms, and the unique-name index.
//!
//! Three independent concurrent maps rather than one lock, following the
//! sharded-map style the rest of this codebase uses for hot shared state.
//! Operations that must look atomic to an outside observer (register,
//! unregister, join, leave, eviction) take the lock paths needed to make
//! that true without serializing unrelated traffic behind a single mutex.

use super::client::{ClientHandle, ControlFrame};
use super::room::RoomHandle;
use crate::dispatch::spawn_dispatcher;
use crate::error::ActionError;
use crate::wire::{RoomDescriptor, RoomListEntry, ServerMessage};
use dashmap::DashMap;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct Registry {
    clients: DashMap<String, Arc<ClientHandle>>,
    rooms: DashMap<String, Arc<RoomHandle>>,
    names: DashMap<String, String>,
    outbound_capacity: usize,
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

impl Registry {
    pub fn new(outbound_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            clients: DashMap::new(),
            rooms: DashMap::new(),
            names: DashMap::new(),
            outbound_capacity,
        })
    }

    /// Allocate a client record with a null name and spawn nothing itself —
    /// the caller spawns the writer and attaches it via `attach_writer`.
    pub fn register_client(
        &self,
        addr: SocketAddr,
    ) -> (
        Arc<ClientHandle>,
        mpsc::Receiver<Arc<ServerMessage>>,
        mpsc::UnboundedReceiver<ControlFrame>,
    ) {
        let conn_id = Uuid::new_v4().to_string();
        let (outgoing_tx, outgoing_rx) = mpsc::channel(self.outbound_capacity);
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let handle = Arc::new(ClientHandle {
            conn_id: conn_id.clone(),
            addr,
            display_name: parking_lot::Mutex::new(None),
            rooms: parking_lot::Mutex::new(HashSet::new()),
            outgoing: outgoing_tx,
            control: control_tx,
            writer: parking_lot::Mutex::new(None),
        });

        self.clients.insert(conn_id, Arc::clone(&handle));
        (handle, outgoing_rx, control_rx)
    }

    pub fn attach_writer(&self, conn_id: &str, writer: tokio::task::JoinHandle<()>) {
        if let Some(client) = self.clients.get(conn_id) {
            *client.writer.lock() = Some(writer);
        }
    }

    pub fn get_client(&self, conn_id: &str) -> Option<Arc<ClientHandle>> {
        self.clients.get(conn_id).map(|e| Arc::clone(e.value()))
    }

    pub fn lookup_name(&self, name: &str) -> Option<String> {
        self.names.get(name).map(|e| e.value().clone())
    }

    pub fn get_room(&self, room_id: &str) -> Option<Arc<RoomHandle>> {
        self.rooms.get(room_id).map(|e| Arc::clone(e.value()))
    }

    pub fn list_rooms(&self) -> Vec<RoomListEntry> {
        self.rooms
            .iter()
            .map(|e| RoomListEntry {
                id: e.value().id.clone(),
                name: e.value().name.clone(),
                members: e.value().member_count(),
            })
            .collect()
    }

    /// Create a room and ensure its dispatcher is running.
    pub fn create_room(self: &Arc<Self>, name: Option<String>) -> RoomDescriptor {
        let id = short_id();
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unnamed".to_string());
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let room = Arc::new(RoomHandle {
            id: id.clone(),
            name: name.clone(),
            members: dashmap::DashSet::new(),
            inbound: inbound_tx,
            dispatcher: parking_lot::Mutex::new(None),
        });

        self.rooms.insert(id.clone(), Arc::clone(&room));

        let dispatcher = tokio::spawn(spawn_dispatcher(Arc::clone(self), id.clone(), inbound_rx));
        *room.dispatcher.lock() = Some(dispatcher);

        info!(room_id = %id, name = %name, "room created");
        RoomDescriptor { id, name }
    }

    pub fn set_username(&self, conn_id: &str, raw: &str) -> Result<String, ActionError> {
        let client = self.get_client(conn_id).ok_or(ActionError::NotRegistered)?;
        let username = raw.trim().to_string();

        if username.is_empty() {
            return Err(ActionError::UsernameEmpty);
        }
        if username.len() < 3 {
            return Err(ActionError::UsernameTooShort);
        }
        if username.len() > 20 {
            return Err(ActionError::UsernameTooLong);
        }
        if client.display_name().is_some() {
            return Err(ActionError::UsernameAlreadySet);
        }
        if self.names.contains_key(&username) {
            return Err(ActionError::UsernameTaken(username));
        }

        *client.display_name.lock() = Some(username.clone());
        self.names.insert(username.clone(), conn_id.to_string());
        Ok(username)
    }

    /// Seed a display name at join time, but only for a client that hasn't
    /// named itself yet (see SPEC_FULL.md §9).
    fn seed_display_name_if_anonymous(&self, client: &ClientHandle, proposed: Option<&str>) {
        let mut guard = client.display_name.lock();
        if guard.is_none() {
            let name = proposed
                .filter(|n| !n.is_empty())
                .unwrap_or("Anon")
                .to_string();
            *guard = Some(name);
        }
    }

    pub fn join_room(
        &self,
        conn_id: &str,
        room_id: &str,
        display_name: Option<&str>,
    ) -> Result<RoomDescriptor, ActionError> {
        let room = self
            .get_room(room_id)
            .ok_or_else(|| ActionError::RoomNotFound(room_id.to_string()))?;
        let client = self.get_client(conn_id).ok_or(ActionError::NotRegistered)?;

        if room.members.contains(conn_id) {
            return Err(ActionError::AlreadyMember);
        }

        self.seed_display_name_if_anonymous(&client, display_name);

        room.members.insert(conn_id.to_string());
        client.rooms.lock().insert(room_id.to_string());

        let name = client.display_name().unwrap_or_else(|| "Anon".to_string());
        let _ = room.inbound.send(Arc::new(ServerMessage::UserJoined {
            room_id: room_id.to_string(),
            user: name,
            ts: crate::wire::now_ts(),
        }));

        Ok(RoomDescriptor {
            id: room.id.clone(),
            name: room.name.clone(),
        })
    }

    /// Leave is silent about an unknown room and idempotent about a client
    /// that isn't a member; both match §4.5's contract.
    pub fn leave_room(&self, conn_id: &str, room_id: &str, notify: bool) {
        let Some(room) = self.get_room(room_id) else {
            return;
        };

        let was_member = room.members.remove(conn_id).is_some();
        if let Some(client) = self.get_client(conn_id) {
            client.rooms.lock().remove(room_id);
        }

        if !was_member {
            return;
        }

        if notify {
            if let Some(client) = self.get_client(conn_id) {
                if let Some(name) = client.display_name() {
                    let _ = room.inbound.send(Arc::new(ServerMessage::UserLeft {
                        room_id: room_id.to_string(),
                        user: name,
                        ts: crate::wire::now_ts(),
                    }));
                }
            }
        }
    }

    /// Idempotent: a second call on an already-removed handle is a no-op.
    pub async fn unregister_client(&self, conn_id: &str) {
        let Some((_, client)) = self.clients.remove(conn_id) else {
            return;
        };

        if let Some(name) = client.display_name() {
            self.names.remove(&name);
        }

        for room_id in client.joined_rooms() {
            self.leave_room(conn_id, &room_id, true);
        }

        let writer = client.writer.lock().take();
        if let Some(writer) = writer {
            writer.abort();
            if let Err(e) = writer.await {
                if !e.is_cancelled() {
                    warn!(conn_id = %conn_id, error = %e, "writer task panicked during unregister");
                }
            }
        }
    }
}
