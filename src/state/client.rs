use crate::wire::ServerMessage;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A control frame paired with a completion signal: the sender finds out
/// once the writer has actually handed the frame to the transport (or given
/// up trying), instead of racing an `abort()` against an unbounded `send`.
pub type ControlFrame = (Arc<ServerMessage>, tokio::sync::oneshot::Sender<()>);

/// One live connection.
///
/// `outgoing` is the bounded queue described in §5: offer-style writes,
/// full-detection used by room dispatchers to decide a client is too slow.
/// `control` is unbounded and exists only so the eviction path can hand the
/// writer a terminal frame without ever blocking on (or being rejected by)
/// the very queue that's already full. Receiving a control frame is the
/// writer's cue to stop afterward, so the oneshot it carries lets the
/// evicting caller wait for that handoff to actually happen before tearing
/// the writer task down.
pub struct ClientHandle {
    pub conn_id: String,
    pub addr: SocketAddr,
    pub display_name: Mutex<Option<String>>,
    pub rooms: Mutex<HashSet<String>>,
    pub outgoing: mpsc::Sender<Arc<ServerMessage>>,
    pub control: mpsc::UnboundedSender<ControlFrame>,
    pub writer: Mutex<Option<JoinHandle<()>>>,
}

impl ClientHandle {
    pub fn display_name(&self) -> Option<String> {
        self.display_name.lock().clone()
    }

    pub fn joined_rooms(&self) -> Vec<String> {
        self.rooms.lock().iter().cloned().collect()
    }
}
