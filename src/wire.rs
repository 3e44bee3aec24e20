//! JSON wire envelopes, both directions.
//!
//! Inbound frames are parsed generically (action name + loosely-typed
//! payload) rather than through a single tagged enum, because unknown
//! `action` values and missing fields are ordinary, expected traffic that
//! the connection handler must answer with an `error` frame rather than
//! a parse failure. `ServerMessage` is the strict, serializable side: every
//! frame this server ever writes is one of these variants.

use serde::Serialize;
use serde_json::Value;

/// A parsed-but-not-yet-validated inbound frame.
#[derive(Debug, Clone)]
pub struct ClientFrame {
    pub action: String,
    pub payload: Value,
}

impl ClientFrame {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let payload: Value = serde_json::from_str(raw)?;
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Self { action, payload })
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomDescriptor {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomListEntry {
    pub id: String,
    pub name: String,
    pub members: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        message: String,
    },
    UsernameSet {
        username: String,
        message: String,
    },
    RoomCreated {
        room: RoomDescriptor,
    },
    RoomsList {
        rooms: Vec<RoomListEntry>,
    },
    Joined {
        room: RoomDescriptor,
    },
    UserJoined {
        room_id: String,
        user: String,
        ts: i64,
    },
    UserLeft {
        room_id: String,
        user: String,
        ts: i64,
    },
    Message {
        room_id: String,
        from: String,
        text: String,
        ts: i64,
    },
    PrivateMessage {
        from: String,
        to: String,
        text: String,
        ts: i64,
    },
    PrivateMessageSent {
        to: String,
        text: String,
        ts: i64,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ServerMessage always serializes")
    }
}

pub fn now_ts() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
