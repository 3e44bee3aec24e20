use super::{ActionHandler, Context};
use crate::error::ActionError;
use crate::wire::{now_ts, ClientFrame, ServerMessage};
use async_trait::async_trait;
use std::sync::Arc;

pub struct SendMessage;

#[async_trait]
impl ActionHandler for SendMessage {
    async fn handle(&self, ctx: &Context, frame: &ClientFrame) -> Result<(), ActionError> {
        let room_id = frame.field_str("room_id").ok_or(ActionError::MissingField {
            action: "message",
            field: "room_id",
        })?;
        // Empty text is accepted and forwarded (SPEC_FULL.md §9).
        let text = frame.field_str("text").unwrap_or("").to_string();

        let room = ctx
            .registry
            .get_room(room_id)
            .ok_or_else(|| ActionError::RoomNotFound(room_id.to_string()))?;

        if !room.members.contains(&ctx.conn_id) {
            return Err(ActionError::NotMember);
        }

        let sender_name = ctx
            .registry
            .get_client(&ctx.conn_id)
            .and_then(|c| c.display_name())
            .unwrap_or_else(|| "Anon".to_string());

        let _ = room.inbound.send(Arc::new(ServerMessage::Message {
            room_id: room_id.to_string(),
            from: sender_name,
            text,
            ts: now_ts(),
        }));

        Ok(())
    }
}

pub struct PrivateMessage;

#[async_trait]
impl ActionHandler for PrivateMessage {
    async fn handle(&self, ctx: &Context, frame: &ClientFrame) -> Result<(), ActionError> {
        let to = frame
            .field_str("to")
            .ok_or(ActionError::PrivateRecipientMissing)?;
        let text = frame.field_str("text").unwrap_or("");
        if text.is_empty() {
            return Err(ActionError::PrivateTextEmpty);
        }

        let sender = ctx
            .registry
            .get_client(&ctx.conn_id)
            .ok_or(ActionError::NotRegistered)?;
        let sender_name = sender.display_name().unwrap_or_else(|| "Anon".to_string());

        let recipient_conn_id = ctx
            .registry
            .lookup_name(to)
            .ok_or_else(|| ActionError::PrivateRecipientOffline(to.to_string()))?;
        let recipient = ctx
            .registry
            .get_client(&recipient_conn_id)
            .ok_or_else(|| ActionError::PrivateRecipientOffline(to.to_string()))?;

        let ts = now_ts();
        let _ = recipient.outgoing.try_send(Arc::new(ServerMessage::PrivateMessage {
            from: sender_name,
            to: to.to_string(),
            text: text.to_string(),
            ts,
        }));

        ctx.reply(ServerMessage::PrivateMessageSent {
            to: to.to_string(),
            text: text.to_string(),
            ts,
        });

        Ok(())
    }
}
