use super::{ActionHandler, Context};
use crate::error::ActionError;
use crate::wire::{ClientFrame, RoomListEntry, ServerMessage};
use async_trait::async_trait;

pub struct CreateRoom;

#[async_trait]
impl ActionHandler for CreateRoom {
    async fn handle(&self, ctx: &Context, frame: &ClientFrame) -> Result<(), ActionError> {
        let name = frame.field_str("name").map(str::to_string);
        let room = ctx.registry.create_room(name);
        ctx.reply(ServerMessage::RoomCreated { room });
        Ok(())
    }
}

pub struct ListRooms;

#[async_trait]
impl ActionHandler for ListRooms {
    async fn handle(&self, ctx: &Context, _frame: &ClientFrame) -> Result<(), ActionError> {
        let rooms: Vec<RoomListEntry> = ctx.registry.list_rooms();
        ctx.reply(ServerMessage::RoomsList { rooms });
        Ok(())
    }
}

pub struct Join;

#[async_trait]
impl ActionHandler for Join {
    async fn handle(&self, ctx: &Context, frame: &ClientFrame) -> Result<(), ActionError> {
        let room_id = frame.field_str("room_id").ok_or(ActionError::MissingField {
            action: "join",
            field: "room_id",
        })?;
        let display_name = frame.field_str("display_name");

        let room = ctx
            .registry
            .join_room(&ctx.conn_id, room_id, display_name)?;
        ctx.reply(ServerMessage::Joined { room });
        Ok(())
    }
}

pub struct Leave;

#[async_trait]
impl ActionHandler for Leave {
    async fn handle(&self, ctx: &Context, frame: &ClientFrame) -> Result<(), ActionError> {
        let room_id = frame.field_str("room_id").ok_or(ActionError::MissingField {
            action: "leave",
            field: "room_id",
        })?;
        ctx.registry.leave_room(&ctx.conn_id, room_id, true);
        Ok(())
    }
}
