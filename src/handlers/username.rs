use super::{ActionHandler, Context};
use crate::error::ActionError;
use crate::wire::ClientFrame;
use crate::wire::ServerMessage;
use async_trait::async_trait;

pub struct SetUsername;

#[async_trait]
impl ActionHandler for SetUsername {
    async fn handle(&self, ctx: &Context, frame: &ClientFrame) -> Result<(), ActionError> {
        let raw = frame.field_str("username").unwrap_or("");
        let username = ctx.registry.set_username(&ctx.conn_id, raw)?;

        ctx.reply(ServerMessage::UsernameSet {
            message: format!("Welcome, {}!", username),
            username,
        });
        Ok(())
    }
}
