//! Connection Handler: the per-connection state machine (SPEC_FULL.md §4.4).

use crate::error::ProtocolError;
use crate::handlers::{ActionRegistry, Context, DispatchOutcome};
use crate::network::writer;
use crate::state::Registry;
use crate::wire::{ClientFrame, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

pub struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<Registry>,
    actions: Arc<ActionRegistry>,
    max_frame_bytes: usize,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        registry: Arc<Registry>,
        actions: Arc<ActionRegistry>,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            stream,
            addr,
            registry,
            actions,
            max_frame_bytes,
        }
    }

    #[instrument(skip(self), fields(addr = %self.addr), name = "connection")]
    pub async fn run(self) -> anyhow::Result<()> {
        // Give tungstenite enough room to hand us an oversize frame intact,
        // so the size check below (not tungstenite's own limit) is what
        // produces the spec's `Message too large` reply.
        let config = WebSocketConfig {
            max_message_size: Some(self.max_frame_bytes + 4096),
            max_frame_size: Some(self.max_frame_bytes + 4096),
            ..Default::default()
        };
        let ws = tokio_tungstenite::accept_async_with_config(self.stream, Some(config)).await?;
        info!("client connected");

        let (sink, mut stream) = ws.split();
        let (client, outgoing_rx, control_rx) = self.registry.register_client(self.addr);
        let conn_id = client.conn_id.clone();

        let writer_handle = tokio::spawn(writer::run(sink, outgoing_rx, control_rx));
        self.registry.attach_writer(&conn_id, writer_handle);

        let ctx = Context {
            registry: Arc::clone(&self.registry),
            conn_id: conn_id.clone(),
            addr: self.addr,
        };
        ctx.reply(ServerMessage::Welcome {
            message: "Welcome to chat! Please choose a unique username (3-20 characters)."
                .to_string(),
        });

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(raw)) => self.handle_text_frame(&ctx, raw).await,
                Ok(Message::Binary(_)) => {
                    ctx.reply(ServerMessage::error(ProtocolError::InvalidJson.to_string()));
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "transport read error, closing connection");
                    break;
                }
            }
        }

        self.registry.unregister_client(&conn_id).await;
        info!("client disconnected");
        Ok(())
    }

    async fn handle_text_frame(&self, ctx: &Context, raw: String) {
        if raw.len() > self.max_frame_bytes {
            ctx.reply(ServerMessage::error(
                ProtocolError::FrameTooLarge {
                    limit: self.max_frame_bytes,
                }
                .to_string(),
            ));
            return;
        }

        let frame = match ClientFrame::parse(&raw) {
            Ok(frame) => frame,
            Err(_) => {
                ctx.reply(ServerMessage::error(ProtocolError::InvalidJson.to_string()));
                return;
            }
        };

        match self.actions.dispatch(ctx, &frame).await {
            DispatchOutcome::Handled => {}
            DispatchOutcome::UnknownAction(name) => {
                warn!(action = %name, "unknown action");
                ctx.reply(ServerMessage::error(
                    ProtocolError::UnknownAction(name).to_string(),
                ));
            }
            DispatchOutcome::ClientError(err) => {
                debug!(action = %frame.action, error = %err, "client-input error");
                ctx.reply(ServerMessage::error(err.to_string()));
            }
        }
    }
}
