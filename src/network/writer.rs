//! Client Writer: the single consumer of a client's outbound queue.
//!
//! Isolated from the registry and from room queues on purpose — see
//! SPEC_FULL.md §4.2. It only ever touches the transport and the two
//! channels handed to it at spawn time.

use crate::state::ControlFrame;
use crate::wire::ServerMessage;
use futures_util::SinkExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, warn};

pub async fn run(
    mut sink: futures_util::stream::SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outgoing: mpsc::Receiver<Arc<ServerMessage>>,
    mut control: mpsc::UnboundedReceiver<ControlFrame>,
) {
    loop {
        // Control messages (the slow-client eviction frame) are offered
        // ahead of the client's own traffic, and mark this as the writer's
        // last iteration: a control frame is always terminal.
        let (msg, done, is_control) = tokio::select! {
            biased;
            Some((msg, done)) = control.recv() => (msg, Some(done), true),
            Some(msg) = outgoing.recv() => (msg, None, false),
            else => break,
        };

        let write_result = sink.send(Message::Text(msg.to_json())).await;

        // Signal completion whether the write succeeded or not — the
        // evicting caller only needs to know the writer is done trying, not
        // that delivery succeeded, before it proceeds to tear the task down.
        if let Some(done) = done {
            let _ = done.send(());
        }

        if let Err(e) = write_result {
            match e {
                tokio_tungstenite::tungstenite::Error::ConnectionClosed
                | tokio_tungstenite::tungstenite::Error::AlreadyClosed => {
                    debug!("writer: transport closed");
                }
                other => {
                    warn!(error = %other, "writer: write error");
                }
            }
            break;
        }

        if is_control {
            break;
        }
    }
}
