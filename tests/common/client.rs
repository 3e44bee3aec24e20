//! Test WebSocket client.
//!
//! Speaks the server's JSON action-frame protocol directly over a real
//! socket, for integration tests that need to assert on actual wire
//! behavior rather than driving handlers in-process.

#![allow(dead_code)]

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type ClientWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
pub type ClientReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A test WebSocket client.
pub struct TestClient {
    writer: ClientWriter,
    reader: ClientReader,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let (ws, _response) = tokio_tungstenite::connect_async(format!("ws://{address}/")).await?;
        let (writer, reader) = ws.split();
        Ok(Self { writer, reader })
    }

    /// Send a JSON action frame.
    pub async fn send(&mut self, frame: Value) -> anyhow::Result<()> {
        self.writer.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Receive a single JSON frame from the server.
    pub async fn recv(&mut self) -> anyhow::Result<Value> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a JSON frame with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Value> {
        let msg = timeout(dur, self.reader.next())
            .await?
            .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
        match msg {
            Message::Text(text) => Ok(serde_json::from_str(&text)?),
            other => anyhow::bail!("unexpected frame: {other:?}"),
        }
    }

    /// Receive frames until `predicate` returns true, returning everything
    /// seen along the way (predicate included).
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<Value>>
    where
        F: FnMut(&Value) -> bool,
    {
        let mut frames = Vec::new();
        loop {
            let frame = self.recv().await?;
            let done = predicate(&frame);
            frames.push(frame);
            if done {
                break;
            }
        }
        Ok(frames)
    }

    /// Split into independent write/read halves so one half can be driven
    /// from a background task while the other keeps being used inline —
    /// needed to keep one client's own traffic flowing while it floods
    /// another, stalled, client.
    pub fn split(self) -> (ClientWriter, ClientReader) {
        (self.writer, self.reader)
    }
}

/// Receive one JSON frame off a raw reader half, with a timeout.
pub async fn recv_one(reader: &mut ClientReader, dur: Duration) -> anyhow::Result<Value> {
    let msg = timeout(dur, reader.next())
        .await?
        .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
    match msg {
        Message::Text(text) => Ok(serde_json::from_str(&text)?),
        other => anyhow::bail!("unexpected frame: {other:?}"),
    }
}
