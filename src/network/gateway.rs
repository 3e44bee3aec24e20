//! Gateway - TCP listener that accepts incoming connections and hands each
//! one to its own `Connection` task.

use crate::handlers::ActionRegistry;
use crate::network::connection::Connection;
use crate::state::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

pub struct Gateway {
    listener: TcpListener,
    registry: Arc<Registry>,
    actions: Arc<ActionRegistry>,
    max_frame_bytes: usize,
}

impl Gateway {
    pub async fn bind(
        addr: SocketAddr,
        registry: Arc<Registry>,
        max_frame_bytes: usize,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "gateway listening");
        Ok(Self {
            listener,
            registry,
            actions: Arc::new(ActionRegistry::new()),
            max_frame_bytes,
        })
    }

    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let registry = Arc::clone(&self.registry);
                    let actions = Arc::clone(&self.actions);
                    let max_frame_bytes = self.max_frame_bytes;

                    tokio::spawn(async move {
                        let connection =
                            Connection::new(stream, addr, registry, actions, max_frame_bytes);
                        if let Err(e) = connection.run().await {
                            error!(%addr, error = %e, "connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            }
        }
    }
}
