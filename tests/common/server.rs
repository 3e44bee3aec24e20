//! Test server management.
//!
//! Spawns and manages `chatrelay` instances for integration testing.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::time::sleep;

/// A test server instance: a real `chatrelay` process listening on a
/// loopback port chosen by the caller, with its own throwaway config file.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: PathBuf,
}

impl TestServer {
    /// Spawn a new test server with the given queue capacity and frame-size
    /// limit, both left configurable because the backpressure/eviction
    /// scenarios need a small `outbound_queue_capacity` to provoke in finite
    /// time.
    pub async fn spawn(port: u16, outbound_queue_capacity: usize) -> anyhow::Result<Self> {
        let data_dir = std::env::temp_dir().join(format!("chatrelay-test-{}", port));
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join("config.toml");
        let config_content = format!(
            r#"
[server]
listen = "127.0.0.1:{port}"
outbound_queue_capacity = {outbound_queue_capacity}
max_frame_bytes = 8388608
log_format = "pretty"
"#,
        );
        std::fs::write(&config_path, config_content)?;

        let binary_path = PathBuf::from(env!("CARGO_BIN_EXE_chatrelay"));
        let child = Command::new(&binary_path)
            .arg(&config_path)
            .spawn()?;

        let server = Self {
            child,
            port,
            data_dir,
        };
        server.wait_until_ready().await?;
        Ok(server)
    }

    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server failed to start within 5 seconds")
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address()).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}
