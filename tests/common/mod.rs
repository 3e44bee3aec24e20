//! Shared integration-test harness: a real `chatrelay` process plus a thin
//! WebSocket client, in the spirit of the crate's own unit-test style but
//! exercising the compiled binary over real sockets end to end.

pub mod client;
pub mod server;

pub use client::TestClient;
pub use server::TestServer;

use std::sync::atomic::{AtomicU16, Ordering};

static NEXT_PORT: AtomicU16 = AtomicU16::new(0);

/// A loopback port unlikely to collide with another test in this binary or
/// with whatever else happens to be listening on the machine.
pub fn unique_port() -> u16 {
    let base: u16 = 21000u16.wrapping_add((std::process::id() as u16) % 9000);
    base.wrapping_add(NEXT_PORT.fetch_add(1, Ordering::Relaxed))
}
