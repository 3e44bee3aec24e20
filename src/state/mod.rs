mod client;
mod registry;
mod room;

pub use client::{ClientHandle, ControlFrame};
pub use registry::Registry;
pub use room::RoomHandle;
