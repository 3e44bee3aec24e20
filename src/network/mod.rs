mod connection;
mod gateway;
mod writer;

pub use gateway::Gateway;
