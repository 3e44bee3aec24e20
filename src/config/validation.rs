//! Startup validation for `Config`, separate from parsing so all problems
//! with a config file are reported together instead of one at a time.

use super::Config;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.listen is not a valid socket address: {0}")]
    InvalidListenAddress(String),

    #[error("server.outbound_queue_capacity must be greater than zero")]
    ZeroOutboundCapacity,

    #[error("server.max_frame_bytes must be greater than zero")]
    ZeroMaxFrameBytes,
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.listen.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidListenAddress(
            config.server.listen.clone(),
        ));
    }

    if config.server.outbound_queue_capacity == 0 {
        errors.push(ValidationError::ZeroOutboundCapacity);
    }

    if config.server.max_frame_bytes == 0 {
        errors.push(ValidationError::ZeroMaxFrameBytes);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
