//! Error types for the envsim-bus crate

use crate::channel::Channel;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Bus is unreachable: {0}")]
    Unreachable(String),

    #[error("Publish to {channel} rejected: {reason}")]
    Rejected { channel: Channel, reason: String },

    #[error("Subscription to {0} is closed")]
    Closed(Channel),

    #[error("Message on {actual} cannot be decoded as a {expected} event")]
    WrongChannel { expected: Channel, actual: Channel },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BusError {
    /// Whether the failure is expected to clear on its own
    pub fn is_transient(&self) -> bool {
        matches!(self, BusError::Unreachable(_) | BusError::Rejected { .. })
    }
}
