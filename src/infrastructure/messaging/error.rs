//! Broker errors

use thiserror::Error;

/// Failures inside the messaging layer. None of these leave the publisher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Exchange already exists with a different kind
    #[error("Topology conflict: {0}")]
    TopologyConflict(String),

    #[error("Publish rejected by broker: {0}")]
    PublishRejected(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Broker error: {0}")]
    Other(String),
}

impl BrokerError {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            BrokerError::Unavailable(_) => "unavailable",
            BrokerError::ChannelClosed(_) => "channel_closed",
            BrokerError::TopologyConflict(_) => "topology_conflict",
            BrokerError::PublishRejected(_) => "rejected",
            BrokerError::Timeout(_) => "timeout",
            BrokerError::Serialization(_) => "serialization",
            BrokerError::Other(_) => "other",
        }
    }
}
