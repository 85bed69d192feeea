//! Broker transport seam
//!
//! The publisher only talks to these traits. `amqp` implements them on top of
//! lapin; `memory` implements them in-process.

use super::error::BrokerError;
use super::topology::ExchangeKind;
use crate::config::BrokerConfig;
use async_trait::async_trait;

/// Message properties for a single publish
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    pub exchange: &'a str,
    pub routing_key: &'a str,
    pub body: &'a [u8],
    pub content_type: &'a str,
    /// Ask the broker to write the message to disk (delivery mode 2)
    pub persistent: bool,
    /// Ask the broker to return the message if no queue takes it
    pub mandatory: bool,
}

/// What the broker told us about a published message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Accepted and routed
    Confirmed,
    /// Accepted but returned because nothing was bound for it
    Unroutable { reply_code: u16, reply_text: String },
    /// Handed to the socket; the channel does not do confirms
    Sent,
}

/// Opens connections to a broker
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    async fn connect(&self, config: &BrokerConfig)
        -> Result<Box<dyn BrokerConnection>, BrokerError>;
}

/// A live connection
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    fn is_open(&self) -> bool;

    /// Open a channel in publisher-confirm mode
    async fn open_channel(&self) -> Result<Box<dyn BrokerChannel>, BrokerError>;

    async fn close(&self) -> Result<(), BrokerError>;
}

/// A channel on a connection
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    fn is_open(&self) -> bool;

    /// Declare an exchange. Redeclaring an identical exchange is a no-op;
    /// an existing exchange of another kind yields `TopologyConflict` and the
    /// broker closes this channel.
    async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        durable: bool,
    ) -> Result<(), BrokerError>;

    async fn delete_exchange(&self, name: &str) -> Result<(), BrokerError>;

    async fn declare_queue(&self, name: &str, durable: bool) -> Result<(), BrokerError>;

    async fn delete_queue(&self, name: &str) -> Result<(), BrokerError>;

    async fn bind_queue(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError>;

    async fn publish(&self, request: PublishRequest<'_>) -> Result<PublishOutcome, BrokerError>;

    async fn close(&self) -> Result<(), BrokerError>;
}
