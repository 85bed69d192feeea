//! Messaging - car event delivery to a message broker

pub mod amqp;
pub mod error;
pub mod memory;
pub mod publisher;
pub mod topology;
pub mod transport;

pub use amqp::AmqpTransport;
pub use error::BrokerError;
pub use memory::{DeliveredMessage, InMemoryBroker};
pub use publisher::{BrokerPublisher, PublisherState};
pub use topology::{ExchangeKind, Topology};
pub use transport::{BrokerChannel, BrokerConnection, BrokerTransport, PublishOutcome, PublishRequest};
