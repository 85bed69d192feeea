//! Self-healing car event publisher
//!
//! One connection/channel pair per publisher, created lazily and guarded by a
//! single async mutex so concurrent requests never share the channel
//! unsynchronized. Every failure is logged and swallowed; the broken
//! connection is discarded and the next publish starts from scratch.
//!
//! ```text
//! Uninitialized --publish/init--> TopologyPending --declared--> Ready
//! TopologyPending --kind mismatch--> Repairing --redeclared--> Ready
//! Repairing --repair failed--> TopologyPending
//! Ready --publish failure / connection lost--> TopologyPending
//! ```

use super::error::BrokerError;
use super::topology::Topology;
use super::transport::{
    BrokerChannel, BrokerConnection, BrokerTransport, PublishOutcome, PublishRequest,
};
use crate::config::BrokerConfig;
use crate::domain::car::{CarEvent, CarEventPublisher};
use async_trait::async_trait;
use metrics::counter;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const CONTENT_TYPE_JSON: &str = "application/json";

/// Lifecycle of a publisher instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    /// No I/O has happened yet
    Uninitialized,
    /// Connection may or may not exist; topology still has to be declared
    TopologyPending,
    /// Tearing down an exchange of the wrong kind and redeclaring it
    Repairing,
    /// Topology declared on the current channel
    Ready,
}

struct Link {
    connection: Box<dyn BrokerConnection>,
    channel: Box<dyn BrokerChannel>,
}

impl Link {
    fn is_open(&self) -> bool {
        self.connection.is_open() && self.channel.is_open()
    }
}

struct Inner {
    state: PublisherState,
    link: Option<Link>,
}

/// Publishes `CarEvent`s to a broker exchange
pub struct BrokerPublisher {
    config: BrokerConfig,
    topology: Topology,
    transport: Arc<dyn BrokerTransport>,
    inner: Mutex<Inner>,
}

impl BrokerPublisher {
    /// Create a publisher. No network I/O happens until `init` or the first
    /// publish.
    pub fn new(config: BrokerConfig, transport: Arc<dyn BrokerTransport>) -> Self {
        let topology = config.topology();
        Self {
            config,
            topology,
            transport,
            inner: Mutex::new(Inner {
                state: PublisherState::Uninitialized,
                link: None,
            }),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub async fn state(&self) -> PublisherState {
        self.inner.lock().await.state
    }

    /// Connect and declare topology ahead of the first publish. Never fails:
    /// on error the publisher stays `TopologyPending` and retries on the next
    /// publish.
    pub async fn init(&self) {
        let mut inner = self.inner.lock().await;
        match self.ensure_ready(&mut inner).await {
            Ok(()) => info!(
                "Broker topology ready: exchange '{}' ({}) -> queue '{}'",
                self.topology.exchange, self.topology.kind, self.topology.queue
            ),
            Err(e) => {
                error!(error = %e, "Failed to prepare broker topology at startup");
                warn!("Topology will be declared on the first published event");
                self.discard_link(&mut inner).await;
            }
        }
    }

    /// Close channel and connection; the publisher can be used again
    /// afterwards and will reconnect lazily.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        self.discard_link(&mut inner).await;
        inner.state = PublisherState::Uninitialized;
        info!("Broker publisher shut down");
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, BrokerError>
    where
        F: Future<Output = Result<T, BrokerError>>,
    {
        let limit = self.config.blocked_timeout();
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| BrokerError::Timeout(limit))?
    }

    fn channel(inner: &Inner) -> Result<&dyn BrokerChannel, BrokerError> {
        inner
            .link
            .as_ref()
            .map(|link| link.channel.as_ref())
            .ok_or_else(|| BrokerError::ChannelClosed("no open channel".to_string()))
    }

    async fn open_link(&self) -> Result<Link, BrokerError> {
        let connection = self.with_timeout(self.transport.connect(&self.config)).await?;
        let channel = self.with_timeout(connection.open_channel()).await?;
        debug!("Broker connection and channel established");
        Ok(Link {
            connection,
            channel,
        })
    }

    /// Replace the channel on the current connection with a fresh one
    async fn reopen_channel(&self, inner: &mut Inner) -> Result<(), BrokerError> {
        let mut link = inner
            .link
            .take()
            .ok_or_else(|| BrokerError::Unavailable("no connection".to_string()))?;

        if link.channel.is_open() {
            let _ = self.with_timeout(link.channel.close()).await;
        }
        if !link.connection.is_open() {
            return Err(BrokerError::Unavailable(
                "connection closed during topology repair".to_string(),
            ));
        }

        link.channel = self.with_timeout(link.connection.open_channel()).await?;
        inner.link = Some(link);
        Ok(())
    }

    /// Close and forget the current link, best effort
    async fn discard_link(&self, inner: &mut Inner) {
        if let Some(link) = inner.link.take() {
            if link.channel.is_open() {
                let _ = self.with_timeout(link.channel.close()).await;
            }
            if link.connection.is_open() {
                let _ = self.with_timeout(link.connection.close()).await;
            }
            debug!("Discarded broker connection");
        }
        if inner.state != PublisherState::Uninitialized {
            inner.state = PublisherState::TopologyPending;
        }
    }

    async fn declare(&self, channel: &dyn BrokerChannel) -> Result<(), BrokerError> {
        let topology = &self.topology;
        self.with_timeout(channel.declare_exchange(&topology.exchange, topology.kind, true))
            .await?;
        self.with_timeout(channel.declare_queue(&topology.queue, true))
            .await?;
        self.with_timeout(channel.bind_queue(
            &topology.exchange,
            &topology.queue,
            topology.routing_key(),
        ))
        .await
    }

    /// Make sure there is an open link with declared topology
    async fn ensure_ready(&self, inner: &mut Inner) -> Result<(), BrokerError> {
        if inner.state == PublisherState::Uninitialized {
            inner.state = PublisherState::TopologyPending;
        }

        let link_open = inner.link.as_ref().map(Link::is_open).unwrap_or(false);
        if !link_open {
            if inner.link.take().is_some() {
                warn!("Broker connection was closed, reconnecting");
            }
            inner.state = PublisherState::TopologyPending;
            inner.link = Some(self.open_link().await?);
        }

        if inner.state == PublisherState::Ready {
            return Ok(());
        }

        let declared = self.declare(Self::channel(inner)?).await;
        match declared {
            Ok(()) => {
                inner.state = PublisherState::Ready;
                Ok(())
            }
            Err(BrokerError::TopologyConflict(detail)) => {
                warn!(
                    "Exchange '{}' exists with another kind, recreating it as {}: {}",
                    self.topology.exchange, self.topology.kind, detail
                );
                inner.state = PublisherState::Repairing;
                counter!("broker_topology_repairs_total").increment(1);

                match self.repair(inner).await {
                    Ok(()) => {
                        inner.state = PublisherState::Ready;
                        info!(
                            "Broker topology recreated: exchange '{}' -> queue '{}'",
                            self.topology.exchange, self.topology.queue
                        );
                        Ok(())
                    }
                    Err(e) => {
                        inner.state = PublisherState::TopologyPending;
                        Err(e)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the stale queue and exchange, then declare everything again.
    /// Runs once per detected mismatch.
    async fn repair(&self, inner: &mut Inner) -> Result<(), BrokerError> {
        // The broker closed the channel when it rejected the declare.
        self.reopen_channel(inner).await?;
        {
            let channel = Self::channel(inner)?;
            if let Err(e) = self
                .with_timeout(channel.delete_queue(&self.topology.queue))
                .await
            {
                debug!(error = %e, "Could not delete old queue '{}'", self.topology.queue);
            }
            if let Err(e) = self
                .with_timeout(channel.delete_exchange(&self.topology.exchange))
                .await
            {
                warn!(error = %e, "Could not delete old exchange '{}'", self.topology.exchange);
            }
        }

        self.reopen_channel(inner).await?;
        self.declare(Self::channel(inner)?).await
    }

    async fn try_publish(
        &self,
        inner: &mut Inner,
        event: &CarEvent,
    ) -> Result<PublishOutcome, BrokerError> {
        let body = event
            .to_json()
            .map_err(|e| BrokerError::Serialization(e.to_string()))?;

        self.ensure_ready(inner).await?;

        let request = PublishRequest {
            exchange: &self.topology.exchange,
            routing_key: self.topology.routing_key(),
            body: &body,
            content_type: CONTENT_TYPE_JSON,
            persistent: true,
            mandatory: true,
        };
        self.with_timeout(Self::channel(inner)?.publish(request))
            .await
    }
}

#[async_trait]
impl CarEventPublisher for BrokerPublisher {
    async fn publish(&self, event: CarEvent) {
        let event_type = event.event_type();
        let car_id = event.car_id();
        let mut inner = self.inner.lock().await;

        match self.try_publish(&mut inner, &event).await {
            Ok(PublishOutcome::Unroutable {
                reply_code,
                reply_text,
            }) => {
                warn!(
                    event_type = %event_type,
                    car_id,
                    reply_code,
                    reply_text = %reply_text,
                    "Car event was returned by the broker as unroutable"
                );
                counter!("car_events_unroutable_total").increment(1);
            }
            Ok(_) => {
                info!(event_type = %event_type, car_id, "Car event published");
                counter!("car_events_published_total", "event_type" => event_type.as_str())
                    .increment(1);
            }
            Err(e) => {
                error!(
                    event_type = %event_type,
                    car_id,
                    error = %e,
                    "Failed to publish car event"
                );
                counter!(
                    "car_events_failed_total",
                    "event_type" => event_type.as_str(),
                    "reason" => e.reason()
                )
                .increment(1);
                if !matches!(e, BrokerError::Serialization(_)) {
                    self.discard_link(&mut inner).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::car::{Car, CarEventType};
    use crate::infrastructure::messaging::memory::InMemoryBroker;
    use crate::infrastructure::messaging::topology::ExchangeKind;

    fn car(id: i32) -> Car {
        Car {
            id,
            firm: "Lada".to_string(),
            model: "Vesta".to_string(),
            year: 2020,
            power: 106,
            color: "white".to_string(),
            price: None,
            dealer_id: 1,
        }
    }

    fn publisher(broker: &InMemoryBroker) -> BrokerPublisher {
        BrokerPublisher::new(BrokerConfig::default(), Arc::new(broker.clone()))
    }

    #[tokio::test]
    async fn test_construction_is_lazy() {
        let broker = InMemoryBroker::new();
        let publisher = publisher(&broker);

        assert_eq!(publisher.state().await, PublisherState::Uninitialized);
        assert_eq!(broker.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_first_publish_declares_and_delivers() {
        let broker = InMemoryBroker::new();
        let publisher = publisher(&broker);

        publisher
            .publish(CarEvent::new(CarEventType::Create, &car(1)))
            .await;

        assert_eq!(publisher.state().await, PublisherState::Ready);
        let messages = broker.messages("cars_events_queue").await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content_type, "application/json");
        assert!(messages[0].persistent);
        assert_eq!(messages[0].routing_key, "cars_events");
    }

    #[tokio::test]
    async fn test_connection_reused_across_publishes() {
        let broker = InMemoryBroker::new();
        let publisher = publisher(&broker);

        for id in 1..=3 {
            publisher
                .publish(CarEvent::new(CarEventType::Update, &car(id)))
                .await;
        }

        assert_eq!(broker.connect_count(), 1);
        assert_eq!(broker.messages("cars_events_queue").await.len(), 3);
    }

    #[tokio::test]
    async fn test_init_failure_is_swallowed() {
        let broker = InMemoryBroker::new();
        broker.set_reachable(false);
        let publisher = publisher(&broker);

        publisher.init().await;

        assert_eq!(publisher.state().await, PublisherState::TopologyPending);
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_repaired() {
        let broker = InMemoryBroker::new();
        broker
            .seed_exchange("cars_events_exchange", ExchangeKind::Fanout)
            .await;
        let publisher = publisher(&broker);

        publisher.init().await;

        assert_eq!(publisher.state().await, PublisherState::Ready);
        assert_eq!(
            broker.exchange_kind("cars_events_exchange").await,
            Some(ExchangeKind::Direct)
        );
    }

    #[tokio::test]
    async fn test_shutdown_resets_state() {
        let broker = InMemoryBroker::new();
        let publisher = publisher(&broker);
        publisher.init().await;

        publisher.shutdown().await;

        assert_eq!(publisher.state().await, PublisherState::Uninitialized);
    }
}
