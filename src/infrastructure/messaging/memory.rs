//! In-process broker
//!
//! Mirrors the AMQP behaviours the publisher relies on: idempotent declares,
//! channel closure on an exchange kind conflict, mandatory returns for
//! unroutable messages, and connections that die when the broker goes away.
//! Backs the publisher and API tests; the binary always speaks AMQP.

use super::error::BrokerError;
use super::topology::ExchangeKind;
use super::transport::{
    BrokerChannel, BrokerConnection, BrokerTransport, PublishOutcome, PublishRequest,
};
use crate::config::BrokerConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const NO_ROUTE: u16 = 312;

/// A message sitting in an in-memory queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub exchange: String,
    pub routing_key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub persistent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    exchange: String,
    queue: String,
    routing_key: String,
}

#[derive(Debug, Default)]
struct BrokerState {
    exchanges: HashMap<String, ExchangeKind>,
    queues: HashMap<String, Vec<DeliveredMessage>>,
    bindings: Vec<Binding>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<BrokerState>,
    reachable: AtomicBool,
    /// Bumped whenever every live connection must be considered dead
    generation: AtomicU64,
    connects: AtomicUsize,
    publish_failures: AtomicUsize,
    exchange_delete_failures: AtomicUsize,
    exchange_declares: AtomicUsize,
    exchange_deletes: AtomicUsize,
}

/// In-memory broker; clones share the same state
#[derive(Debug, Clone)]
pub struct InMemoryBroker {
    shared: Arc<Shared>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BrokerState::default()),
                reachable: AtomicBool::new(true),
                generation: AtomicU64::new(0),
                connects: AtomicUsize::new(0),
                publish_failures: AtomicUsize::new(0),
                exchange_delete_failures: AtomicUsize::new(0),
                exchange_declares: AtomicUsize::new(0),
                exchange_deletes: AtomicUsize::new(0),
            }),
        }
    }

    /// Take the broker down (or bring it back). Going down kills every live
    /// connection.
    pub fn set_reachable(&self, reachable: bool) {
        self.shared.reachable.store(reachable, Ordering::SeqCst);
        if !reachable {
            self.drop_connections();
        }
    }

    /// Sever every live connection while staying reachable
    pub fn drop_connections(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Make the next `count` publishes fail with a closed channel
    pub fn fail_next_publishes(&self, count: usize) {
        self.shared.publish_failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` exchange deletions fail and close the channel
    pub fn fail_next_exchange_deletes(&self, count: usize) {
        self.shared
            .exchange_delete_failures
            .store(count, Ordering::SeqCst);
    }

    /// Exchange declarations attempted so far, rejected ones included
    pub fn exchange_declare_count(&self) -> usize {
        self.shared.exchange_declares.load(Ordering::SeqCst)
    }

    /// Exchange deletions attempted so far, failed ones included
    pub fn exchange_delete_count(&self) -> usize {
        self.shared.exchange_deletes.load(Ordering::SeqCst)
    }

    /// Number of successful connection attempts so far
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Pre-create an exchange, e.g. one left behind with another kind
    pub async fn seed_exchange(&self, name: &str, kind: ExchangeKind) {
        let mut state = self.shared.state.lock().await;
        state.exchanges.insert(name.to_string(), kind);
    }

    pub async fn exchange_kind(&self, name: &str) -> Option<ExchangeKind> {
        self.shared.state.lock().await.exchanges.get(name).copied()
    }

    pub async fn exchange_count(&self) -> usize {
        self.shared.state.lock().await.exchanges.len()
    }

    pub async fn queue_count(&self) -> usize {
        self.shared.state.lock().await.queues.len()
    }

    pub async fn binding_count(&self) -> usize {
        self.shared.state.lock().await.bindings.len()
    }

    /// Messages currently held by a queue
    pub async fn messages(&self, queue: &str) -> Vec<DeliveredMessage> {
        self.shared
            .state
            .lock()
            .await
            .queues
            .get(queue)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl BrokerTransport for InMemoryBroker {
    async fn connect(
        &self,
        config: &BrokerConfig,
    ) -> Result<Box<dyn BrokerConnection>, BrokerError> {
        if !self.shared.reachable.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable(format!(
                "connection refused: {}:{}",
                config.host, config.port
            )));
        }
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        debug!("In-memory broker accepted connection");

        Ok(Box::new(MemoryConnection {
            shared: self.shared.clone(),
            generation: self.shared.generation.load(Ordering::SeqCst),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
    generation: u64,
    closed: Arc<AtomicBool>,
}

fn connection_alive(shared: &Shared, generation: u64, closed: &AtomicBool) -> bool {
    !closed.load(Ordering::SeqCst) && shared.generation.load(Ordering::SeqCst) == generation
}

#[async_trait]
impl BrokerConnection for MemoryConnection {
    fn is_open(&self) -> bool {
        connection_alive(&self.shared, self.generation, &self.closed)
    }

    async fn open_channel(&self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        if !self.is_open() {
            return Err(BrokerError::Unavailable("connection is closed".to_string()));
        }
        Ok(Box::new(MemoryChannel {
            shared: self.shared.clone(),
            generation: self.generation,
            connection_closed: self.closed.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct MemoryChannel {
    shared: Arc<Shared>,
    generation: u64,
    connection_closed: Arc<AtomicBool>,
    closed: AtomicBool,
}

impl MemoryChannel {
    fn ensure_open(&self) -> Result<(), BrokerError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(BrokerError::ChannelClosed("channel is closed".to_string()))
        }
    }

    /// Channel-level protocol errors close the channel, as on a real broker
    fn fail(&self, error: BrokerError) -> BrokerError {
        self.closed.store(true, Ordering::SeqCst);
        error
    }
}

#[async_trait]
impl BrokerChannel for MemoryChannel {
    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
            && connection_alive(&self.shared, self.generation, &self.connection_closed)
    }

    async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        _durable: bool,
    ) -> Result<(), BrokerError> {
        self.ensure_open()?;
        self.shared.exchange_declares.fetch_add(1, Ordering::SeqCst);
        let mut state = self.shared.state.lock().await;
        match state.exchanges.get(name) {
            Some(existing) if *existing != kind => Err(self.fail(BrokerError::TopologyConflict(
                format!(
                    "PRECONDITION_FAILED - inequivalent arg 'type' for exchange '{}': received '{}' but current is '{}'",
                    name, kind, existing
                ),
            ))),
            Some(_) => Ok(()),
            None => {
                state.exchanges.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    async fn delete_exchange(&self, name: &str) -> Result<(), BrokerError> {
        self.ensure_open()?;
        self.shared.exchange_deletes.fetch_add(1, Ordering::SeqCst);

        let pending_failures = self.shared.exchange_delete_failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.shared
                .exchange_delete_failures
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(self.fail(BrokerError::Other(format!(
                "ACCESS_REFUSED - cannot delete exchange '{}'",
                name
            ))));
        }

        let mut state = self.shared.state.lock().await;
        state.exchanges.remove(name);
        state.bindings.retain(|b| b.exchange != name);
        Ok(())
    }

    async fn declare_queue(&self, name: &str, _durable: bool) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut state = self.shared.state.lock().await;
        state.queues.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_queue(&self, name: &str) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut state = self.shared.state.lock().await;
        state.queues.remove(name);
        state.bindings.retain(|b| b.queue != name);
        Ok(())
    }

    async fn bind_queue(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut state = self.shared.state.lock().await;
        if !state.exchanges.contains_key(exchange) || !state.queues.contains_key(queue) {
            return Err(self.fail(BrokerError::Other(format!(
                "NOT_FOUND - cannot bind '{}' to '{}'",
                queue, exchange
            ))));
        }
        let binding = Binding {
            exchange: exchange.to_string(),
            queue: queue.to_string(),
            routing_key: routing_key.to_string(),
        };
        if !state.bindings.contains(&binding) {
            state.bindings.push(binding);
        }
        Ok(())
    }

    async fn publish(&self, request: PublishRequest<'_>) -> Result<PublishOutcome, BrokerError> {
        self.ensure_open()?;

        let pending_failures = self.shared.publish_failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.shared
                .publish_failures
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(self.fail(BrokerError::ChannelClosed(
                "channel closed by broker".to_string(),
            )));
        }

        let mut state = self.shared.state.lock().await;
        let kind = match state.exchanges.get(request.exchange) {
            Some(kind) => *kind,
            None => {
                return Err(self.fail(BrokerError::ChannelClosed(format!(
                    "NOT_FOUND - no exchange '{}'",
                    request.exchange
                ))))
            }
        };

        let targets: Vec<String> = state
            .bindings
            .iter()
            .filter(|b| b.exchange == request.exchange)
            .filter(|b| kind == ExchangeKind::Fanout || b.routing_key == request.routing_key)
            .map(|b| b.queue.clone())
            .collect();

        if targets.is_empty() {
            return Ok(if request.mandatory {
                PublishOutcome::Unroutable {
                    reply_code: NO_ROUTE,
                    reply_text: "NO_ROUTE".to_string(),
                }
            } else {
                PublishOutcome::Confirmed
            });
        }

        let message = DeliveredMessage {
            exchange: request.exchange.to_string(),
            routing_key: request.routing_key.to_string(),
            body: request.body.to_vec(),
            content_type: request.content_type.to_string(),
            persistent: request.persistent,
        };
        for queue in targets {
            state.queues.entry(queue).or_default().push(message.clone());
        }
        Ok(PublishOutcome::Confirmed)
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
