//! AMQP 0-9-1 transport on lapin (RabbitMQ)

use super::error::BrokerError;
use super::topology::ExchangeKind;
use super::transport::{
    BrokerChannel, BrokerConnection, BrokerTransport, PublishOutcome, PublishRequest,
};
use crate::config::BrokerConfig;
use async_trait::async_trait;
use lapin::options::{
    BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, ExchangeDeleteOptions,
    QueueBindOptions, QueueDeclareOptions, QueueDeleteOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::uri::{AMQPAuthority, AMQPQueryString, AMQPScheme, AMQPUri, AMQPUserInfo};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, info};

const REPLY_SUCCESS: u16 = 200;
const PERSISTENT_DELIVERY_MODE: u8 = 2;

/// Opens lapin connections
#[derive(Debug, Default, Clone)]
pub struct AmqpTransport;

impl AmqpTransport {
    pub fn new() -> Self {
        Self
    }
}

fn build_uri(config: &BrokerConfig) -> AMQPUri {
    AMQPUri {
        scheme: AMQPScheme::AMQP,
        authority: AMQPAuthority {
            userinfo: AMQPUserInfo {
                username: config.user.clone(),
                password: config.password.clone(),
            },
            host: config.host.clone(),
            port: config.port,
        },
        vhost: config.vhost.clone(),
        query: AMQPQueryString {
            heartbeat: Some(config.heartbeat_secs),
            connection_timeout: Some(
                u64::try_from(config.blocked_timeout().as_millis()).unwrap_or(u64::MAX),
            ),
            ..Default::default()
        },
    }
}

fn map_lapin_error(e: lapin::Error) -> BrokerError {
    let message = e.to_string();
    if message.contains("inequivalent arg 'type'") {
        return BrokerError::TopologyConflict(message);
    }
    match e {
        lapin::Error::InvalidChannelState(_) => BrokerError::ChannelClosed(message),
        lapin::Error::InvalidConnectionState(_) | lapin::Error::IOError(_) => {
            BrokerError::Unavailable(message)
        }
        _ => BrokerError::Other(message),
    }
}

fn lapin_kind(kind: ExchangeKind) -> lapin::ExchangeKind {
    match kind {
        ExchangeKind::Direct => lapin::ExchangeKind::Direct,
        ExchangeKind::Fanout => lapin::ExchangeKind::Fanout,
        ExchangeKind::Topic => lapin::ExchangeKind::Topic,
    }
}

#[async_trait]
impl BrokerTransport for AmqpTransport {
    async fn connect(
        &self,
        config: &BrokerConfig,
    ) -> Result<Box<dyn BrokerConnection>, BrokerError> {
        info!(
            "Connecting to AMQP broker {}:{} (vhost: {})",
            config.host, config.port, config.vhost
        );

        let connection = Connection::connect_uri(build_uri(config), ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        Ok(Box::new(AmqpConnection { connection }))
    }
}

pub struct AmqpConnection {
    connection: Connection,
}

#[async_trait]
impl BrokerConnection for AmqpConnection {
    fn is_open(&self) -> bool {
        self.connection.status().connected()
    }

    async fn open_channel(&self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(map_lapin_error)?;

        // Confirms let us see broker-side rejections and mandatory returns.
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(map_lapin_error)?;

        debug!("Opened AMQP channel {}", channel.id());
        Ok(Box::new(AmqpChannel { channel }))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.connection
            .close(REPLY_SUCCESS, "OK")
            .await
            .map_err(map_lapin_error)
    }
}

pub struct AmqpChannel {
    channel: Channel,
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    fn is_open(&self) -> bool {
        self.channel.status().connected()
    }

    async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        durable: bool,
    ) -> Result<(), BrokerError> {
        self.channel
            .exchange_declare(
                name,
                lapin_kind(kind),
                ExchangeDeclareOptions {
                    durable,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(map_lapin_error)
    }

    async fn delete_exchange(&self, name: &str) -> Result<(), BrokerError> {
        self.channel
            .exchange_delete(name, ExchangeDeleteOptions::default())
            .await
            .map_err(map_lapin_error)
    }

    async fn declare_queue(&self, name: &str, durable: bool) -> Result<(), BrokerError> {
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable,
                    exclusive: false,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map(|_| ())
            .map_err(map_lapin_error)
    }

    async fn delete_queue(&self, name: &str) -> Result<(), BrokerError> {
        self.channel
            .queue_delete(name, QueueDeleteOptions::default())
            .await
            .map(|_| ())
            .map_err(map_lapin_error)
    }

    async fn bind_queue(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        self.channel
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(map_lapin_error)
    }

    async fn publish(&self, request: PublishRequest<'_>) -> Result<PublishOutcome, BrokerError> {
        let mut properties = BasicProperties::default().with_content_type(request.content_type.into());
        if request.persistent {
            properties = properties.with_delivery_mode(PERSISTENT_DELIVERY_MODE);
        }

        let confirm = self
            .channel
            .basic_publish(
                request.exchange,
                request.routing_key,
                BasicPublishOptions {
                    mandatory: request.mandatory,
                    ..Default::default()
                },
                request.body,
                properties,
            )
            .await
            .map_err(map_lapin_error)?;

        match confirm.await.map_err(map_lapin_error)? {
            Confirmation::Ack(None) => Ok(PublishOutcome::Confirmed),
            Confirmation::Ack(Some(returned)) => Ok(PublishOutcome::Unroutable {
                reply_code: returned.reply_code,
                reply_text: returned.reply_text.as_str().to_string(),
            }),
            Confirmation::Nack(_) => Err(BrokerError::PublishRejected(format!(
                "broker nacked message on exchange '{}'",
                request.exchange
            ))),
            Confirmation::NotRequested => Ok(PublishOutcome::Sent),
        }
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.channel
            .close(REPLY_SUCCESS, "OK")
            .await
            .map_err(map_lapin_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_carries_credentials_and_vhost() {
        let config = BrokerConfig {
            host: "rabbit".to_string(),
            port: 5673,
            user: "cars".to_string(),
            password: "secret".to_string(),
            vhost: "/".to_string(),
            heartbeat_secs: 30,
            ..Default::default()
        };

        let uri = build_uri(&config);
        assert_eq!(uri.authority.host, "rabbit");
        assert_eq!(uri.authority.port, 5673);
        assert_eq!(uri.authority.userinfo.username, "cars");
        assert_eq!(uri.vhost, "/");
        assert_eq!(uri.query.heartbeat, Some(30));
        assert_eq!(uri.query.connection_timeout, Some(300_000));
    }

    #[test]
    fn test_oversized_timeout_saturates() {
        let config = BrokerConfig {
            blocked_timeout_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(build_uri(&config).query.connection_timeout, Some(u64::MAX));
    }

    #[test]
    fn test_kind_mismatch_maps_to_topology_conflict() {
        use lapin::protocol::{AMQPError, AMQPErrorKind, AMQPSoftError};

        let err = lapin::Error::ProtocolError(AMQPError::new(
            AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED),
            "PRECONDITION_FAILED - inequivalent arg 'type' for exchange 'cars_events_exchange' in vhost '/': received 'direct' but current is 'fanout'".into(),
        ));

        assert!(matches!(map_lapin_error(err), BrokerError::TopologyConflict(_)));
    }

    #[test]
    fn test_other_precondition_failure_is_not_a_conflict() {
        use lapin::protocol::{AMQPError, AMQPErrorKind, AMQPSoftError};

        let err = lapin::Error::ProtocolError(AMQPError::new(
            AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED),
            "PRECONDITION_FAILED - inequivalent arg 'durable' for queue 'cars_events_queue'".into(),
        ));

        assert!(matches!(map_lapin_error(err), BrokerError::Other(_)));
    }

    #[test]
    fn test_io_error_maps_to_unavailable() {
        let err = lapin::Error::IOError(std::sync::Arc::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )));

        assert!(matches!(map_lapin_error(err), BrokerError::Unavailable(_)));
    }

    #[test]
    fn test_exchange_kind_mapping() {
        assert!(matches!(lapin_kind(ExchangeKind::Direct), lapin::ExchangeKind::Direct));
        assert!(matches!(lapin_kind(ExchangeKind::Fanout), lapin::ExchangeKind::Fanout));
        assert!(matches!(lapin_kind(ExchangeKind::Topic), lapin::ExchangeKind::Topic));
    }

    #[tokio::test]
    #[ignore] // Requires a running RabbitMQ
    async fn test_live_connect_and_declare() {
        let config = BrokerConfig::default();
        let connection = AmqpTransport::new().connect(&config).await.unwrap();
        let channel = connection.open_channel().await.unwrap();
        let topology = config.topology();

        channel
            .declare_exchange(&topology.exchange, topology.kind, true)
            .await
            .unwrap();
        channel.declare_queue(&topology.queue, true).await.unwrap();
        channel
            .bind_queue(&topology.exchange, &topology.queue, topology.routing_key())
            .await
            .unwrap();

        channel.close().await.unwrap();
        connection.close().await.unwrap();
    }
}
