//! AMQP client: connection lifecycle, topology declaration, publishing and
//! consuming with retry/dead-letter settlement.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    BasicQosOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::settle::{self, Settlement};
use crate::topology::{self, QueueTopology};

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

/// AMQP reply code for a normal close.
const REPLY_SUCCESS: u16 = 200;

/// Error type returned by message handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Processes one message payload. An `Err` triggers retry or dead-lettering.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError>;
}

/// A live connection plus the channel used for publishing.
struct Session {
    connection: Connection,
    channel: Channel,
}

impl Session {
    fn is_connected(&self) -> bool {
        self.connection.status().connected() && self.channel.status().connected()
    }

    async fn close(self) {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "closing").await {
            tracing::debug!(error = %e, "Channel close failed");
        }
        if let Err(e) = self.connection.close(REPLY_SUCCESS, "closing").await {
            tracing::debug!(error = %e, "Connection close failed");
        }
    }
}

/// Shared broker client. Safe to hold in an `Arc` across tasks.
pub struct QueueClient {
    config: QueueConfig,
    session: RwLock<Option<Session>>,
    /// Held for the duration of a reconnect; records the last failed attempt.
    reconnect_gate: Mutex<Option<Instant>>,
}

impl QueueClient {
    /// Create a disconnected client. Call [`connect`](Self::connect) next.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
            reconnect_gate: Mutex::new(None),
        }
    }

    /// Open a connection and declare the full topology for every message
    /// class. Replaces any previous session.
    ///
    /// Fails with [`QueueError::Timeout`] when the broker does not finish the
    /// handshake within the configured operation timeout.
    pub async fn connect(&self) -> Result<(), QueueError> {
        let timeout = self.config.operation_timeout;
        let (connection, channel) = tokio::time::timeout(timeout, open_session(&self.config.url))
            .await
            .map_err(|_| QueueError::Timeout(timeout))??;

        let previous = self
            .session
            .write()
            .await
            .replace(Session { connection, channel });
        if let Some(old) = previous {
            old.close().await;
        }

        tracing::info!("Connected to broker and declared queue topology");
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(Session::is_connected)
    }

    /// Reconnect unless already connected. Returns whether the client is
    /// usable afterwards.
    ///
    /// Concurrent callers wait on a single attempt. After a failure, calls
    /// within `reconnect_cooldown` return `false` without contacting the
    /// broker.
    pub async fn reconnect(&self) -> bool {
        if self.is_connected().await {
            return true;
        }

        let mut last_failure = self.reconnect_gate.lock().await;
        if self.is_connected().await {
            return true;
        }
        if last_failure.is_some_and(|at| at.elapsed() < self.config.reconnect_cooldown) {
            return false;
        }

        match self.connect().await {
            Ok(()) => {
                *last_failure = None;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Broker reconnect failed");
                *last_failure = Some(Instant::now());
                false
            }
        }
    }

    /// Close the channel and connection, if open.
    pub async fn close(&self) {
        let session = self.session.write().await.take();
        if let Some(session) = session {
            session.close().await;
            tracing::info!("Broker connection closed");
        }
    }

    /// Publish a persistent JSON message to a class's main queue.
    ///
    /// Returns `false` when not connected, on broker errors and when the
    /// broker nacks the message. Never fails otherwise.
    pub async fn publish<T>(&self, topology: &QueueTopology, message: &T) -> bool
    where
        T: Serialize + ?Sized + Sync,
    {
        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, queue = topology.queue, "Failed to serialize message");
                return false;
            }
        };

        match self
            .publish_bytes(topology.exchange, topology.queue, &payload, None)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(queue = topology.queue, "Broker rejected published message");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, queue = topology.queue, "Failed to publish message");
                false
            }
        }
    }

    async fn publish_bytes(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        headers: Option<FieldTable>,
    ) -> Result<bool, QueueError> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(QueueError::NotConnected)?;

        let mut properties = BasicProperties::default()
            .with_delivery_mode(PERSISTENT)
            .with_content_type("application/json".into())
            .with_timestamp(chrono::Utc::now().timestamp().max(0) as u64);
        if let Some(headers) = headers {
            properties = properties.with_headers(headers);
        }

        let confirm = async {
            let pending = session
                .channel
                .basic_publish(
                    exchange,
                    routing_key,
                    BasicPublishOptions::default(),
                    payload,
                    properties,
                )
                .await?;
            Ok::<_, QueueError>(pending.await?)
        };

        let timeout = self.config.operation_timeout;
        let confirmation = tokio::time::timeout(timeout, confirm)
            .await
            .map_err(|_| QueueError::Timeout(timeout))??;

        Ok(!confirmation.is_nack())
    }

    /// Consume a class's main queue until the stream ends or `cancel` fires.
    ///
    /// Up to `prefetch` deliveries are handled concurrently on a dedicated
    /// channel. Handler failures are settled per [`settle::settle`]; the
    /// loop itself never stops because of them.
    pub async fn consume(
        &self,
        topology: &QueueTopology,
        consumer_tag: &str,
        handler: Arc<dyn MessageHandler>,
        cancel: CancellationToken,
    ) -> Result<(), QueueError> {
        let channel = {
            let guard = self.session.read().await;
            let session = guard.as_ref().ok_or(QueueError::NotConnected)?;
            session.connection.create_channel().await?
        };

        channel
            .basic_qos(topology.prefetch, BasicQosOptions::default())
            .await?;
        let consumer = channel
            .basic_consume(
                topology.queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::info!(
            queue = topology.queue,
            prefetch = topology.prefetch,
            "Consumer started"
        );

        let processing = consumer.for_each_concurrent(usize::from(topology.prefetch), |delivery| {
            let handler = Arc::clone(&handler);
            async move {
                match delivery {
                    Ok(delivery) => self.process_delivery(topology, handler.as_ref(), delivery).await,
                    Err(e) => {
                        tracing::error!(error = %e, queue = topology.queue, "Consumer stream error");
                    }
                }
            }
        });

        tokio::select! {
            () = processing => {
                tracing::warn!(queue = topology.queue, "Consumer stream ended");
            }
            () = cancel.cancelled() => {
                tracing::info!(queue = topology.queue, "Consumer cancelled");
            }
        }

        if let Err(e) = channel.close(REPLY_SUCCESS, "consumer stopped").await {
            tracing::debug!(error = %e, "Consumer channel close failed");
        }
        Ok(())
    }

    async fn process_delivery(
        &self,
        topology: &QueueTopology,
        handler: &dyn MessageHandler,
        delivery: Delivery,
    ) {
        let retry_count = settle::retry_count(delivery.properties.headers().as_ref());
        let outcome = handler.handle(&delivery.data).await;

        if let Err(e) = &outcome {
            tracing::warn!(
                error = %e,
                queue = topology.queue,
                retry_count,
                "Message handler failed"
            );
        }

        match settle::settle(outcome.is_ok(), retry_count, topology.max_retries) {
            Settlement::Ack => ack(&delivery, topology).await,
            Settlement::Retry { attempt } => {
                let republished = self
                    .publish_bytes(
                        topology.exchange,
                        topology.retry_queue,
                        &delivery.data,
                        Some(settle::retry_headers(attempt)),
                    )
                    .await;
                match republished {
                    Ok(true) => {
                        tracing::info!(queue = topology.queue, retry_count = attempt, "Message scheduled for retry");
                        ack(&delivery, topology).await;
                    }
                    Ok(false) | Err(_) => {
                        tracing::error!(
                            queue = topology.queue,
                            retry_count,
                            "Retry republish failed, dead-lettering message"
                        );
                        dead_letter(&delivery, topology).await;
                    }
                }
            }
            Settlement::DeadLetter => {
                tracing::error!(
                    queue = topology.queue,
                    retry_count,
                    "Retry limit reached, dead-lettering message"
                );
                dead_letter(&delivery, topology).await;
            }
        }
    }
}

async fn ack(delivery: &Delivery, topology: &QueueTopology) {
    if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
        tracing::error!(error = %e, queue = topology.queue, "Failed to ack delivery");
    }
}

async fn dead_letter(delivery: &Delivery, topology: &QueueTopology) {
    let options = BasicNackOptions {
        requeue: false,
        ..Default::default()
    };
    if let Err(e) = delivery.nack(options).await {
        tracing::error!(error = %e, queue = topology.queue, "Failed to nack delivery");
    }
}

async fn open_session(url: &str) -> Result<(Connection, Channel), QueueError> {
    let connection = Connection::connect(url, ConnectionProperties::default()).await?;
    let channel = connection.create_channel().await?;
    channel
        .confirm_select(ConfirmSelectOptions::default())
        .await?;

    for topology in topology::ALL {
        declare_topology(&channel, &topology).await?;
    }
    Ok((connection, channel))
}

async fn declare_topology(channel: &Channel, topology: &QueueTopology) -> Result<(), QueueError> {
    channel
        .exchange_declare(
            topology.exchange,
            ExchangeKind::Direct,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    for (queue, args) in topology.queues() {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                args,
            )
            .await?;
        channel
            .queue_bind(
                queue,
                topology.exchange,
                queue,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
    }

    tracing::debug!(exchange = topology.exchange, queue = topology.queue, "Topology declared");
    Ok(())
}
