// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;
use std::time::Duration;

use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::broker::error::BrokerError;
use crate::broker::messages::Message;
use crate::broker::topology::{Exchange, ExchangeTopology};

/// 连接重试策略
#[derive(Debug, Clone)]
pub struct ConnectPolicy {
    /// 最大尝试次数
    pub attempts: u32,
    /// 初始退避时间
    pub initial_delay: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl ConnectPolicy {
    /// 计算指定尝试后的退避时间
    ///
    /// `attempt` is 1-based: delay = initial * 2^(attempt - 1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay * 2u32.pow(attempt.saturating_sub(1))
    }
}

/// 连接状态
///
/// "Not connected" is a named state, not an implicit null: publish is a
/// silent no-op in it and tests assert on it through `is_connected`.
enum BrokerState {
    NotConnected,
    Connected {
        // Held to keep the connection alive for the channel's lifetime.
        _connection: Connection,
        channel: Channel,
    },
}

/// 消息代理客户端
///
/// 独占持有连接和通道，组合交换机拓扑与消息编解码
pub struct Broker {
    addr: String,
    policy: ConnectPolicy,
    state: BrokerState,
    topology: ExchangeTopology,
}

impl Broker {
    /// 创建新的客户端实例，使用默认重试策略
    pub fn new(addr: &str) -> Self {
        Self::with_policy(addr, ConnectPolicy::default())
    }

    /// 创建新的客户端实例，使用自定义重试策略
    pub fn with_policy(addr: &str, policy: ConnectPolicy) -> Self {
        Self {
            addr: addr.to_string(),
            policy,
            state: BrokerState::NotConnected,
            topology: ExchangeTopology::default(),
        }
    }

    /// 当前是否持有存活的连接和通道
    pub fn is_connected(&self) -> bool {
        matches!(self.state, BrokerState::Connected { .. })
    }

    /// 建立连接并打开通道
    ///
    /// Retries up to the policy's bound with exponential backoff, sleeping
    /// after every failed attempt, then fails with `Connection` carrying
    /// the last underlying error. Channel creation is not retried. A
    /// successful connect discards all previous exchange declarations.
    pub async fn connect(&mut self) -> Result<(), BrokerError> {
        let mut last_error = None;

        for attempt in 1..=self.policy.attempts {
            match Connection::connect(&self.addr, ConnectionProperties::default()).await {
                Ok(connection) => {
                    let channel =
                        connection
                            .create_channel()
                            .await
                            .map_err(|error| BrokerError::Channel {
                                addr: self.addr.clone(),
                                detail: error.to_string(),
                            })?;

                    self.topology.reset();
                    self.state = BrokerState::Connected {
                        _connection: connection,
                        channel,
                    };
                    info!("Connected to RabbitMQ. addr: {}", self.addr);
                    return Ok(());
                }
                Err(error) => {
                    warn!("Trying to connect to RabbitMQ. attempt {}", attempt);
                    last_error = Some(error);
                    sleep(self.policy.delay_for(attempt)).await;
                }
            }
        }

        Err(BrokerError::Connection {
            addr: self.addr.clone(),
            detail: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    /// 发布消息到指定交换机
    ///
    /// When not connected this is a deliberate silent no-op: callers must
    /// not rely on publish to report "not connected".
    pub async fn publish(&mut self, exchange: Exchange, message: &Message) -> Result<(), BrokerError> {
        if !self.is_connected() {
            return Ok(());
        }

        self.ensure_declared(exchange)
            .await
            .map_err(|error| publish_error(exchange, message, error))?;

        let payload = message
            .encode()
            .map_err(|error| publish_error(exchange, message, error))?;

        let BrokerState::Connected { channel, .. } = &self.state else {
            return Ok(());
        };

        // The exchange name doubles as the routing key: direct, 1:1 topology.
        channel
            .basic_publish(
                exchange.as_str(),
                exchange.as_str(),
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default(),
            )
            .await
            .map_err(|error| publish_error(exchange, message, error))?;

        Ok(())
    }

    /// 订阅指定交换机
    ///
    /// Declares the exchange if needed, binds a server-named exclusive
    /// queue with the exchange name as the binding key and starts a
    /// consumer. Subscription lasts for the lifetime of the channel.
    pub async fn subscribe(&mut self, exchange: Exchange) -> Result<Subscription, BrokerError> {
        if !self.is_connected() {
            return Err(subscribe_error(exchange, "not connected"));
        }

        self.ensure_declared(exchange)
            .await
            .map_err(|error| subscribe_error(exchange, error))?;

        let BrokerState::Connected { channel, .. } = &self.state else {
            return Err(subscribe_error(exchange, "not connected"));
        };

        let options = QueueDeclareOptions {
            exclusive: true,
            ..QueueDeclareOptions::default()
        };
        let queue = channel
            .queue_declare("", options, FieldTable::default())
            .await
            .map_err(|error| subscribe_error(exchange, error))?;
        let queue_name = queue.name().as_str();

        channel
            .queue_bind(
                queue_name,
                exchange.as_str(),
                exchange.as_str(),
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|error| subscribe_error(exchange, error))?;

        let consumer = channel
            .basic_consume(
                queue_name,
                queue_name,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|error| subscribe_error(exchange, error))?;

        Ok(Subscription { inner: consumer })
    }

    /// 确保交换机在当前连接上已声明
    ///
    /// Declares the exchange (durable, direct) only the first time it is
    /// asked for per connection.
    async fn ensure_declared(&mut self, exchange: Exchange) -> Result<(), lapin::Error> {
        if self.topology.is_declared(exchange) {
            return Ok(());
        }

        let BrokerState::Connected { channel, .. } = &self.state else {
            return Ok(());
        };

        let options = ExchangeDeclareOptions {
            durable: true,
            ..ExchangeDeclareOptions::default()
        };
        channel
            .exchange_declare(
                exchange.as_str(),
                ExchangeKind::Direct,
                options,
                FieldTable::default(),
            )
            .await?;

        self.topology.mark_declared(exchange);
        Ok(())
    }
}

fn publish_error(exchange: Exchange, message: &Message, error: impl fmt::Display) -> BrokerError {
    BrokerError::Publish {
        exchange,
        message: message.name(),
        detail: error.to_string(),
    }
}

fn subscribe_error(exchange: Exchange, error: impl fmt::Display) -> BrokerError {
    BrokerError::Subscribe {
        exchange,
        detail: error.to_string(),
    }
}

/// 订阅产生的投递流
///
/// The worker pulls one payload at a time, so handling is serialized: a
/// job runs to completion before the next delivery is taken.
pub struct Subscription {
    inner: lapin::Consumer,
}

impl Subscription {
    /// 获取下一条投递的消息负载
    ///
    /// Acks each delivery as it is yielded. Returns `None` when the
    /// underlying delivery stream ends, which happens when the connection
    /// drops.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        while let Some(delivery) = self.inner.next().await {
            match delivery {
                Ok(delivery) => {
                    if let Err(error) = delivery.ack(BasicAckOptions::default()).await {
                        error!("broker.subscription.basic_ack. {}", error);
                    }

                    return Some(delivery.data);
                }
                Err(error) => {
                    error!("broker.subscription. {}", error);
                }
            }
        }

        None
    }
}
