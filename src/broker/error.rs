// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::broker::topology::Exchange;

/// 消息代理错误类型
#[derive(Error, Debug)]
pub enum BrokerError {
    /// 连接重试耗尽
    #[error("Connection error. addr: {addr}. error: {detail}")]
    Connection { addr: String, detail: String },

    /// 连接建立后通道创建失败
    #[error("Channel error. addr: {addr}. error: {detail}")]
    Channel { addr: String, detail: String },

    /// 消息发布失败
    #[error("Publish error. exchange: {exchange}. message: {message}. error: {detail}")]
    Publish {
        exchange: Exchange,
        message: &'static str,
        detail: String,
    },

    /// 订阅建立失败
    #[error("Subscribe error. exchange: {exchange}. error: {detail}")]
    Subscribe { exchange: Exchange, detail: String },
}
