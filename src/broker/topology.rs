// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::fmt;

/// 交换机标识
///
/// 系统只使用两个持久化的direct交换机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    /// 抓取任务入口
    Scraper,
    /// 通知出口
    Bot,
}

impl Exchange {
    /// 线上交换机名称，同时用作路由键和绑定键
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Scraper => "scraper",
            Exchange::Bot => "bot",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 当前连接上已声明的交换机集合
///
/// The set belongs to one live connection: entries are added the first time
/// an exchange is used and the whole set is discarded on reconnection.
#[derive(Debug, Default)]
pub struct ExchangeTopology {
    declared: HashSet<Exchange>,
}

impl ExchangeTopology {
    /// 交换机是否已在当前连接上声明
    pub fn is_declared(&self, exchange: Exchange) -> bool {
        self.declared.contains(&exchange)
    }

    /// 记录交换机已声明
    ///
    /// Returns true exactly the first time per connection; the caller then
    /// performs the declaration call against the transport.
    pub fn mark_declared(&mut self, exchange: Exchange) -> bool {
        self.declared.insert(exchange)
    }

    /// 清空声明集合，新连接上没有任何已声明的交换机
    pub fn reset(&mut self) {
        self.declared.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_wire_names() {
        assert_eq!(Exchange::Scraper.as_str(), "scraper");
        assert_eq!(Exchange::Bot.as_str(), "bot");
        assert_eq!(Exchange::Bot.to_string(), "bot");
    }

    #[test]
    fn test_mark_declared_is_idempotent_per_connection() {
        let mut topology = ExchangeTopology::default();

        assert!(!topology.is_declared(Exchange::Scraper));
        assert!(topology.mark_declared(Exchange::Scraper));

        // Repeated calls on the same connection never ask for a second
        // declaration.
        for _ in 0..10 {
            assert!(!topology.mark_declared(Exchange::Scraper));
        }
        assert!(topology.is_declared(Exchange::Scraper));
    }

    #[test]
    fn test_exchanges_are_tracked_independently() {
        let mut topology = ExchangeTopology::default();

        assert!(topology.mark_declared(Exchange::Scraper));
        assert!(!topology.is_declared(Exchange::Bot));
        assert!(topology.mark_declared(Exchange::Bot));
    }

    #[test]
    fn test_reset_forgets_declarations() {
        let mut topology = ExchangeTopology::default();

        assert!(topology.mark_declared(Exchange::Scraper));
        topology.reset();

        assert!(!topology.is_declared(Exchange::Scraper));
        // After a reconnection the next use declares exactly once again.
        assert!(topology.mark_declared(Exchange::Scraper));
        assert!(!topology.mark_declared(Exchange::Scraper));
    }
}
