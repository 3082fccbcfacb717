// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含消息代理和执行引擎的所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 消息代理配置
    pub broker: BrokerSettings,
    /// 引擎配置
    pub engine: EngineSettings,
}

/// 消息代理配置设置
#[derive(Debug, Deserialize)]
pub struct BrokerSettings {
    /// RabbitMQ连接地址
    pub addr: String,
}

/// 引擎配置设置
#[derive(Debug, Deserialize)]
pub struct EngineSettings {
    /// 单个任务的执行超时时间（秒）
    pub timeout_secs: u64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// The broker address has no default on purpose: a missing address must
    /// fail the load so startup aborts before any connection attempt.
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default engine settings
            .set_default("engine.timeout_secs", 30)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SCRAPRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-global, so the missing-address and
    // the loaded-address cases live in one test to avoid racing siblings.
    #[test]
    fn test_broker_addr_is_required_and_env_sourced() {
        std::env::remove_var("SCRAPRS__BROKER__ADDR");
        assert!(Settings::new().is_err());

        std::env::set_var("SCRAPRS__BROKER__ADDR", "amqp://localhost:5672");
        let settings = Settings::new().expect("settings load with addr set");

        assert_eq!(settings.broker.addr, "amqp://localhost:5672");
        assert_eq!(settings.engine.timeout_secs, 30);

        std::env::remove_var("SCRAPRS__BROKER__ADDR");
    }
}
