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

use std::time::Duration;

use scraprs::broker::Broker;
use scraprs::config::settings::Settings;
use scraprs::engines::browser_engine::BrowserEngine;
use scraprs::utils::telemetry;
use scraprs::workers::scrape_worker::ScrapeWorker;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动工作器
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting scraprs...");

    // 2. Load configuration
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(error) => {
            error!("Can't load settings: {}", error);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded");

    // 3. Connect to the broker
    let mut broker = Broker::new(&settings.broker.addr);
    if let Err(error) = broker.connect().await {
        error!("{}", error);
        return Err(error.into());
    }
    info!("Broker connection established");

    // 4. Start the worker
    let engine = BrowserEngine::new(Duration::from_secs(settings.engine.timeout_secs));
    let worker = ScrapeWorker::new(engine);

    if let Err(error) = worker.run(&mut broker).await {
        error!("{}", error);
        return Err(error.into());
    }

    Ok(())
}
