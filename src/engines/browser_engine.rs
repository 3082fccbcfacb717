// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetBlockedUrLsParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::warn;

use crate::engines::traits::{EngineError, JobRunner};

// Global browser instance to avoid re-launching Chrome on every job.
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

// Asynchronously gets or initializes the shared browser instance.
// This function ensures that the browser is launched only once.
async fn get_browser() -> Result<&'static Browser, EngineError> {
    BROWSER_INSTANCE
        .get_or_try_init(|| async {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(30));

            builder = builder.arg("--disable-gpu").arg("--disable-dev-shm-usage");

            let (browser, mut handler) =
                Browser::launch(builder.build().map_err(EngineError::Other)?).await?;

            // Spawn a handler to process browser events
            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        })
        .await
}

/// 浏览器执行引擎
///
/// 基于chromiumoxide在真实页面环境中执行任务脚本
pub struct BrowserEngine {
    /// 单个任务的执行超时
    timeout: Duration,
}

impl BrowserEngine {
    /// 创建新的浏览器引擎实例
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn evaluate(&self, url: &str, script: &str) -> Result<bool, EngineError> {
        let browser = get_browser().await?;

        let page = browser.new_page("about:blank").await?;

        // goto waits for the load event by default
        page.goto(url).await?;

        // After page load, block all further network requests so the
        // untrusted script cannot trigger new fetches.
        page.execute(SetBlockedUrLsParams::new(vec!["*".to_string()]))
            .await?;

        let wrapped = format!("(() => {{ {} }})();", script);
        let result = page.evaluate(wrapped).await?;

        // Strict: only a JSON `true` counts as success.
        let succeeded = matches!(result.value(), Some(Value::Bool(true)));

        if let Err(error) = page.close().await {
            warn!("Failed to close page: {}", error);
        }

        Ok(succeeded)
    }
}

#[async_trait]
impl JobRunner for BrowserEngine {
    async fn run(&self, url: &str, script: &str) -> bool {
        let outcome = tokio::time::timeout(self.timeout, self.evaluate(url, script))
            .await
            .map_err(|_| EngineError::Timeout)
            .and_then(|result| result);

        match outcome {
            Ok(succeeded) => succeeded,
            Err(error) => {
                warn!("Script execution failed: {}", error);
                false
            }
        }
    }
}
