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

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::broker::{Broker, BrokerError, Exchange, Inbound, Message, NotifyResult};
use crate::engines::JobRunner;

/// 抓取工作器
///
/// 消费抓取任务，调用执行引擎并在成功时发布通知
pub struct ScrapeWorker<R: JobRunner> {
    runner: R,
    worker_id: Uuid,
}

impl<R: JobRunner> ScrapeWorker<R> {
    /// 创建新的抓取工作器实例
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 运行抓取工作器
    ///
    /// One job is processed to completion before the next delivery is
    /// taken. When the delivery stream ends the worker reconnects with the
    /// broker's bounded retry policy and subscribes again; exhausted
    /// retries propagate as a fatal error.
    pub async fn run(&self, broker: &mut Broker) -> Result<(), BrokerError> {
        info!("Scrape worker {} started", self.worker_id);

        loop {
            let mut subscription = broker.subscribe(Exchange::Scraper).await?;

            while let Some(payload) = subscription.next().await {
                if let Some(notify) = self.handle_payload(&payload).await {
                    let message = Message::Notify(notify);

                    if let Err(error) = broker.publish(Exchange::Bot, &message).await {
                        // The notification for this job is lost; keep
                        // consuming.
                        error!("{}", error);
                    }
                }
            }

            warn!("Delivery stream ended. Reconnecting to the broker");
            broker.connect().await?;
        }
    }

    /// 处理单条投递的消息
    ///
    /// Classifies the payload and runs the job it carries. Returns the
    /// notification to publish when the job succeeded; unrecognized
    /// payloads and failed jobs yield nothing.
    pub async fn handle_payload(&self, payload: &[u8]) -> Option<NotifyResult> {
        let job = match Message::classify(payload) {
            Inbound::Scrape(job) => job,
            Inbound::Unrecognized => {
                debug!("Dropping unrecognized message");
                return None;
            }
        };

        info!("Running scrape job {} against {}", job.id, job.url);
        let succeeded = self.runner.run(&job.url, &job.script).await;

        if succeeded {
            info!("success. send message");
            Some(NotifyResult::for_job(&job))
        } else {
            info!("not success");
            None
        }
    }
}
