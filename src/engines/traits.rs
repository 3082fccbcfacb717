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

use async_trait::async_trait;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器协议错误
    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 任务执行器特质
///
/// 对加载完成的页面执行脚本并产出布尔结果
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// 执行脚本
    ///
    /// Any non-true outcome, execution failure included, is `false`; a job
    /// run never surfaces an error to the caller.
    async fn run(&self, url: &str, script: &str) -> bool;
}
