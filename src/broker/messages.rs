// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 抓取任务
///
/// 四个字段全部非空时消息才有效
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// 任务ID
    pub id: String,
    /// 来源会话ID
    pub chat_id: String,
    /// 目标页面URL
    pub url: String,
    /// 待执行脚本
    pub script: String,
}

impl ScrapeJob {
    fn is_complete(&self) -> bool {
        !self.id.is_empty()
            && !self.chat_id.is_empty()
            && !self.url.is_empty()
            && !self.script.is_empty()
    }
}

/// 抓取成功通知
///
/// 仅在任务执行成功后构造，字段从原始任务复制
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResult {
    /// 任务ID
    pub id: String,
    /// 来源会话ID
    pub chat_id: String,
    /// 目标页面URL
    pub url: String,
}

impl NotifyResult {
    /// 为执行成功的任务构造通知
    pub fn for_job(job: &ScrapeJob) -> Self {
        Self {
            id: job.id.clone(),
            chat_id: job.chat_id.clone(),
            url: job.url.clone(),
        }
    }
}

// scrape (scheduler -> scraper)
// notify (scraper -> bot)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Scrape(ScrapeJob),
    Notify(NotifyResult),
}

/// 入站消息分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// 合法的抓取任务
    Scrape(ScrapeJob),
    /// 无法识别的消息，直接丢弃
    Unrecognized,
}

impl Message {
    /// 消息变体名称，用于错误上下文
    pub fn name(&self) -> &'static str {
        match self {
            Message::Scrape(_) => "Scrape",
            Message::Notify(_) => "Notify",
        }
    }

    /// 序列化为线上字节格式
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// 对抓取入口收到的负载进行分类
    ///
    /// A payload classifies as `Scrape` only if it parses as the tagged
    /// union, the tag is `Scrape` and all four fields are non-empty.
    /// Malformed JSON, missing or empty fields and `Notify`-shaped payloads
    /// are expected traffic, never an error.
    pub fn classify(payload: &[u8]) -> Inbound {
        match serde_json::from_slice::<Message>(payload) {
            Ok(Message::Scrape(job)) if job.is_complete() => Inbound::Scrape(job),
            _ => Inbound::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ScrapeJob {
        ScrapeJob {
            id: "1".to_string(),
            chat_id: "42".to_string(),
            url: "http://x".to_string(),
            script: "return true".to_string(),
        }
    }

    #[test]
    fn test_classify_recognizes_complete_scrape() {
        let payload = Message::Scrape(job()).encode().unwrap();

        assert_eq!(Message::classify(&payload), Inbound::Scrape(job()));
    }

    #[test]
    fn test_classify_rejects_missing_fields() {
        // Each payload drops one of the four required fields.
        let payloads = [
            r#"{"Scrape":{"chat_id":"42","url":"http://x","script":"return true"}}"#,
            r#"{"Scrape":{"id":"1","url":"http://x","script":"return true"}}"#,
            r#"{"Scrape":{"id":"1","chat_id":"42","script":"return true"}}"#,
            r#"{"Scrape":{"id":"1","chat_id":"42","url":"http://x"}}"#,
        ];

        for payload in payloads {
            assert_eq!(Message::classify(payload.as_bytes()), Inbound::Unrecognized);
        }
    }

    #[test]
    fn test_classify_rejects_empty_fields() {
        let mut empty_script = job();
        empty_script.script = String::new();
        let payload = Message::Scrape(empty_script).encode().unwrap();

        assert_eq!(Message::classify(&payload), Inbound::Unrecognized);
    }

    #[test]
    fn test_classify_rejects_malformed_payloads() {
        assert_eq!(Message::classify(b"not json"), Inbound::Unrecognized);
        assert_eq!(Message::classify(b""), Inbound::Unrecognized);
        assert_eq!(Message::classify(b"{}"), Inbound::Unrecognized);
        assert_eq!(
            Message::classify(br#"{"Scrape":"not an object"}"#),
            Inbound::Unrecognized
        );
    }

    #[test]
    fn test_classify_rejects_notify_on_scrape_intake() {
        let payload = Message::Notify(NotifyResult::for_job(&job()))
            .encode()
            .unwrap();

        assert_eq!(Message::classify(&payload), Inbound::Unrecognized);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let scrape = Message::Scrape(job());
        let notify = Message::Notify(NotifyResult::for_job(&job()));

        for message in [scrape, notify] {
            let payload = message.encode().unwrap();
            let decoded: Message = serde_json::from_slice(&payload).unwrap();
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn test_wire_shape_is_externally_tagged() {
        let payload = Message::Scrape(job()).encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "Scrape": {
                    "id": "1",
                    "chat_id": "42",
                    "url": "http://x",
                    "script": "return true",
                }
            })
        );

        let payload = Message::Notify(NotifyResult::for_job(&job()))
            .encode()
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "Notify": {
                    "id": "1",
                    "chat_id": "42",
                    "url": "http://x",
                }
            })
        );
    }

    #[test]
    fn test_notify_copies_job_fields() {
        let notify = NotifyResult::for_job(&job());

        assert_eq!(notify.id, "1");
        assert_eq!(notify.chat_id, "42");
        assert_eq!(notify.url, "http://x");
    }
}
