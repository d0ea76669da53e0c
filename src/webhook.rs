//! Webhook 派发
//!
//! 发送门槛按序判定:启用 → URL 可解析 → 事件在白名单。
//! 通过后异步 POST,结果只记日志;send 的返回值表示"是否发起",
//! 不代表对端收到。

use chrono::{DateTime, Local};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::WebhookConfig;
use crate::event::EventKind;
use crate::notify::api::{SOURCE_HEADER, SOURCE_VALUE};
use crate::notify::system::SystemNotifier;
use crate::notify::NotifyError;

const USER_AGENT: &str = concat!("session-event-monitor/", env!("CARGO_PKG_VERSION"));
const VERSION_HEADER: &str = "x-app-version";

/// 随 payload 附带的设备信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub hostname: String,
    pub username: String,
    pub os_version: String,
}

impl DeviceInfo {
    pub fn current() -> Self {
        Self {
            hostname: sysinfo::System::host_name().unwrap_or_default(),
            username: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
            os_version: sysinfo::System::long_os_version().unwrap_or_default(),
        }
    }
}

/// 每次派发临时构造的请求体,从不持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    /// ISO-8601 时间戳
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
}

impl WebhookPayload {
    pub fn new(kind: EventKind, occurred_at: DateTime<Local>, include_system_info: bool) -> Self {
        Self {
            event: kind.name().to_string(),
            timestamp: occurred_at.to_rfc3339(),
            device: include_system_info.then(DeviceInfo::current),
        }
    }
}

/// Webhook 发送器
pub struct WebhookManager {
    client: Client,
    system: Arc<dyn SystemNotifier>,
}

impl WebhookManager {
    pub fn new(system: Arc<dyn SystemNotifier>) -> Self {
        Self {
            client: Client::new(),
            system,
        }
    }

    /// 为一次事件发送 webhook,返回是否发起了请求
    pub fn send(&self, kind: EventKind, occurred_at: DateTime<Local>, config: &WebhookConfig) -> bool {
        if !config.enabled {
            debug!("webhook disabled, skipping");
            return false;
        }

        let url = match parse_url(&config.url) {
            Some(url) => url,
            None => {
                warn!(url = %config.url, "webhook url empty or invalid, skipping");
                return false;
            }
        };

        if !config.enabled_events.contains(&kind) {
            debug!(event = kind.name(), "event not enabled for webhook");
            return false;
        }

        let payload = WebhookPayload::new(kind, occurred_at, config.include_system_info);
        self.submit(url, payload, config.timeout, false);
        true
    }

    /// 手动测试:用样例事件发一次,结果回显到本机通知
    pub fn send_test(&self, config: &WebhookConfig) -> Result<(), NotifyError> {
        let url = parse_url(&config.url).ok_or(NotifyError::WebhookConfig)?;
        let payload = WebhookPayload::new(EventKind::SystemLock, Local::now(), config.include_system_info);
        self.submit(url, payload, config.timeout, true);
        Ok(())
    }

    fn submit(&self, url: Url, payload: WebhookPayload, timeout: f64, feedback: bool) {
        let client = self.client.clone();
        let system = self.system.clone();
        let timeout = Duration::from_secs_f64(if timeout > 0.0 { timeout } else { 10.0 });

        tokio::spawn(async move {
            let result = client
                .post(url.clone())
                .timeout(timeout)
                .header("User-Agent", USER_AGENT)
                .header(VERSION_HEADER, env!("CARGO_PKG_VERSION"))
                .header(SOURCE_HEADER, SOURCE_VALUE)
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    info!(url = %url, status = %response.status(), "webhook sent");
                    if feedback {
                        system.notify("Webhook test succeeded", "The endpoint accepted the test payload");
                    }
                }
                Ok(response) => {
                    warn!(url = %url, status = %response.status(), "webhook rejected");
                    if feedback {
                        system.notify(
                            "Webhook test failed",
                            &format!("Endpoint answered {}", response.status()),
                        );
                    }
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "webhook request failed");
                    if feedback {
                        system.notify("Webhook test failed", &e.to_string());
                    }
                }
            }
        });
    }
}

fn parse_url(raw: &str) -> Option<Url> {
    if raw.is_empty() {
        return None;
    }
    Url::parse(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::system::testing::RecordingNotifier;
    use chrono::TimeZone;

    fn manager() -> WebhookManager {
        WebhookManager::new(Arc::new(RecordingNotifier::default()))
    }

    fn eligible_config() -> WebhookConfig {
        let mut config = WebhookConfig::default();
        config.enabled = true;
        // 指向本机不可达端口,spawn 的请求静默失败
        config.url = "http://127.0.0.1:9/hook".to_string();
        config.enabled_events.insert(EventKind::SystemLock);
        config
    }

    #[tokio::test]
    async fn test_send_requires_enabled() {
        let mut config = eligible_config();
        config.enabled = false;
        assert!(!manager().send(EventKind::SystemLock, Local::now(), &config));
    }

    #[tokio::test]
    async fn test_send_requires_valid_url() {
        let mut config = eligible_config();
        config.url = String::new();
        assert!(!manager().send(EventKind::SystemLock, Local::now(), &config));
        config.url = "not a url".to_string();
        assert!(!manager().send(EventKind::SystemLock, Local::now(), &config));
    }

    #[tokio::test]
    async fn test_send_requires_event_whitelisted() {
        let config = eligible_config();
        assert!(!manager().send(EventKind::ScreenWake, Local::now(), &config));
    }

    #[tokio::test]
    async fn test_send_attempts_when_all_gates_pass() {
        let config = eligible_config();
        assert!(manager().send(EventKind::SystemLock, Local::now(), &config));
    }

    #[tokio::test]
    async fn test_send_test_rejects_missing_url() {
        let config = WebhookConfig::default();
        assert!(matches!(
            manager().send_test(&config),
            Err(NotifyError::WebhookConfig)
        ));
    }

    #[test]
    fn test_payload_shape() {
        let at = Local.with_ymd_and_hms(2026, 8, 5, 10, 30, 0).unwrap();
        let payload = WebhookPayload::new(EventKind::SystemUnlock, at, false);
        assert_eq!(payload.event, "SYSTEM_UNLOCK");
        assert_eq!(payload.timestamp, at.to_rfc3339());
        assert!(payload.device.is_none());

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("device").is_none());

        let with_device = WebhookPayload::new(EventKind::SystemUnlock, at, true);
        assert!(with_device.device.is_some());
        let json = serde_json::to_value(&with_device).unwrap();
        assert!(json["device"].get("hostname").is_some());
        assert!(json["device"].get("username").is_some());
        assert!(json["device"].get("osVersion").is_some());
    }
}
