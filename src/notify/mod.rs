//! 推送通知 - 渠道选择与异步派发
//!
//! 派发是 fire-and-forget:调用方只关心"是否成功发起",
//! HTTP 结果仅用于日志。

pub mod api;
pub mod system;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AppConfig, NotifyChannel};

/// 渠道配置错误,按渠道区分以便提示用户具体缺什么
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no notify channel selected")]
    NoChannel,
    #[error("pushover token or user key is missing")]
    PushoverConfig,
    #[error("servercat secret key is missing")]
    ServercatConfig,
    #[error("bark server or device key is missing")]
    BarkConfig,
    #[error("webhook url is missing or invalid")]
    WebhookConfig,
    #[error("failed to build notify request: {0}")]
    Request(#[from] reqwest::Error),
}

/// 推送发送器,持有复用的 HTTP 客户端
pub struct NotifyManager {
    client: Client,
}

impl NotifyManager {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// 向所选渠道发送一条通知
    ///
    /// 返回 Ok(true) 表示请求已发起(不保证送达),
    /// Ok(false) 表示未选择渠道,Err 表示凭据不完整。
    pub fn send(&self, config: &AppConfig, title: &str, message: &str) -> Result<bool, NotifyError> {
        if config.notify_channel == NotifyChannel::None {
            return Ok(false);
        }

        let request = api::build_request(
            &self.client,
            config.notify_channel,
            &config.notify_credentials,
            title,
            message,
        )?;

        let channel = config.notify_channel.name();
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.execute(request).await {
                Ok(response) if response.status().is_success() => {
                    debug!(channel, status = %response.status(), "notify sent");
                }
                Ok(response) => {
                    warn!(channel, status = %response.status(), "notify rejected by service");
                }
                Err(e) => {
                    warn!(channel, error = %e, "notify request failed");
                }
            }
        });

        Ok(true)
    }
}

impl Default for NotifyManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 通知标题:优先用设备名
pub fn notify_title() -> String {
    match sysinfo::System::host_name() {
        Some(host) if !host.is_empty() => format!("{} event notice", host),
        _ => "Session event notice".to_string(),
    }
}

/// 手动测试通知的固定正文
pub const TEST_MESSAGE: &str = "This is a test notification";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifyChannel;

    #[tokio::test]
    async fn test_send_without_channel_is_noop() {
        let manager = NotifyManager::new();
        let config = AppConfig::default();
        assert!(!manager.send(&config, "t", "m").unwrap());
    }

    #[tokio::test]
    async fn test_send_with_incomplete_credentials_errors_before_any_request() {
        let manager = NotifyManager::new();
        let mut config = AppConfig::default();
        config.notify_channel = NotifyChannel::Pushover;
        // token/user 均为空
        assert!(matches!(
            manager.send(&config, "t", "m"),
            Err(NotifyError::PushoverConfig)
        ));
    }

    #[test]
    fn test_notify_title_never_empty() {
        assert!(!notify_title().is_empty());
    }
}
