//! 配置模型 - 单一持久化文档
//!
//! 文档格式历史上变更过多次,所以解码必须逐字段容错:
//! 任何字段缺失或类型不对都回退到该字段的默认值,
//! 绝不因为一个坏字段丢弃整份文档。

pub mod store;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::event::EventKind;

/// 推送渠道选择,配置里以数字 tag 存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyChannel {
    #[default]
    None,
    Pushover,
    /// 旧版渠道,为老配置保留
    ServerCat,
    Bark,
}

impl NotifyChannel {
    pub const ALL: [NotifyChannel; 4] = [
        NotifyChannel::None,
        NotifyChannel::Pushover,
        NotifyChannel::ServerCat,
        NotifyChannel::Bark,
    ];

    pub fn tag(self) -> u8 {
        match self {
            NotifyChannel::None => 0,
            NotifyChannel::Pushover => 1,
            NotifyChannel::ServerCat => 2,
            NotifyChannel::Bark => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<NotifyChannel> {
        NotifyChannel::ALL.iter().copied().find(|c| c.tag() == tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            NotifyChannel::None => "none",
            NotifyChannel::Pushover => "pushover",
            NotifyChannel::ServerCat => "servercat",
            NotifyChannel::Bark => "bark",
        }
    }
}

impl Serialize for NotifyChannel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

impl<'de> Deserialize<'de> for NotifyChannel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = u8::deserialize(deserializer)?;
        NotifyChannel::from_tag(tag)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown notify channel tag: {}", tag)))
    }
}

/// Pushover 凭据
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PushoverCredentials {
    pub token: String,
    pub user: String,
    pub device: String,
}

/// ServerCat 凭据(旧版渠道)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ServercatCredentials {
    pub key: String,
}

/// Bark 凭据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarkCredentials {
    pub server: String,
    pub device: String,
    pub critical: bool,
}

impl Default for BarkCredentials {
    fn default() -> Self {
        Self {
            server: "bark.day.app".to_string(),
            device: String::new(),
            critical: false,
        }
    }
}

/// 各渠道凭据,互相独立,均允许为空
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NotifyCredentials {
    pub pushover: PushoverCredentials,
    pub servercat: ServercatCredentials,
    pub bark: BarkCredentials,
}

/// 勿扰时段内抑制哪些动作
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuppressFlags {
    pub script: bool,
    pub notify: bool,
}

impl Default for SuppressFlags {
    fn default() -> Self {
        Self {
            script: true,
            notify: true,
        }
    }
}

/// 勿扰生效的星期,周日开头
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WeekCycle {
    pub sunday: bool,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
}

/// 勿扰时段配置,start/end 为 "HH:MM"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuietHours {
    pub start: String,
    pub end: String,
    pub suppress: SuppressFlags,
    pub cycle: WeekCycle,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            start: "00:00".to_string(),
            end: "23:59".to_string(),
            suppress: SuppressFlags::default(),
            cycle: WeekCycle::default(),
        }
    }
}

/// Webhook 配置
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    pub enabled_events: BTreeSet<EventKind>,
    /// 请求超时(秒)
    pub timeout: f64,
    pub include_system_info: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            enabled_events: BTreeSet::new(),
            timeout: 10.0,
            include_system_info: true,
        }
    }
}

/// 应用配置文档,进程内单实例,每次变更即持久化
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub launch_at_login: bool,
    pub exec_script: bool,
    pub do_not_disturb_enabled: bool,
    pub active_events: BTreeSet<EventKind>,
    pub notify_channel: NotifyChannel,
    pub notify_credentials: NotifyCredentials,
    pub quiet_hours: QuietHours,
    pub record_events: bool,
    pub webhook: WebhookConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            launch_at_login: false,
            exec_script: false,
            do_not_disturb_enabled: false,
            active_events: BTreeSet::from([EventKind::SystemLock, EventKind::SystemUnlock]),
            notify_channel: NotifyChannel::None,
            notify_credentials: NotifyCredentials::default(),
            quiet_hours: QuietHours::default(),
            record_events: false,
            webhook: WebhookConfig::default(),
        }
    }
}

/// 单字段容错取值:缺失或类型不符都落回 default
fn get_or<T: DeserializeOwned>(value: &Value, key: &str, default: T) -> T {
    value
        .get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or(default)
}

/// 事件集合容错取值:数组里无法识别的 tag 逐项丢弃
fn events_or(value: &Value, key: &str, default: BTreeSet<EventKind>) -> BTreeSet<EventKind> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_u64())
            .filter_map(|tag| u32::try_from(tag).ok())
            .filter_map(EventKind::from_tag)
            .collect(),
        _ => default,
    }
}

/// 去掉 Bark 服务器地址里误填的协议前缀
fn normalize_bark_server(server: String) -> String {
    server
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .to_string()
}

impl PushoverCredentials {
    fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            token: get_or(v, "token", d.token),
            user: get_or(v, "user", d.user),
            device: get_or(v, "device", d.device),
        }
    }
}

impl ServercatCredentials {
    fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            key: get_or(v, "key", d.key),
        }
    }
}

impl BarkCredentials {
    fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            server: normalize_bark_server(get_or(v, "server", d.server)),
            device: get_or(v, "device", d.device),
            critical: get_or(v, "critical", d.critical),
        }
    }
}

impl NotifyCredentials {
    fn from_value(v: &Value) -> Self {
        Self {
            pushover: PushoverCredentials::from_value(v.get("pushover").unwrap_or(&Value::Null)),
            servercat: ServercatCredentials::from_value(v.get("servercat").unwrap_or(&Value::Null)),
            bark: BarkCredentials::from_value(v.get("bark").unwrap_or(&Value::Null)),
        }
    }
}

impl SuppressFlags {
    fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            script: get_or(v, "script", d.script),
            notify: get_or(v, "notify", d.notify),
        }
    }
}

impl WeekCycle {
    fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            sunday: get_or(v, "sunday", d.sunday),
            monday: get_or(v, "monday", d.monday),
            tuesday: get_or(v, "tuesday", d.tuesday),
            wednesday: get_or(v, "wednesday", d.wednesday),
            thursday: get_or(v, "thursday", d.thursday),
            friday: get_or(v, "friday", d.friday),
            saturday: get_or(v, "saturday", d.saturday),
        }
    }
}

impl QuietHours {
    fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            start: get_or(v, "start", d.start),
            end: get_or(v, "end", d.end),
            suppress: SuppressFlags::from_value(v.get("suppress").unwrap_or(&Value::Null)),
            cycle: WeekCycle::from_value(v.get("cycle").unwrap_or(&Value::Null)),
        }
    }
}

impl WebhookConfig {
    fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            enabled: get_or(v, "enabled", d.enabled),
            url: get_or(v, "url", d.url),
            enabled_events: events_or(v, "enabledEvents", d.enabled_events),
            timeout: get_or(v, "timeout", d.timeout),
            include_system_info: get_or(v, "includeSystemInfo", d.include_system_info),
        }
    }
}

impl AppConfig {
    /// 逐字段容错地从 JSON 值构造配置
    pub fn from_value(v: &Value) -> Self {
        let d = Self::default();
        Self {
            launch_at_login: get_or(v, "launchAtLogin", d.launch_at_login),
            exec_script: get_or(v, "execScript", d.exec_script),
            do_not_disturb_enabled: get_or(v, "doNotDisturbEnabled", d.do_not_disturb_enabled),
            active_events: events_or(v, "activeEvents", d.active_events),
            notify_channel: get_or(v, "notifyChannel", d.notify_channel),
            notify_credentials: NotifyCredentials::from_value(
                v.get("notifyCredentials").unwrap_or(&Value::Null),
            ),
            quiet_hours: QuietHours::from_value(v.get("quietHours").unwrap_or(&Value::Null)),
            record_events: get_or(v, "recordEvents", d.record_events),
            webhook: WebhookConfig::from_value(v.get("webhook").unwrap_or(&Value::Null)),
        }
    }
}

impl<'de> Deserialize<'de> for AppConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        Ok(AppConfig::from_value(&v))
    }
}
